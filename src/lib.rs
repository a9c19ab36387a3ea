//! # ferrous-ioc
//!
//! A runtime inversion-of-control container: bind service identities to
//! instances or factories, then resolve them, invoke closures with their
//! parameters injected, or populate struct fields.
//!
//! ## Features
//!
//! - **Singleton and transient lifecycles**: singletons are caller-built and
//!   initialized exactly once, transients are produced per resolution
//! - **Trait objects as identities**: bind `Arc<dyn Trait>` or `Arc<Concrete>`
//! - **Parent chains**: unresolved identities fall back to a parent container
//! - **Initializers**: per-instance hooks whose parameters are injected
//! - **Cycle detection**: self-requiring initializers are rejected at
//!   registration, runtime cycles are reported instead of deadlocking
//! - **Thread-safe**: concurrent registration and resolution
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{Container, Initialize, Initializer, Instance, ResolverExt};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! trait Repo: Send + Sync {
//!     fn find(&self, id: u32) -> String;
//! }
//!
//! struct MemoryRepo;
//! impl Repo for MemoryRepo {
//!     fn find(&self, id: u32) -> String { format!("user-{id}") }
//! }
//!
//! #[derive(Default)]
//! struct UserService { repo: Mutex<Option<Arc<dyn Repo>>> }
//!
//! impl Initialize for UserService {
//!     fn initializer(self: Arc<Self>) -> Initializer {
//!         Initializer::new(move |repo: Arc<dyn Repo>| *self.repo.lock() = Some(repo))
//!     }
//! }
//!
//! let container = Container::new();
//! container.add_singleton::<Arc<dyn Repo>>(Arc::new(MemoryRepo)).unwrap();
//! container
//!     .add_instance(Instance::with_initializer(Arc::new(UserService::default()), |s| s))
//!     .unwrap();
//!
//! let users = container.get_required::<Arc<UserService>>();
//! let name = users.repo.lock().as_ref().map(|r| r.find(7));
//! assert_eq!(name.as_deref(), Some("user-7"));
//!
//! // Closure parameters are resolved too.
//! let found = container.invoke(|repo: Arc<dyn Repo>| repo.find(1)).unwrap();
//! assert_eq!(found, "user-1");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: the registered instance, shared by every resolution
//! - **Transient**: a fresh instance from the factory on every resolution
//!
//! ## Logging
//!
//! The crate logs through `tracing`. Registrations and parent changes are
//! `debug`, swallowed initializer failures are `warn`. Per-resolution events
//! are emitted at `trace` when [`ContainerOptions::trace_resolution`] is set.

pub mod callable;
pub mod config;
pub mod container;
pub mod error;
pub mod global;
pub mod initializer;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod registration;
pub mod traits;

mod internal;

pub use callable::{CallOutput, Callable, Dependencies, InjectFn};
pub use config::ContainerOptions;
pub use container::{Container, FieldInjector, Injectable, InjectionReport, INJECT_MARKER};
pub use error::{DiError, DiResult};
pub use global::{
    add_factory, add_instance, add_singleton, add_transient, default_container, get_service, inject, inject_fn,
    invoke, reset_default_container, set_parent,
};
pub use initializer::{InitializationOutcome, Initialize, Initializer, DEFAULT_INITIALIZER};
pub use key::{key_of, ServiceHandle, ServiceKey, Shape};
pub use lifetime::Lifetime;
pub use observer::{ContainerObserver, TracingObserver};
pub use registration::{AnyArc, Factory, InsertOutcome, Instance};
pub use traits::{resolver_key, Resolution, Resolver, ResolverExt};
