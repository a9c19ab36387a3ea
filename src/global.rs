//! The process-wide default container and shortcuts to it.
//!
//! The default container is created on first use from
//! [`ContainerOptions::from_env`]. [`reset_default_container`] swaps in a
//! fresh one; handles obtained earlier keep pointing at the old container.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::callable::InjectFn;
use crate::config::ContainerOptions;
use crate::container::{Container, Injectable, InjectionReport};
use crate::error::DiResult;
use crate::key::ServiceHandle;
use crate::registration::{Factory, InsertOutcome, Instance};
use crate::traits::{Resolver, ResolverExt};

static DEFAULT_CONTAINER: Lazy<RwLock<Container>> =
    Lazy::new(|| RwLock::new(Container::with_options(ContainerOptions::from_env())));

/// A handle to the default container.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{default_container, ResolverExt};
/// use std::sync::Arc;
///
/// struct AppName(&'static str);
///
/// default_container().add_singleton(Arc::new(AppName("demo"))).unwrap();
/// let name = ferrous_ioc::get_service::<Arc<AppName>>().unwrap();
/// assert_eq!(name.0, "demo");
/// ```
pub fn default_container() -> Container {
    DEFAULT_CONTAINER.read().clone()
}

/// Replaces the default container with an empty one.
pub fn reset_default_container() {
    let fresh = Container::with_options(ContainerOptions::from_env());
    *DEFAULT_CONTAINER.write() = fresh;
    tracing::debug!("default container reset");
}

pub fn add_singleton<S: ServiceHandle>(service: S) -> DiResult<InsertOutcome> {
    default_container().add_singleton(service)
}

pub fn add_transient<S, F>(factory: F) -> DiResult<InsertOutcome>
where
    S: ServiceHandle,
    F: Fn() -> S + Send + Sync + 'static,
{
    default_container().add_transient(factory)
}

pub fn add_instance(instance: Instance) -> DiResult<InsertOutcome> {
    default_container().add_instance(instance)
}

pub fn add_factory(factory: Factory) -> DiResult<InsertOutcome> {
    default_container().add_factory(factory)
}

pub fn get_service<S: ServiceHandle>() -> Option<S> {
    default_container().get_service::<S>()
}

pub fn invoke<F, Args>(f: F) -> DiResult<F::Output>
where
    F: InjectFn<Args>,
{
    default_container().invoke(f)
}

/// Panics, before `f` runs, when a parameter cannot be resolved.
pub fn inject_fn<F, Args>(f: F) -> F::Output
where
    F: InjectFn<Args>,
{
    default_container().inject_fn(f)
}

pub fn inject<'t, T: Injectable>(target: impl Into<Option<&'t mut T>>) -> InjectionReport {
    default_container().inject(target)
}

pub fn set_parent(parent: Option<Arc<dyn Resolver>>) {
    default_container().set_parent(parent)
}
