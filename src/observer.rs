//! Hooks for observing registrations and resolutions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::DiError;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::registration::InsertOutcome;

/// Observer of container events.
///
/// Calls are made synchronously on the resolving thread; keep
/// implementations cheap. Every method defaults to doing nothing.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, ContainerObserver, Lifetime, ResolverExt, ServiceKey};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl ContainerObserver for Counter {
///     fn resolved(&self, _key: &ServiceKey, _lifetime: Lifetime, _elapsed: Duration) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let counter = Arc::new(Counter::default());
/// let container = Container::new();
/// container.add_observer(counter.clone());
/// container.add_singleton(Arc::new(5u8)).unwrap();
///
/// container.get_required::<Arc<u8>>();
/// container.get_required::<Arc<u8>>();
/// assert_eq!(counter.0.load(Ordering::Relaxed), 2);
/// ```
pub trait ContainerObserver: Send + Sync {
    /// A registration was attempted and passed validation.
    fn registered(&self, _key: &ServiceKey, _lifetime: Lifetime, _outcome: InsertOutcome) {}

    /// A binding owned by this container is about to be resolved.
    fn resolving(&self, _key: &ServiceKey, _lifetime: Lifetime) {}

    fn resolved(&self, _key: &ServiceKey, _lifetime: Lifetime, _elapsed: Duration) {}

    /// An initializer could not run; the instance was returned anyway.
    fn initialization_failed(&self, _key: &ServiceKey, _initializer: &'static str, _error: &DiError) {}
}

/// Observer emitting `tracing` events.
///
/// Installed automatically when
/// [`ContainerOptions::trace_resolution`](crate::ContainerOptions) is set.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    container: String,
}

impl TracingObserver {
    pub fn new(container: impl Into<String>) -> Self {
        Self { container: container.into() }
    }
}

impl ContainerObserver for TracingObserver {
    fn registered(&self, key: &ServiceKey, lifetime: Lifetime, outcome: InsertOutcome) {
        tracing::trace!(container = %self.container, service = key.name(), %lifetime, ?outcome, "registered");
    }

    fn resolving(&self, key: &ServiceKey, lifetime: Lifetime) {
        tracing::trace!(container = %self.container, service = key.name(), %lifetime, "resolving");
    }

    fn resolved(&self, key: &ServiceKey, lifetime: Lifetime, elapsed: Duration) {
        tracing::trace!(
            container = %self.container,
            service = key.name(),
            %lifetime,
            elapsed_us = elapsed.as_micros() as u64,
            "resolved"
        );
    }

    fn initialization_failed(&self, key: &ServiceKey, initializer: &'static str, error: &DiError) {
        tracing::trace!(container = %self.container, service = key.name(), initializer = initializer, %error, "initializer failed");
    }
}

/// Registered observers, with a lock-free check for the common empty case.
#[derive(Default)]
pub(crate) struct Observers {
    observers: RwLock<Vec<Arc<dyn ContainerObserver>>>,
    active: AtomicBool,
}

impl Observers {
    pub(crate) fn add(&self, observer: Arc<dyn ContainerObserver>) {
        self.observers.write().push(observer);
        self.active.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.read().len()
    }

    // Snapshot so observers may touch the container without holding our lock.
    fn each(&self, mut f: impl FnMut(&dyn ContainerObserver)) {
        if !self.has_observers() {
            return;
        }
        let observers = self.observers.read().clone();
        for observer in &observers {
            f(observer.as_ref());
        }
    }

    pub(crate) fn registered(&self, key: &ServiceKey, lifetime: Lifetime, outcome: InsertOutcome) {
        self.each(|o| o.registered(key, lifetime, outcome));
    }

    pub(crate) fn resolving(&self, key: &ServiceKey, lifetime: Lifetime) {
        self.each(|o| o.resolving(key, lifetime));
    }

    pub(crate) fn resolved(&self, key: &ServiceKey, lifetime: Lifetime, elapsed: Duration) {
        self.each(|o| o.resolved(key, lifetime, elapsed));
    }

    pub(crate) fn initialization_failed(&self, key: &ServiceKey, initializer: &'static str, error: &DiError) {
        self.each(|o| o.initialization_failed(key, initializer, error));
    }
}
