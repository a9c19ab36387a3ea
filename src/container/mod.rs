//! The container: binding table, lifecycle resolution and parent chain.

mod inject;

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::RwLock;

use crate::config::ContainerOptions;
use crate::error::{DiError, DiResult};
use crate::initializer::{InitializationOutcome, Initializer};
use crate::internal::ResolutionGuard;
use crate::key::{ServiceHandle, ServiceKey};
use crate::lifetime::Lifetime;
use crate::observer::{ContainerObserver, Observers, TracingObserver};
use crate::registration::{
    singleton_binding, transient_binding, Binding, BindingKind, BindingTable, Factory, InsertOutcome, Instance,
    SingletonSlot,
};
use crate::traits::{resolver_key, Resolution, Resolver};

pub use inject::{FieldInjector, Injectable, InjectionReport, INJECT_MARKER};

/// Runtime service container.
///
/// Cloning is cheap and yields another handle to the same bindings. Every
/// container binds itself as `Arc<dyn Resolver>`, so services can take the
/// resolver as a dependency.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Resolver, ResolverExt};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct English;
/// impl Greeter for English { fn greet(&self) -> String { "hello".into() } }
///
/// let root = Container::new();
/// root.add_singleton::<Arc<dyn Greeter>>(Arc::new(English)).unwrap();
///
/// let child = Container::new();
/// child.set_parent(Some(root.as_resolver()));
///
/// let greeter = child.get_required::<Arc<dyn Greeter>>();
/// assert_eq!(greeter.greet(), "hello");
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    table: BindingTable,
    parent: RwLock<Option<Arc<dyn Resolver>>>,
    observers: Observers,
    options: ContainerOptions,
}

/// The handle registered under [`resolver_key`]. Weak, so a container's
/// self-binding does not keep it alive. Parents are never stored through it:
/// `set_parent` swaps it for a strong handle first.
struct SelfResolver {
    inner: Weak<ContainerInner>,
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        let inner = Arc::new(ContainerInner {
            table: BindingTable::new(),
            parent: RwLock::new(None),
            observers: Observers::default(),
            options,
        });
        if inner.options.trace_resolution {
            inner
                .observers
                .add(Arc::new(TracingObserver::new(inner.options.label())));
        }
        inner.table.insert(Binding {
            key: resolver_key(),
            can_override: false,
            kind: BindingKind::Singleton(SingletonSlot::new(Instance::new::<Arc<dyn Resolver>>(Arc::new(
                SelfResolver { inner: Arc::downgrade(&inner) },
            )))),
        });
        tracing::debug!(container = inner.options.label(), "container created");
        Self { inner }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// A resolver handle that keeps this container alive, for use as a
    /// parent. It reports the same `instance_id` as the container.
    pub fn as_resolver(&self) -> Arc<dyn Resolver> {
        Arc::new(self.clone())
    }

    pub fn add_observer(&self, observer: Arc<dyn ContainerObserver>) {
        self.inner.observers.add(observer);
    }

    /// Binds `instance` as the singleton for `identity`.
    ///
    /// Fails with, in order of checking: `MissingIdentity`,
    /// `InvalidServiceShape`, `MissingInstance`, `TypeMismatch` and
    /// `CyclicInitializer`. A valid registration for an identity that is
    /// already bound only replaces it when the existing binding was
    /// registered with `can_override`.
    pub fn register_singleton(
        &self,
        identity: Option<ServiceKey>,
        instance: Option<Instance>,
        can_override: bool,
    ) -> DiResult<InsertOutcome> {
        let binding = singleton_binding(identity, instance, can_override)?;
        Ok(self.inner.insert(binding))
    }

    /// Binds `factory` as the transient producer for `identity`.
    ///
    /// Validation matches [`register_singleton`](Self::register_singleton),
    /// with `InvalidFactoryShape` for factories that take inputs or produce
    /// nothing.
    pub fn register_transient(
        &self,
        identity: Option<ServiceKey>,
        factory: Option<Factory>,
        can_override: bool,
    ) -> DiResult<InsertOutcome> {
        let binding = transient_binding(identity, factory, can_override)?;
        Ok(self.inner.insert(binding))
    }

    pub fn add_singleton<S: ServiceHandle>(&self, service: S) -> DiResult<InsertOutcome> {
        self.register_singleton(Some(ServiceKey::of::<S>()), Some(Instance::new(service)), false)
    }

    /// Like [`add_singleton`](Self::add_singleton), but a later registration
    /// may replace this one.
    pub fn add_overridable_singleton<S: ServiceHandle>(&self, service: S) -> DiResult<InsertOutcome> {
        self.register_singleton(Some(ServiceKey::of::<S>()), Some(Instance::new(service)), true)
    }

    pub fn add_transient<S, F>(&self, factory: F) -> DiResult<InsertOutcome>
    where
        S: ServiceHandle,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.register_transient(Some(ServiceKey::of::<S>()), Some(Factory::new(factory)), false)
    }

    pub fn add_overridable_transient<S, F>(&self, factory: F) -> DiResult<InsertOutcome>
    where
        S: ServiceHandle,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.register_transient(Some(ServiceKey::of::<S>()), Some(Factory::new(factory)), true)
    }

    /// Binds a prepared instance under its own identity.
    pub fn add_instance(&self, instance: Instance) -> DiResult<InsertOutcome> {
        self.register_singleton(Some(instance.key()), Some(instance), false)
    }

    /// Binds a prepared factory under its declared output.
    pub fn add_factory(&self, factory: Factory) -> DiResult<InsertOutcome> {
        let identity = factory.output();
        self.register_transient(identity, Some(factory), false)
    }

    /// Bindings owned by this container (parents excluded).
    pub fn registrations(&self) -> Vec<(ServiceKey, Lifetime)> {
        self.inner.table.snapshot()
    }

    /// Multi-line dump of the bindings, sorted by name.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write;

        let mut entries = self.registrations();
        entries.sort_by_key(|(key, _)| key.name());
        let mut out = format!(
            "container '{}' ({} bindings, parent: {})\n",
            self.inner.options.label(),
            entries.len(),
            if self.inner.parent().is_some() { "yes" } else { "no" },
        );
        for (key, lifetime) in entries {
            let _ = writeln!(out, "  {:<9} {} ({:?})", lifetime, key.name(), key.shape());
        }
        out
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.inner.options.label())
            .field("bindings", &self.inner.table.len())
            .field("has_parent", &self.inner.parent().is_some())
            .field("observers", &self.inner.observers.len())
            .finish()
    }
}

impl ContainerInner {
    fn parent(&self) -> Option<Arc<dyn Resolver>> {
        self.parent.read().clone()
    }

    fn insert(&self, binding: Binding) -> InsertOutcome {
        let key = binding.key;
        let lifetime = binding.lifetime();
        let outcome = self.table.insert(binding);
        let container = self.options.label();
        match outcome {
            InsertOutcome::Inserted => {
                tracing::debug!(container = container, service = key.name(), %lifetime, "service registered")
            }
            InsertOutcome::Replaced => {
                tracing::debug!(container = container, service = key.name(), %lifetime, "overridable binding replaced")
            }
            InsertOutcome::Kept => {
                tracing::debug!(container = container, service = key.name(), %lifetime, "already registered, keeping existing binding")
            }
        }
        self.observers.registered(&key, lifetime, outcome);
        outcome
    }

    fn resolve_binding(&self, binding: &Binding, requester: &dyn Resolver) -> DiResult<Resolution> {
        let lifetime = binding.lifetime();
        let timer = self.observers.has_observers().then(|| {
            self.observers.resolving(&binding.key, lifetime);
            Instant::now()
        });

        let resolution = match &binding.kind {
            BindingKind::Singleton(slot) => self.resolve_singleton(&binding.key, slot, requester)?,
            BindingKind::Transient(factory) => self.produce_transient(&binding.key, factory, requester)?,
        };

        if let Some(start) = timer {
            self.observers.resolved(&binding.key, lifetime, start.elapsed());
        }
        Ok(resolution)
    }

    fn resolve_singleton(
        &self,
        key: &ServiceKey,
        slot: &SingletonSlot,
        requester: &dyn Resolver,
    ) -> DiResult<Resolution> {
        if let Some(outcome) = slot.state.get() {
            return Ok(Resolution { value: slot.value.clone(), outcome: outcome.clone() });
        }

        // Entered before the cell: re-entry on this thread would block on it.
        let _guard = ResolutionGuard::enter(*key)?;
        let outcome = slot.state.get_or_init(|| match &slot.initializer {
            None => InitializationOutcome::NotRequired,
            Some(init) => self.run_initializer(key, init, requester),
        });
        Ok(Resolution { value: slot.value.clone(), outcome: outcome.clone() })
    }

    fn produce_transient(
        &self,
        key: &ServiceKey,
        factory: &Factory,
        requester: &dyn Resolver,
    ) -> DiResult<Resolution> {
        let _guard = ResolutionGuard::enter(*key)?;
        let instance = factory.produce(requester)?;
        let outcome = match &instance.initializer {
            None => InitializationOutcome::NotRequired,
            Some(init) => self.run_initializer(key, init, requester),
        };
        Ok(Resolution { value: instance.value, outcome })
    }

    fn run_initializer(&self, key: &ServiceKey, init: &Initializer, requester: &dyn Resolver) -> InitializationOutcome {
        let outcome = init.run(requester);
        if let InitializationOutcome::Failed(err) = &outcome {
            tracing::warn!(
                container = self.options.label(),
                service = key.name(),
                initializer = init.name(),
                error = %err,
                "initializer failed, instance returned uninitialized"
            );
            self.observers.initialization_failed(key, init.name(), err);
        }
        outcome
    }
}

impl Resolver for ContainerInner {
    fn resolve_traced(&self, key: &ServiceKey) -> DiResult<Resolution> {
        self.resolve_for(key, self)
    }

    fn resolve_for(&self, key: &ServiceKey, requester: &dyn Resolver) -> DiResult<Resolution> {
        match self.table.lookup(key) {
            Some(binding) => self.resolve_binding(&binding, requester),
            None => match self.parent() {
                Some(parent) => parent.resolve_for(key, requester),
                None => Err(DiError::NotFound(key.name())),
            },
        }
    }

    fn set_parent(&self, parent: Option<Arc<dyn Resolver>>) {
        let Some(parent) = parent else {
            return;
        };
        if parent.instance_id() == self.instance_id() {
            return;
        }
        if parent.is_detached() {
            tracing::warn!(container = self.options.label(), "parent handle points at a dropped container, ignored");
            return;
        }
        let parent = parent.retain().unwrap_or(parent);
        let existing = {
            let mut slot = self.parent.write();
            let existing = match slot.clone() {
                Some(existing) => existing,
                None => {
                    tracing::debug!(container = self.options.label(), "parent set");
                    *slot = Some(parent);
                    return;
                }
            };
            if existing.instance_id() == parent.instance_id() {
                return;
            }
            existing
        };
        // Lock released: the existing parent may resolve back into us.
        tracing::debug!(container = self.options.label(), "parent already set, forwarding to it");
        existing.set_parent(Some(parent));
    }
}

impl Resolver for Container {
    fn resolve_traced(&self, key: &ServiceKey) -> DiResult<Resolution> {
        self.inner.resolve_traced(key)
    }

    fn resolve_for(&self, key: &ServiceKey, requester: &dyn Resolver) -> DiResult<Resolution> {
        self.inner.resolve_for(key, requester)
    }

    fn set_parent(&self, parent: Option<Arc<dyn Resolver>>) {
        self.inner.set_parent(parent)
    }

    fn instance_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl SelfResolver {
    fn upgrade(&self, key: &ServiceKey) -> DiResult<Arc<ContainerInner>> {
        self.inner.upgrade().ok_or(DiError::NotFound(key.name()))
    }
}

impl Resolver for SelfResolver {
    fn resolve_traced(&self, key: &ServiceKey) -> DiResult<Resolution> {
        self.upgrade(key)?.resolve_traced(key)
    }

    fn resolve_for(&self, key: &ServiceKey, requester: &dyn Resolver) -> DiResult<Resolution> {
        self.upgrade(key)?.resolve_for(key, requester)
    }

    fn set_parent(&self, parent: Option<Arc<dyn Resolver>>) {
        match self.inner.upgrade() {
            Some(inner) => inner.set_parent(parent),
            None => tracing::warn!("set_parent on a dropped container, parent discarded"),
        }
    }

    fn instance_id(&self) -> usize {
        self.inner.as_ptr() as usize
    }

    fn retain(&self) -> Option<Arc<dyn Resolver>> {
        let inner = self.inner.upgrade()?;
        Some(Arc::new(Container { inner }))
    }

    fn is_detached(&self) -> bool {
        self.inner.strong_count() == 0
    }
}

impl Injectable for Container {
    // `inject` skips containers before their fields are visited; parents
    // only change through `set_parent`.
    fn inject_fields(&mut self, _fields: &mut FieldInjector<'_>) {}
}
