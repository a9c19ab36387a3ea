//! Bindings and the binding table.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::callable::{CallOutput, Callable, InjectFn};
use crate::error::{DiError, DiResult};
use crate::initializer::{Initialize, InitializationOutcome, Initializer};
use crate::key::{ServiceHandle, ServiceKey};
use crate::lifetime::Lifetime;
use crate::traits::Resolver;

/// Type-erased service handle as stored in the table.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// A caller-built service instance, ready to be bound as a singleton.
#[derive(Clone)]
pub struct Instance {
    pub(crate) key: ServiceKey,
    pub(crate) value: AnyArc,
    pub(crate) initializer: Option<Initializer>,
}

impl Instance {
    /// Wraps a handle that needs no initialization.
    pub fn new<S: ServiceHandle>(service: S) -> Self {
        Self {
            key: ServiceKey::of::<S>(),
            value: Arc::new(service),
            initializer: None,
        }
    }

    /// Captures `concrete`'s initializer, then binds it as `S` through
    /// `as_service` (typically an unsizing coercion to `Arc<dyn Trait>`).
    pub fn with_initializer<T, S>(concrete: Arc<T>, as_service: impl FnOnce(Arc<T>) -> S) -> Self
    where
        T: Initialize,
        S: ServiceHandle,
    {
        let initializer = concrete.clone().initializer();
        Self {
            key: ServiceKey::of::<S>(),
            value: Arc::new(as_service(concrete)),
            initializer: Some(initializer),
        }
    }

    /// Identity of the wrapped handle.
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    pub fn initializer(&self) -> Option<&Initializer> {
        self.initializer.as_ref()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("key", &self.key.name())
            .field("initializer", &self.initializer.as_ref().map(Initializer::name))
            .finish()
    }
}

type Produce = dyn Fn(&dyn Resolver) -> DiResult<Instance> + Send + Sync;

/// Produces a fresh [`Instance`] per transient resolution.
#[derive(Clone)]
pub struct Factory {
    name: &'static str,
    inputs: usize,
    output: Option<ServiceKey>,
    produce: Arc<Produce>,
}

impl Factory {
    /// Zero-argument constructor closure.
    pub fn new<S, F>(f: F) -> Self
    where
        S: ServiceHandle,
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            name: std::any::type_name::<F>(),
            inputs: 0,
            output: Some(ServiceKey::of::<S>()),
            produce: Arc::new(move |_: &dyn Resolver| Ok(Instance::new(f()))),
        }
    }

    /// Every produced instance has its initializer run before it is handed out.
    pub fn with_initializer<T, S, F, U>(f: F, as_service: U) -> Self
    where
        T: Initialize,
        S: ServiceHandle,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
        U: Fn(Arc<T>) -> S + Send + Sync + 'static,
    {
        Self {
            name: std::any::type_name::<F>(),
            inputs: 0,
            output: Some(ServiceKey::of::<S>()),
            produce: Arc::new(move |_: &dyn Resolver| Ok(Instance::with_initializer(f(), &as_service))),
        }
    }

    /// Wraps an arbitrary erased callable. Registration rejects it unless it
    /// takes no inputs and produces exactly one value.
    pub fn from_callable(callable: Callable) -> Self {
        let output = callable.output();
        let call = callable.clone();
        Self {
            name: callable.name(),
            inputs: callable.inputs().len(),
            output,
            produce: Arc::new(move |resolver: &dyn Resolver| {
                let value = call
                    .invoke(resolver)?
                    .ok_or(DiError::MissingInstance(call.name()))?;
                let key = output.ok_or(DiError::MissingInstance(call.name()))?;
                Ok(Instance { key, value, initializer: None })
            }),
        }
    }

    /// Shorthand for [`Factory::from_callable`] over an injectable closure.
    pub fn from_fn<F, Args>(f: F) -> Self
    where
        F: InjectFn<Args> + Clone + Send + Sync + 'static,
        F::Output: CallOutput,
    {
        Self::from_callable(Callable::new(f))
    }

    pub fn output(&self) -> Option<ServiceKey> {
        self.output
    }

    pub(crate) fn produce(&self, resolver: &dyn Resolver) -> DiResult<Instance> {
        (self.produce)(resolver)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("output", &self.output.map(|k| k.name()))
            .finish()
    }
}

/// Singleton instance plus its one-shot initialization state.
pub(crate) struct SingletonSlot {
    pub(crate) value: AnyArc,
    pub(crate) initializer: Option<Initializer>,
    pub(crate) state: OnceCell<InitializationOutcome>,
}

impl SingletonSlot {
    pub(crate) fn new(instance: Instance) -> Self {
        Self {
            value: instance.value,
            initializer: instance.initializer,
            state: OnceCell::new(),
        }
    }
}

pub(crate) enum BindingKind {
    Singleton(SingletonSlot),
    Transient(Factory),
}

/// One entry of the binding table.
pub(crate) struct Binding {
    pub(crate) key: ServiceKey,
    pub(crate) can_override: bool,
    pub(crate) kind: BindingKind,
}

impl Binding {
    pub(crate) fn lifetime(&self) -> Lifetime {
        match self.kind {
            BindingKind::Singleton(_) => Lifetime::Singleton,
            BindingKind::Transient(_) => Lifetime::Transient,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Binding");
        s.field("key", &self.key.name())
            .field("lifetime", &self.lifetime())
            .field("can_override", &self.can_override);
        if let BindingKind::Singleton(slot) = &self.kind {
            s.field("initialized", &slot.state.get().is_some());
        }
        s.finish()
    }
}

fn checked_identity(identity: Option<ServiceKey>) -> DiResult<ServiceKey> {
    let key = identity.ok_or(DiError::MissingIdentity)?;
    if !key.shape().is_bindable() {
        return Err(DiError::InvalidServiceShape {
            service: key.name(),
            shape: key.shape(),
        });
    }
    Ok(key)
}

/// Validates a singleton registration and builds its binding.
pub(crate) fn singleton_binding(
    identity: Option<ServiceKey>,
    instance: Option<Instance>,
    can_override: bool,
) -> DiResult<Binding> {
    let key = checked_identity(identity)?;
    let instance = instance.ok_or(DiError::MissingInstance(key.name()))?;
    if instance.key != key {
        return Err(DiError::TypeMismatch {
            service: key.name(),
            actual: instance.key.name(),
        });
    }
    if let Some(init) = &instance.initializer {
        if init.requires(&key) {
            return Err(DiError::CyclicInitializer {
                service: key.name(),
                initializer: init.name(),
            });
        }
    }
    Ok(Binding {
        key,
        can_override,
        kind: BindingKind::Singleton(SingletonSlot::new(instance)),
    })
}

/// Validates a transient registration and builds its binding.
pub(crate) fn transient_binding(
    identity: Option<ServiceKey>,
    factory: Option<Factory>,
    can_override: bool,
) -> DiResult<Binding> {
    let key = checked_identity(identity)?;
    let factory = factory.ok_or(DiError::MissingInstance(key.name()))?;
    let outputs = usize::from(factory.output.is_some());
    if factory.inputs != 0 || outputs != 1 {
        return Err(DiError::InvalidFactoryShape {
            service: key.name(),
            inputs: factory.inputs,
            outputs,
        });
    }
    match factory.output {
        Some(out) if out == key => {}
        other => {
            return Err(DiError::TypeMismatch {
                service: key.name(),
                actual: other.map_or("()", |k| k.name()),
            })
        }
    }
    Ok(Binding {
        key,
        can_override,
        kind: BindingKind::Transient(factory),
    })
}

/// What an insertion did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No previous binding existed.
    Inserted,
    /// The previous binding was overridable and has been replaced.
    Replaced,
    /// The previous binding was kept; the new one was dropped.
    Kept,
}

/// Concurrent map of bindings, first writer wins.
pub(crate) struct BindingTable {
    map: DashMap<ServiceKey, Arc<Binding>, RandomState>,
}

impl BindingTable {
    pub(crate) fn new() -> Self {
        Self {
            map: DashMap::with_hasher(RandomState::new()),
        }
    }

    pub(crate) fn insert(&self, binding: Binding) -> InsertOutcome {
        match self.map.entry(binding.key) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(binding));
                InsertOutcome::Inserted
            }
            Entry::Occupied(mut slot) => {
                if slot.get().can_override {
                    slot.insert(Arc::new(binding));
                    InsertOutcome::Replaced
                } else {
                    InsertOutcome::Kept
                }
            }
        }
    }

    /// Clones the shared binding out so no shard lock outlives the call.
    #[inline]
    pub(crate) fn lookup(&self, key: &ServiceKey) -> Option<Arc<Binding>> {
        self.map.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn snapshot(&self) -> Vec<(ServiceKey, Lifetime)> {
        self.map
            .iter()
            .map(|entry| (*entry.key(), entry.value().lifetime()))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
