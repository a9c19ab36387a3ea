//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::callable::InjectFn;
use crate::container::{Container, FieldInjector, Injectable, InjectionReport};
use crate::error::{DiError, DiResult};
use crate::initializer::InitializationOutcome;
use crate::key::{downcast, ServiceHandle, ServiceKey};
use crate::registration::AnyArc;

/// Identity under which every container registers itself.
#[inline]
pub fn resolver_key() -> ServiceKey {
    ServiceKey::of::<Arc<dyn Resolver>>()
}

/// A resolved value together with what happened to its initializer.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub value: AnyArc,
    pub outcome: InitializationOutcome,
}

impl Resolution {
    /// Turns a failed initialization into [`DiError::InitializerFailed`].
    pub fn into_strict(self, key: &ServiceKey) -> DiResult<AnyArc> {
        match self.outcome {
            InitializationOutcome::Failed(err) => Err(DiError::InitializerFailed {
                service: key.name(),
                source: Box::new(err),
            }),
            _ => Ok(self.value),
        }
    }
}

/// Object-safe resolution interface.
///
/// Implemented by [`Container`] and by the handle a container registers for
/// itself under [`resolver_key`], so services can depend on
/// `Arc<dyn Resolver>` to resolve lazily. Typed and best-effort helpers live
/// on [`ResolverExt`].
pub trait Resolver: Send + Sync {
    /// Resolves `key` here or through the parent chain, initializers running
    /// against `self`.
    fn resolve_traced(&self, key: &ServiceKey) -> DiResult<Resolution>;

    /// Resolves `key` on behalf of `requester`.
    ///
    /// Initializers resolve their own parameters from `requester`, so a
    /// child's bindings are visible to a parent singleton first resolved
    /// through that child.
    fn resolve_for(&self, key: &ServiceKey, requester: &dyn Resolver) -> DiResult<Resolution>;

    /// Appends `parent` to the delegation chain.
    ///
    /// `None`, the current parent and the resolver itself are ignored. When a
    /// parent is already set the call is forwarded to it.
    fn set_parent(&self, parent: Option<Arc<dyn Resolver>>);

    /// Identity used to compare resolvers; handles to the same container
    /// report the same value.
    fn instance_id(&self) -> usize {
        (self as *const Self).cast::<()>() as usize
    }

    /// A handle that keeps the resolver alive, for storing as a parent.
    /// `None` when `self` already does.
    fn retain(&self) -> Option<Arc<dyn Resolver>> {
        None
    }

    /// Set on handles whose container has been dropped.
    fn is_detached(&self) -> bool {
        false
    }
}

/// Typed, best-effort and strict resolution on top of [`Resolver`].
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiError, ResolverExt};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync { fn now(&self) -> u64; }
/// struct Fixed;
/// impl Clock for Fixed { fn now(&self) -> u64 { 42 } }
///
/// let container = Container::new();
/// container.add_singleton::<Arc<dyn Clock>>(Arc::new(Fixed)).unwrap();
///
/// let clock = container.get_service::<Arc<dyn Clock>>().unwrap();
/// assert_eq!(clock.now(), 42);
///
/// struct Missing;
/// assert!(container.get_service::<Arc<Missing>>().is_none());
/// assert!(matches!(
///     container.invoke(|_m: Arc<Missing>| ()),
///     Err(DiError::UnsatisfiedDependency(_))
/// ));
/// ```
pub trait ResolverExt: Resolver {
    /// Resolves `key`; a miss is `Ok(None)`, other failures are errors.
    fn try_resolve(&self, key: &ServiceKey) -> DiResult<Option<AnyArc>> {
        match self.resolve_traced(key) {
            Ok(resolution) => Ok(Some(resolution.value)),
            Err(DiError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Best effort: any failure is `None`.
    fn resolve(&self, key: &ServiceKey) -> Option<AnyArc> {
        self.resolve_traced(key).ok().map(|r| r.value)
    }

    /// Like [`resolve_traced`](Resolver::resolve_traced) but a failed
    /// initializer is an error.
    fn resolve_strict(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        self.resolve_traced(key)?.into_strict(key)
    }

    fn try_get_service<S: ServiceHandle>(&self) -> DiResult<Option<S>> {
        self.try_resolve(&ServiceKey::of::<S>())?
            .map(|any| downcast::<S>(&any))
            .transpose()
    }

    fn get_service<S: ServiceHandle>(&self) -> Option<S> {
        self.try_get_service::<S>().ok().flatten()
    }

    /// Resolves `S` or panics.
    fn get_required<S: ServiceHandle>(&self) -> S {
        match self.try_get_service::<S>() {
            Ok(Some(service)) => service,
            Ok(None) => panic!("required service not registered: {}", std::any::type_name::<S>()),
            Err(err) => panic!("failed to resolve {}: {err}", std::any::type_name::<S>()),
        }
    }

    fn get_strict<S: ServiceHandle>(&self) -> DiResult<S> {
        let key = ServiceKey::of::<S>();
        downcast::<S>(&self.resolve_strict(&key)?)
    }

    /// Calls `f` with every parameter resolved from this resolver.
    ///
    /// Returns [`DiError::UnsatisfiedDependency`] without calling `f` when a
    /// parameter cannot be resolved.
    fn invoke<F, Args>(&self, f: F) -> DiResult<F::Output>
    where
        F: InjectFn<Args>,
    {
        f.call_injected(self)
    }

    /// Like [`invoke`](ResolverExt::invoke) but panics, before `f` runs, when
    /// a parameter cannot be resolved.
    fn inject_fn<F, Args>(&self, f: F) -> F::Output
    where
        F: InjectFn<Args>,
    {
        match self.invoke(f) {
            Ok(output) => output,
            Err(err) => panic!("cannot inject function: {err}"),
        }
    }

    /// Populates the fields `target` declares through [`Injectable`].
    ///
    /// Never fails: unresolvable fields stay `None` and are listed in the
    /// report. `None` targets and containers are left alone.
    fn inject<'t, T: Injectable>(&self, target: impl Into<Option<&'t mut T>>) -> InjectionReport {
        let Some(target) = target.into() else {
            return InjectionReport::default();
        };
        if (&*target as &dyn Any).is::<Container>() {
            return InjectionReport::target_skipped(std::any::type_name::<T>());
        }
        let lookup = |key: &ServiceKey| self.try_resolve(key);
        let mut fields = FieldInjector::new(&lookup);
        target.inject_fields(&mut fields);
        fields.finish()
    }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}
