//! Closures whose parameters are supplied by the container.
//!
//! Every `FnOnce` of up to eight parameters, each a [`ServiceHandle`], is an
//! [`InjectFn`]. Invoking one resolves all parameters first and only then
//! runs the closure, so a missing dependency never leaves the body half run.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::{DiError, DiResult};
use crate::key::{ServiceHandle, ServiceKey};
use crate::registration::AnyArc;
use crate::traits::{Resolver, ResolverExt};

/// Declared parameter identities of a callable.
pub type Dependencies = SmallVec<[ServiceKey; 4]>;

/// A closure that can be invoked with arguments resolved from a container.
///
/// `Args` is the tuple of parameter types; it only exists to keep the
/// per-arity implementations apart and is inferred at the call site.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, ResolverExt};
/// use std::sync::Arc;
///
/// struct Config { port: u16 }
///
/// let container = Container::new();
/// container.add_singleton(Arc::new(Config { port: 8080 })).unwrap();
///
/// let port = container.invoke(|cfg: Arc<Config>| cfg.port).unwrap();
/// assert_eq!(port, 8080);
/// ```
pub trait InjectFn<Args>: Sized {
    /// Value returned by the closure.
    type Output;

    /// Parameter identities, in declaration order.
    fn dependencies() -> Dependencies;

    /// Resolves every parameter from `resolver`, then calls the closure.
    fn call_injected<R: Resolver + ?Sized>(self, resolver: &R) -> DiResult<Self::Output>;
}

#[inline]
fn require<S: ServiceHandle, R: Resolver + ?Sized>(resolver: &R) -> DiResult<S> {
    resolver
        .try_get_service::<S>()?
        .ok_or(DiError::UnsatisfiedDependency(std::any::type_name::<S>()))
}

macro_rules! impl_inject_fn {
    () => {
        impl_inject_fn!(@impl);
    };
    ($first:ident $(, $rest:ident)*) => {
        impl_inject_fn!(@impl $first $(, $rest)*);
        impl_inject_fn!($($rest),*);
    };
    (@impl $($arg:ident),*) => {
        impl<F, Out $(, $arg)*> InjectFn<($($arg,)*)> for F
        where
            F: FnOnce($($arg),*) -> Out,
            $($arg: ServiceHandle,)*
        {
            type Output = Out;

            fn dependencies() -> Dependencies {
                smallvec::smallvec![$(ServiceKey::of::<$arg>()),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn call_injected<Res: Resolver + ?Sized>(self, resolver: &Res) -> DiResult<Out> {
                $(let $arg = require::<$arg, Res>(resolver)?;)*
                Ok(self($($arg),*))
            }
        }
    };
}

impl_inject_fn!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Return types a stored [`Callable`] may produce.
pub trait CallOutput {
    /// Identity of the produced service, `None` for `()`.
    fn output_key() -> Option<ServiceKey>;

    fn into_any(self) -> Option<AnyArc>;
}

impl CallOutput for () {
    fn output_key() -> Option<ServiceKey> {
        None
    }

    fn into_any(self) -> Option<AnyArc> {
        None
    }
}

impl<T: ?Sized + Send + Sync + 'static> CallOutput for Arc<T> {
    fn output_key() -> Option<ServiceKey> {
        Some(ServiceKey::of::<Arc<T>>())
    }

    fn into_any(self) -> Option<AnyArc> {
        Some(Arc::new(self))
    }
}

type ErasedCall = dyn Fn(&dyn Resolver) -> DiResult<Option<AnyArc>> + Send + Sync;

/// A type-erased, repeatable [`InjectFn`].
///
/// Used for initializers and for factories built from arbitrary closures.
/// The declared inputs and output are kept so registration can check the
/// shape without calling it.
#[derive(Clone)]
pub struct Callable {
    name: &'static str,
    inputs: Dependencies,
    output: Option<ServiceKey>,
    call: Arc<ErasedCall>,
}

impl Callable {
    pub fn new<F, Args>(f: F) -> Self
    where
        F: InjectFn<Args> + Clone + Send + Sync + 'static,
        F::Output: CallOutput,
    {
        Self {
            name: std::any::type_name::<F>(),
            inputs: F::dependencies(),
            output: <F::Output as CallOutput>::output_key(),
            call: Arc::new(move |resolver: &dyn Resolver| {
                f.clone().call_injected(resolver).map(CallOutput::into_any)
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn inputs(&self) -> &[ServiceKey] {
        &self.inputs
    }

    pub fn output(&self) -> Option<ServiceKey> {
        self.output
    }

    /// Whether `key` is among the declared inputs.
    pub fn requires(&self, key: &ServiceKey) -> bool {
        self.inputs.contains(key)
    }

    /// Resolves the inputs from `resolver` and calls through.
    pub fn invoke(&self, resolver: &dyn Resolver) -> DiResult<Option<AnyArc>> {
        (self.call)(resolver)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("inputs", &self.inputs.iter().map(ServiceKey::name).collect::<Vec<_>>())
            .field("output", &self.output.map(|k| k.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[test]
    fn dependencies_are_in_declaration_order() {
        fn deps<F: InjectFn<Args>, Args>(_: &F) -> Dependencies {
            F::dependencies()
        }
        let f = |_a: Arc<A>, _b: Arc<B>| ();
        let keys = deps(&f);
        assert_eq!(keys.as_slice(), &[ServiceKey::of::<Arc<A>>(), ServiceKey::of::<Arc<B>>()]);
    }

    #[test]
    fn callable_records_shape() {
        let unit = Callable::new(|_a: Arc<A>| ());
        assert_eq!(unit.inputs().len(), 1);
        assert!(unit.output().is_none());
        assert!(unit.requires(&ServiceKey::of::<Arc<A>>()));

        let producer = Callable::new(|| Arc::new(B));
        assert!(producer.inputs().is_empty());
        assert_eq!(producer.output(), Some(ServiceKey::of::<Arc<B>>()));
    }
}
