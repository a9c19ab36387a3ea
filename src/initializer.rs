//! Post-construction initialization hooks.

use std::fmt;
use std::sync::Arc;

use crate::callable::{Callable, InjectFn};
use crate::error::DiError;
use crate::key::ServiceKey;
use crate::traits::Resolver;

/// Name reported for initializers that were not given one.
pub const DEFAULT_INITIALIZER: &str = "initialize";

/// Services that want their dependencies injected after construction.
///
/// The returned [`Initializer`] runs once for a singleton and once per
/// produced instance for a transient. Its parameters are resolved from the
/// container the resolution was requested on.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Initialize, Initializer, Instance, ResolverExt};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
///
/// struct Settings { greeting: &'static str }
///
/// #[derive(Default)]
/// struct Greeter { greeting: Mutex<Option<&'static str>> }
///
/// impl Initialize for Greeter {
///     fn initializer(self: Arc<Self>) -> Initializer {
///         Initializer::new(move |settings: Arc<Settings>| {
///             *self.greeting.lock() = Some(settings.greeting);
///         })
///     }
/// }
///
/// let container = Container::new();
/// container.add_singleton(Arc::new(Settings { greeting: "hello" })).unwrap();
/// container
///     .add_instance(Instance::with_initializer(Arc::new(Greeter::default()), |g| g))
///     .unwrap();
///
/// let greeter = container.get_required::<Arc<Greeter>>();
/// assert_eq!(*greeter.greeting.lock(), Some("hello"));
/// ```
pub trait Initialize: Send + Sync + 'static {
    fn initializer(self: Arc<Self>) -> Initializer;
}

/// An injectable closure run against a freshly bound instance.
#[derive(Clone)]
pub struct Initializer {
    name: &'static str,
    callable: Callable,
}

impl Initializer {
    pub fn new<F, Args>(f: F) -> Self
    where
        F: InjectFn<Args, Output = ()> + Clone + Send + Sync + 'static,
    {
        Self {
            name: DEFAULT_INITIALIZER,
            callable: Callable::new(f),
        }
    }

    /// Advertises an alternate name in diagnostics and errors.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn inputs(&self) -> &[ServiceKey] {
        self.callable.inputs()
    }

    pub fn requires(&self, key: &ServiceKey) -> bool {
        self.callable.requires(key)
    }

    pub(crate) fn run(&self, resolver: &dyn Resolver) -> InitializationOutcome {
        match self.callable.invoke(resolver) {
            Ok(_) => InitializationOutcome::Completed,
            Err(err) => InitializationOutcome::Failed(err),
        }
    }
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Initializer")
            .field("name", &self.name)
            .field("inputs", &self.inputs().iter().map(ServiceKey::name).collect::<Vec<_>>())
            .finish()
    }
}

/// Result of running (or skipping) an initializer.
#[derive(Debug, Clone)]
pub enum InitializationOutcome {
    /// The instance has no initializer.
    NotRequired,
    Completed,
    /// The initializer could not run; the instance is still usable.
    Failed(DiError),
}

impl InitializationOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, InitializationOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&DiError> {
        match self {
            InitializationOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}
