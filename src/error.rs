//! Error types for the container.

use crate::key::Shape;

/// Container errors.
///
/// Registration errors are returned to the caller. Resolution misses surface
/// as [`DiError::NotFound`] and are turned into `None` by the best-effort
/// resolution methods.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiError, ServiceKey};
/// use std::sync::Arc;
///
/// struct Plain;
///
/// let container = Container::new();
/// let err = container
///     .register_singleton(Some(ServiceKey::of_value::<Plain>()), None, false)
///     .unwrap_err();
/// assert!(matches!(err, DiError::InvalidServiceShape { .. }));
///
/// let circular = DiError::Circular(vec!["A", "B", "A"]);
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// No service identity was supplied
    #[error("Service type is missing")]
    MissingIdentity,
    /// Identity is neither an interface nor a shared pointer
    #[error("Invalid service shape for {service}: expected an interface or a shared pointer, got {shape:?}")]
    InvalidServiceShape { service: &'static str, shape: Shape },
    /// Neither an instance nor a factory was supplied
    #[error("Missing instance for service: {0}")]
    MissingInstance(&'static str),
    /// Instance or factory output does not match the identity
    #[error("Type mismatch for {service}: got {actual}")]
    TypeMismatch { service: &'static str, actual: &'static str },
    /// Factory takes inputs or produces no value
    #[error("Invalid factory for {service}: expected 0 inputs and 1 output, got {inputs} inputs and {outputs} outputs")]
    InvalidFactoryShape {
        service: &'static str,
        inputs: usize,
        outputs: usize,
    },
    /// A singleton initializer requires the singleton itself
    #[error("Cyclic initializer: '{initializer}' of {service} requires {service}")]
    CyclicInitializer {
        service: &'static str,
        initializer: &'static str,
    },
    /// A closure parameter has no binding anywhere in the chain
    #[error("Unsatisfied dependency: {0}")]
    UnsatisfiedDependency(&'static str),
    /// Service not registered
    #[error("Service not found: {0}")]
    NotFound(&'static str),
    /// Re-entrant initialization (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Initializer failed; only produced by strict resolution
    #[error("Initializer of {service} failed: {source}")]
    InitializerFailed {
        service: &'static str,
        #[source]
        source: Box<DiError>,
    },
}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
