//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Lifetime, ResolverExt};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Request { id: u32 }
///
/// let container = Container::new();
/// container.add_singleton(Arc::new(Database { url: "postgres://localhost".into() })).unwrap();
/// container.add_transient(|| Arc::new(Request { id: 7 })).unwrap();
///
/// let db1 = container.get_required::<Arc<Database>>();
/// let db2 = container.get_required::<Arc<Database>>();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let r1 = container.get_required::<Arc<Request>>();
/// let r2 = container.get_required::<Arc<Request>>();
/// assert!(!Arc::ptr_eq(&r1, &r2));
///
/// let lifetimes: Vec<Lifetime> = container.registrations().into_iter().map(|(_, l)| l).collect();
/// assert!(lifetimes.contains(&Lifetime::Transient));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One caller-supplied instance, initialized once and shared forever
    Singleton,
    /// New instance per resolution, never cached
    ///
    /// The initializer, if any, runs on every produced instance.
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => f.pad("singleton"),
            Lifetime::Transient => f.pad("transient"),
        }
    }
}
