//! Core traits for the container.

mod resolver;

pub use resolver::{resolver_key, Resolution, Resolver, ResolverExt};
