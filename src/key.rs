//! Service identity types for the container.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

/// Structural shape of a service identity.
///
/// Only shared handles can be bound. By-value types can still be described
/// (see [`ServiceKey::of_value`]); registering one fails with
/// [`DiError::InvalidServiceShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// `Arc` over an unsized pointee, normally `Arc<dyn Trait>`.
    Interface,
    /// `Arc` over a sized pointee, e.g. `Arc<Database>`.
    Pointer,
    /// A plain value type. Never bindable.
    Value,
}

impl Shape {
    /// Whether identities of this shape may key a binding.
    pub fn is_bindable(self) -> bool {
        !matches!(self, Shape::Value)
    }
}

/// Handle types that can act as service identities.
///
/// Implemented for every `Arc<T>` whose pointee is `Send + Sync`. Resolution
/// hands out clones of the handle, so two resolutions of a singleton are
/// `Arc::ptr_eq`.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ServiceHandle, Shape};
/// use std::sync::Arc;
///
/// trait Repo: Send + Sync {}
/// struct Db;
///
/// assert_eq!(<Arc<dyn Repo> as ServiceHandle>::SHAPE, Shape::Interface);
/// assert_eq!(<Arc<Db> as ServiceHandle>::SHAPE, Shape::Pointer);
/// ```
///
/// The shape is read off the pointer width: any unsized pointee counts as
/// [`Shape::Interface`]. That includes slices and `str`, so `Arc<str>` and
/// `Arc<[u8]>` are interface-shaped even though they are not trait objects.
pub trait ServiceHandle: Clone + Send + Sync + 'static {
    /// Shape derived from the handle type.
    const SHAPE: Shape;
}

impl<T: ?Sized + Send + Sync + 'static> ServiceHandle for Arc<T> {
    // Unsized pointees make the pointer fat.
    const SHAPE: Shape = if std::mem::size_of::<*const T>() == std::mem::size_of::<*const ()>() {
        Shape::Pointer
    } else {
        Shape::Interface
    };
}

/// Key for binding storage and lookup.
///
/// Equality and hashing use the `TypeId` only; the name and shape ride along
/// for diagnostics and validation.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ServiceKey, Shape};
/// use std::sync::Arc;
///
/// struct Config;
///
/// let key = ServiceKey::of::<Arc<Config>>();
/// assert_eq!(key.shape(), Shape::Pointer);
/// assert!(key.name().ends_with("Config>"));
///
/// let value = ServiceKey::of_value::<Config>();
/// assert!(!value.shape().is_bindable());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
    shape: Shape,
}

impl ServiceKey {
    /// Identity of a service handle type.
    #[inline]
    pub fn of<S: ServiceHandle>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
            shape: S::SHAPE,
        }
    }

    /// Describes a by-value type. Registration rejects such identities.
    pub fn of_value<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape: Shape::Value,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// `std::any::type_name` of the described type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }
}

impl PartialEq for ServiceKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[inline(always)]
pub fn key_of<S: ServiceHandle>() -> ServiceKey {
    ServiceKey::of::<S>()
}

/// Recovers a typed handle from type-erased storage.
pub(crate) fn downcast<S: ServiceHandle>(any: &AnyArc) -> DiResult<S> {
    let any: &(dyn Any + Send + Sync) = &**any;
    any.downcast_ref::<S>()
        .cloned()
        .ok_or(DiError::TypeMismatch {
            service: std::any::type_name::<S>(),
            actual: "<erased>",
        })
}
