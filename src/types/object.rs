//! Versioned instances and their conversion capabilities.
//!
//! ## Capability Model
//!
//! A versioned type exposes zero, one or both of two capabilities:
//!
//! - [`Hub`]: a marker. Exactly one version per family carries it.
//! - [`Convertible`]: knows how to convert itself to the hub and how to
//!   populate itself from the hub.
//!
//! Capabilities are surfaced through optional accessors on [`Resource`]
//! (`as_hub`, `as_convertible`, `as_convertible_mut`). A type opts in by
//! overriding the accessor to return `Some(self)`:
//!
//! ```rust,ignore
//! impl Resource for ExternalJob {
//!     const GROUP: &'static str = "jobs.example.org";
//!     const VERSION: &'static str = "v1";
//!     const KIND: &'static str = "ExternalJob";
//!
//!     fn as_convertible(&self) -> Option<&dyn Convertible> { Some(self) }
//!     fn as_convertible_mut(&mut self) -> Option<&mut dyn Convertible> { Some(self) }
//! }
//! ```
//!
//! Every [`Resource`] is a [`VersionedObject`] through a blanket impl, which
//! is the object-safe view the scheme and router work with.

use std::any::Any;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::gvk::GroupVersionKind;
use crate::error::MappingError;

/// Marker capability for the hub version of a kind family.
pub trait Hub: Send + Sync {
    /// Marker method. Has no behavior.
    fn hub(&self) {}
}

/// Conversion capability for spoke versions.
///
/// Implementations receive the hub as a [`VersionedObject`] and downcast it
/// with [`hub_ref`] / [`hub_mut`].
pub trait Convertible: Send + Sync {
    /// Write this object's data into the (zero-valued) hub.
    fn convert_to(&self, hub: &mut dyn VersionedObject) -> Result<(), MappingError>;

    /// Populate this (zero-valued) object from the hub.
    fn convert_from(&mut self, hub: &dyn VersionedObject) -> Result<(), MappingError>;
}

/// A concrete, statically typed schema version.
pub trait Resource: Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// API group.
    const GROUP: &'static str;
    /// Schema version.
    const VERSION: &'static str;
    /// Resource kind.
    const KIND: &'static str;

    /// The kind identifier of this type.
    fn gvk() -> GroupVersionKind {
        GroupVersionKind::new(Self::GROUP, Self::VERSION, Self::KIND)
    }

    /// Hub capability, if this version is the hub.
    fn as_hub(&self) -> Option<&dyn Hub> {
        None
    }

    /// Convertible capability, if any.
    fn as_convertible(&self) -> Option<&dyn Convertible> {
        None
    }

    /// Mutable convertible capability, if any.
    fn as_convertible_mut(&mut self) -> Option<&mut dyn Convertible> {
        None
    }
}

/// Object-safe view of a versioned instance.
pub trait VersionedObject: Any + Send + Sync {
    /// The kind identifier of this instance.
    fn group_version_kind(&self) -> GroupVersionKind;

    /// Rust type name, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Hub capability probe.
    fn hub_capability(&self) -> Option<&dyn Hub>;

    /// Convertible capability probe.
    fn convertible(&self) -> Option<&dyn Convertible>;

    /// Mutable convertible capability probe.
    fn convertible_mut(&mut self) -> Option<&mut dyn Convertible>;

    /// Serialize the object body (without `apiVersion`/`kind`).
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Resource> VersionedObject for T {
    fn group_version_kind(&self) -> GroupVersionKind {
        T::gvk()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn hub_capability(&self) -> Option<&dyn Hub> {
        self.as_hub()
    }

    fn convertible(&self) -> Option<&dyn Convertible> {
        self.as_convertible()
    }

    fn convertible_mut(&mut self) -> Option<&mut dyn Convertible> {
        self.as_convertible_mut()
    }

    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Borrow the hub as its concrete type, or fail with [`MappingError::UnexpectedHub`].
pub fn hub_ref<H: Resource>(hub: &dyn VersionedObject) -> Result<&H, MappingError> {
    let found = hub.group_version_kind();
    hub.as_any()
        .downcast_ref::<H>()
        .ok_or_else(|| MappingError::UnexpectedHub {
            expected: H::gvk(),
            found,
        })
}

/// Mutably borrow the hub as its concrete type, or fail with [`MappingError::UnexpectedHub`].
pub fn hub_mut<H: Resource>(hub: &mut dyn VersionedObject) -> Result<&mut H, MappingError> {
    let found = hub.group_version_kind();
    hub.as_any_mut()
        .downcast_mut::<H>()
        .ok_or(MappingError::UnexpectedHub {
            expected: H::gvk(),
            found,
        })
}
