//! Core types for versioned resources.

pub mod gvk;
pub mod meta;
pub mod object;

pub use gvk::{compare_version_priority, GroupVersion, GroupVersionKind, KindFamily};
pub use meta::{ObjectMeta, TypeMeta};
pub use object::{Convertible, Hub, Resource, VersionedObject};
