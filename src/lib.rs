//! # crd-conversion
//!
//! Hub-and-spoke conversion between schema versions of a Kubernetes custom
//! resource.
//!
//! The crate answers one question:
//!
//! > Given an object in one version, what is the same object in another version?
//!
//! ## Core Contract
//!
//! 1. Every kind family has exactly one **hub** version
//! 2. Every other version (a **spoke**) knows how to convert to and from the hub
//! 3. Any version converts to any other, directly when one end is the hub and
//!    through a fresh hub value otherwise
//!
//! ## Architecture
//!
//! ```text
//! ConversionReview → ConversionHandler → Scheme::decode
//!                           ↓
//!                   ConversionRouter → HubResolver (LRU)
//!                           ↓
//!          spoke → hub → spoke  →  Scheme::encode → convertedObjects
//! ```
//!
//! ## Guarantees
//!
//! - A built [`Scheme`] never has a multi-version family with zero or several hubs
//! - Same identifier on both ends is rejected, never silently copied
//! - A batch either converts every object or reports the first failure

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod capability;
pub mod scheme;
pub mod hub;
pub mod router;
pub mod review;
pub mod apis;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{GroupVersion, GroupVersionKind, KindFamily, ObjectMeta, TypeMeta};
pub use types::object::{hub_mut, hub_ref, Convertible, Hub, Resource, VersionedObject};
pub use error::{ConversionError, MappingError, MissingEndpoint, SchemeError};
pub use capability::{is_convertible, is_hub, Capabilities, Shape};
pub use scheme::{Scheme, SchemeBuilder};
pub use hub::{resolve_hub, CacheConfig, CacheStats, HubResolver};
pub use router::{convert, ConversionRouter};
pub use review::{
    BatchError, ConversionHandler, ConversionRequest, ConversionResponse, ConversionReview,
    ReviewError, Status, StatusKind,
};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceConfig, ServiceState};
