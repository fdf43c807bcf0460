//! Type registry.
//!
//! A [`Scheme`] maps kind identifiers to constructors and decoders, and answers
//! which identifiers make up a kind family. It is assembled once with a
//! [`SchemeBuilder`] and is immutable afterwards, so it can be shared across
//! threads behind an `Arc` without locking.
//!
//! ## Startup Validation
//!
//! [`SchemeBuilder::build`] resolves the hub of every family that has more
//! than one version and refuses to produce a scheme where a family has zero
//! or several hubs. Misconfiguration is caught before any conversion traffic.
//! [`SchemeBuilder::build_unvalidated`] skips that check (fixtures only).

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hasher;

use serde::Deserialize;
use xxhash_rust::xxh64::Xxh64;

use crate::capability::Capabilities;
use crate::error::{ConversionError, SchemeError};
use crate::hub::resolve_family_hub;
use crate::types::gvk::{GroupVersionKind, KindFamily};
use crate::types::meta::TypeMeta;
use crate::types::object::{Resource, VersionedObject};

type Factory = Box<dyn Fn() -> Result<Box<dyn VersionedObject>, SchemeError> + Send + Sync>;
type Decoder = fn(serde_json::Value) -> Result<Box<dyn VersionedObject>, serde_json::Error>;

struct Registration {
    type_name: &'static str,
    factory: Factory,
    decoder: Decoder,
}

fn decode_as<T: Resource>(value: serde_json::Value) -> Result<Box<dyn VersionedObject>, serde_json::Error> {
    let obj: T = serde_json::from_value(value)?;
    Ok(Box::new(obj))
}

/// Builder for a [`Scheme`].
#[derive(Default)]
pub struct SchemeBuilder {
    registrations: Vec<(GroupVersionKind, Registration)>,
}

impl SchemeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a versioned type, constructed with `Default`.
    pub fn register<T: Resource>(self) -> Self {
        self.register_with::<T, _>(|| Ok(T::default()))
    }

    /// Register a versioned type with a custom zero-value constructor.
    pub fn register_with<T, F>(mut self, factory: F) -> Self
    where
        T: Resource,
        F: Fn() -> Result<T, SchemeError> + Send + Sync + 'static,
    {
        let registration = Registration {
            type_name: std::any::type_name::<T>(),
            factory: Box::new(move || {
                factory().map(|obj| Box::new(obj) as Box<dyn VersionedObject>)
            }),
            decoder: decode_as::<T>,
        };
        self.registrations.push((T::gvk(), registration));
        self
    }

    /// Build the scheme without checking hub configuration.
    ///
    /// Still rejects malformed identifiers and duplicate registrations.
    pub fn build_unvalidated(self) -> Result<Scheme, SchemeError> {
        let mut types: BTreeMap<GroupVersionKind, Registration> = BTreeMap::new();

        for (gvk, registration) in self.registrations {
            if gvk.version.is_empty() || gvk.kind.is_empty() {
                return Err(SchemeError::InvalidKind {
                    gvk,
                    reason: "version and kind must be non-empty".to_string(),
                });
            }
            if gvk.version.contains('/') || gvk.group.contains('/') {
                return Err(SchemeError::InvalidKind {
                    gvk,
                    reason: "group and version must not contain '/'".to_string(),
                });
            }
            if let Some(existing) = types.get(&gvk) {
                return Err(SchemeError::DuplicateKind {
                    gvk,
                    existing: existing.type_name,
                    duplicate: registration.type_name,
                });
            }
            types.insert(gvk, registration);
        }

        let fingerprint = fingerprint(&types);
        Ok(Scheme { types, fingerprint })
    }

    /// Build the scheme and verify every multi-version family has exactly one hub.
    pub fn build(self) -> Result<Scheme, SchemeError> {
        let scheme = self.build_unvalidated()?;
        scheme.validate()?;
        Ok(scheme)
    }
}

fn fingerprint(types: &BTreeMap<GroupVersionKind, Registration>) -> String {
    let mut hasher = Xxh64::new(0);
    for (gvk, registration) in types {
        hasher.write(gvk.group.as_bytes());
        hasher.write(&[0]);
        hasher.write(gvk.version.as_bytes());
        hasher.write(&[0]);
        hasher.write(gvk.kind.as_bytes());
        hasher.write(&[0]);
        hasher.write(registration.type_name.as_bytes());
        hasher.write(&[0xff]);
    }
    format!("{:016x}", hasher.finish())
}

/// Immutable type registry.
pub struct Scheme {
    types: BTreeMap<GroupVersionKind, Registration>,
    fingerprint: String,
}

impl Scheme {
    /// Start building a scheme.
    pub fn builder() -> SchemeBuilder {
        SchemeBuilder::new()
    }

    /// Instantiate a zero-valued object for the identifier.
    pub fn new_object(&self, gvk: &GroupVersionKind) -> Result<Box<dyn VersionedObject>, SchemeError> {
        let registration = self
            .types
            .get(gvk)
            .ok_or_else(|| SchemeError::NotRegistered(gvk.clone()))?;
        (registration.factory)()
    }

    /// Every identifier in the instance's kind family, in version priority order.
    ///
    /// Fails if the instance's own identifier is not registered.
    pub fn kinds_for(&self, obj: &dyn VersionedObject) -> Result<Vec<GroupVersionKind>, SchemeError> {
        let gvk = obj.group_version_kind();
        if !self.recognizes(&gvk) {
            return Err(SchemeError::NotRegistered(gvk));
        }
        Ok(self.versions_of(&gvk.family()))
    }

    /// Every registered identifier of a family, in version priority order.
    pub fn versions_of(&self, family: &KindFamily) -> Vec<GroupVersionKind> {
        // BTreeMap order is (group, kind, version priority).
        self.types
            .keys()
            .filter(|gvk| family.contains(gvk))
            .cloned()
            .collect()
    }

    /// Every registered family.
    pub fn families(&self) -> Vec<KindFamily> {
        let mut families: Vec<KindFamily> = self.types.keys().map(|gvk| gvk.family()).collect();
        families.dedup();
        families
    }

    /// Every registered identifier.
    pub fn all_kinds(&self) -> Vec<GroupVersionKind> {
        self.types.keys().cloned().collect()
    }

    /// Whether the identifier is registered.
    pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
        self.types.contains_key(gvk)
    }

    /// Rust type registered for the identifier.
    pub fn type_name(&self, gvk: &GroupVersionKind) -> Option<&'static str> {
        self.types.get(gvk).map(|r| r.type_name)
    }

    /// Probe the capabilities of a registered identifier's zero value.
    pub fn capabilities(&self, gvk: &GroupVersionKind) -> Result<Capabilities, SchemeError> {
        let obj = self.new_object(gvk)?;
        Ok(Capabilities::of(&*obj))
    }

    /// Decode a raw JSON object into its registered type, selected by `apiVersion` and `kind`.
    pub fn decode(&self, raw: &serde_json::Value) -> Result<Box<dyn VersionedObject>, SchemeError> {
        let type_meta = TypeMeta::deserialize(raw).map_err(SchemeError::Malformed)?;
        if type_meta.api_version.is_empty() {
            return Err(SchemeError::MissingTypeMeta("apiVersion"));
        }
        if type_meta.kind.is_empty() {
            return Err(SchemeError::MissingTypeMeta("kind"));
        }

        let gvk = GroupVersionKind::from_api_version_and_kind(&type_meta.api_version, &type_meta.kind)?;
        let registration = self
            .types
            .get(&gvk)
            .ok_or_else(|| SchemeError::NotRegistered(gvk.clone()))?;

        (registration.decoder)(raw.clone()).map_err(|cause| SchemeError::Decode { gvk, cause })
    }

    /// Decode raw JSON bytes.
    pub fn decode_bytes(&self, raw: &[u8]) -> Result<Box<dyn VersionedObject>, SchemeError> {
        let value: serde_json::Value = serde_json::from_slice(raw).map_err(SchemeError::Malformed)?;
        self.decode(&value)
    }

    /// Encode an object to JSON with `apiVersion` and `kind` set from its identifier.
    pub fn encode(&self, obj: &dyn VersionedObject) -> Result<serde_json::Value, SchemeError> {
        let gvk = obj.group_version_kind();
        let body = obj.to_json().map_err(|cause| SchemeError::Encode {
            gvk: gvk.clone(),
            cause,
        })?;

        let serde_json::Value::Object(mut map) = body else {
            return Err(SchemeError::Encode {
                gvk,
                cause: serde::ser::Error::custom("object must serialize to a JSON map"),
            });
        };
        map.insert("apiVersion".to_string(), serde_json::Value::String(gvk.api_version()));
        map.insert("kind".to_string(), serde_json::Value::String(gvk.kind));
        Ok(serde_json::Value::Object(map))
    }

    /// Check that every family with more than one version has exactly one hub.
    pub fn validate(&self) -> Result<(), SchemeError> {
        for family in self.families() {
            if self.versions_of(&family).len() < 2 {
                continue;
            }
            match resolve_family_hub(self, &family) {
                Ok(_) => {}
                Err(ConversionError::NoHubDefined { family }) => {
                    return Err(SchemeError::HubMisconfigured { family, hubs: Vec::new() });
                }
                Err(ConversionError::MultipleHubsDefined { family, hubs }) => {
                    return Err(SchemeError::HubMisconfigured { family, hubs });
                }
                Err(ConversionError::Scheme(e)) => return Err(e),
                Err(other) => {
                    return Err(SchemeError::Instantiation {
                        gvk: GroupVersionKind::new(family.group.clone(), "", family.kind.clone()),
                        reason: other.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fingerprint of the registered identifiers and types.
    ///
    /// Changes whenever a registration is added or removed.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Number of registered identifiers.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheme")
            .field("kinds", &self.types.keys().collect::<Vec<_>>())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}
