//! Conversion router.
//!
//! Decides and executes the conversion path between two versions of the same
//! kind family, using the family's hub as the intermediate representation.
//!
//! ## Decision Procedure
//!
//! 1. Same kind identifier on both ends: `SameVersionConversion`
//! 2. Source is the hub: `destination.convert_from(source)`
//! 3. Destination is the hub: `source.convert_to(destination)`
//! 4. Otherwise (spoke to spoke): resolve the hub, require both endpoints to be
//!    convertible, then `source → hub → destination` through a fresh hub value
//!
//! The destination arrives zero-valued with its identifier already fixed, and
//! is populated in place. Cross-family requests are not detected here; callers
//! must only pair versions of the same family.

use std::sync::Arc;

use tracing::debug;

use crate::capability::is_hub;
use crate::error::{ConversionError, MissingEndpoint};
use crate::hub::{resolve_hub, CacheConfig, CacheStats, HubResolver};
use crate::scheme::Scheme;
use crate::types::gvk::GroupVersionKind;
use crate::types::object::VersionedObject;

/// Convert `source` into the zero-valued `destination`.
///
/// Resolves the hub by scanning the scheme on every spoke-to-spoke call.
/// Use [`ConversionRouter`] to cache hub resolution.
pub fn convert(
    scheme: &Scheme,
    source: &dyn VersionedObject,
    destination: &mut dyn VersionedObject,
) -> Result<(), ConversionError> {
    route(source, destination, || resolve_hub(scheme, source))
}

fn route<F>(
    source: &dyn VersionedObject,
    destination: &mut dyn VersionedObject,
    resolve: F,
) -> Result<(), ConversionError>
where
    F: FnOnce() -> Result<Box<dyn VersionedObject>, ConversionError>,
{
    let from = source.group_version_kind();
    let to = destination.group_version_kind();
    let destination_type = destination.type_name();

    if from == to {
        return Err(ConversionError::SameVersionConversion {
            gvk: from,
            type_name: source.type_name(),
        });
    }

    if is_hub(source) {
        debug!(from = %from, to = %to, path = "from_hub", "converting object");
        return match destination.convertible_mut() {
            Some(convertible) => Ok(convertible.convert_from(source)?),
            None => Err(ConversionError::DestinationNotConvertible {
                gvk: to,
                type_name: destination_type,
            }),
        };
    }

    if is_hub(&*destination) {
        debug!(from = %from, to = %to, path = "to_hub", "converting object");
        return match source.convertible() {
            Some(convertible) => Ok(convertible.convert_to(destination)?),
            None => Err(ConversionError::SourceNotConvertible {
                gvk: from,
                type_name: source.type_name(),
            }),
        };
    }

    let mut hub = resolve()?;
    let hub_gvk = hub.group_version_kind();

    match (source.convertible(), destination.convertible_mut()) {
        (Some(spoke_in), Some(spoke_out)) => {
            debug!(from = %from, to = %to, hub = %hub_gvk, path = "routed", "converting object");

            spoke_in
                .convert_to(&mut *hub)
                .map_err(|cause| ConversionError::SourceToHubFailed {
                    type_name: source.type_name(),
                    hub: hub_gvk.clone(),
                    cause,
                })?;

            spoke_out
                .convert_from(&*hub)
                .map_err(|cause| ConversionError::HubToDestinationFailed {
                    type_name: destination_type,
                    hub: hub_gvk,
                    cause,
                })
        }
        (spoke_in, spoke_out) => {
            let missing = MissingEndpoint::from_flags(spoke_in.is_some(), spoke_out.is_some())
                .unwrap_or(MissingEndpoint::Both);
            Err(ConversionError::BothEndpointsMustBeConvertible { from, to, missing })
        }
    }
}

/// Conversion router bound to a scheme, with cached hub resolution.
///
/// Stateless apart from the hub cache; safe to share across threads.
#[derive(Debug)]
pub struct ConversionRouter {
    resolver: HubResolver,
}

impl ConversionRouter {
    /// Create a router with the default hub cache.
    pub fn new(scheme: Arc<Scheme>) -> Self {
        Self::with_cache_config(scheme, CacheConfig::default())
    }

    /// Create a router with a custom hub cache configuration.
    pub fn with_cache_config(scheme: Arc<Scheme>, config: CacheConfig) -> Self {
        Self {
            resolver: HubResolver::new(scheme, config),
        }
    }

    /// The scheme conversions are resolved against.
    pub fn scheme(&self) -> &Arc<Scheme> {
        self.resolver.scheme()
    }

    /// Convert `source` into the zero-valued `destination`.
    pub fn convert(
        &self,
        source: &dyn VersionedObject,
        destination: &mut dyn VersionedObject,
    ) -> Result<(), ConversionError> {
        route(source, destination, || self.resolver.resolve(source))
    }

    /// Convert `source` into a fresh instance of the destination identifier.
    pub fn convert_into(
        &self,
        source: &dyn VersionedObject,
        to: &GroupVersionKind,
    ) -> Result<Box<dyn VersionedObject>, ConversionError> {
        let mut destination = self.scheme().new_object(to)?;
        self.convert(source, &mut *destination)?;
        Ok(destination)
    }

    /// Hub cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.resolver.stats()
    }
}
