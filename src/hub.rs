//! Hub resolution.
//!
//! Finds the single version of a kind family that carries the [`Hub`] marker.
//!
//! ## Algorithm
//!
//! 1. Ask the scheme for every identifier in the family
//! 2. Instantiate a zero value for each (failures are logged and skipped)
//! 3. Keep the ones carrying the hub marker
//! 4. Exactly one: return it. None: `NoHubDefined`. Several: `MultipleHubsDefined`
//!
//! ## Caching
//!
//! [`HubResolver`] remembers the resolved hub identifier per family. The
//! scheme cannot change after it is built, so entries never go stale. A hit
//! still instantiates a fresh zero-valued hub, and a failure to do so is a
//! hard error.
//!
//! [`Hub`]: crate::types::object::Hub

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capability::is_hub;
use crate::error::{ConversionError, SchemeError};
use crate::scheme::Scheme;
use crate::types::gvk::{GroupVersionKind, KindFamily};
use crate::types::object::VersionedObject;

/// Resolve the hub of the instance's kind family.
///
/// Returns a freshly instantiated, zero-valued hub.
pub fn resolve_hub(scheme: &Scheme, obj: &dyn VersionedObject) -> Result<Box<dyn VersionedObject>, ConversionError> {
    let kinds = scheme.kinds_for(obj)?;
    select_hub(scheme, obj.group_version_kind().family(), kinds)
}

/// Resolve the hub of a kind family directly.
pub fn resolve_family_hub(scheme: &Scheme, family: &KindFamily) -> Result<Box<dyn VersionedObject>, ConversionError> {
    select_hub(scheme, family.clone(), scheme.versions_of(family))
}

fn select_hub(
    scheme: &Scheme,
    family: KindFamily,
    kinds: Vec<GroupVersionKind>,
) -> Result<Box<dyn VersionedObject>, ConversionError> {
    let mut hubs: Vec<Box<dyn VersionedObject>> = Vec::new();

    for gvk in kinds {
        match scheme.new_object(&gvk) {
            Ok(candidate) => {
                if is_hub(&*candidate) {
                    hubs.push(candidate);
                }
            }
            Err(e) => {
                warn!(
                    gvk = %gvk,
                    error = %e,
                    "skipping kind that failed to instantiate during hub resolution"
                );
            }
        }
    }

    let mut found = hubs.into_iter();
    match (found.next(), found.next()) {
        (None, _) => Err(ConversionError::NoHubDefined { family }),
        (Some(hub), None) => Ok(hub),
        (Some(first), Some(second)) => {
            let mut all = vec![first.group_version_kind(), second.group_version_kind()];
            all.extend(found.map(|h| h.group_version_kind()));
            Err(ConversionError::MultipleHubsDefined { family, hubs: all })
        }
    }
}

/// Configuration for the hub resolution cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of families remembered.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// A configuration with caching turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Resolutions answered from the cache.
    pub hits: u64,
    /// Resolutions that scanned the scheme.
    pub misses: u64,
    /// Families currently cached.
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of resolutions served from cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Hub resolver bound to one scheme, with an optional per-family cache.
///
/// Thread-safe. Cloning the scheme handle is cheap.
pub struct HubResolver {
    scheme: Arc<Scheme>,
    cache: Option<Mutex<LruCache<KindFamily, GroupVersionKind>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HubResolver {
    /// Create a resolver with the given cache configuration.
    pub fn new(scheme: Arc<Scheme>, config: CacheConfig) -> Self {
        let cache = if config.enabled {
            let size = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
            Some(Mutex::new(LruCache::new(size)))
        } else {
            None
        };

        Self {
            scheme,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a resolver that rescans the scheme on every call.
    pub fn uncached(scheme: Arc<Scheme>) -> Self {
        Self::new(scheme, CacheConfig::disabled())
    }

    /// The scheme this resolver reads.
    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    /// Resolve the hub of the instance's kind family.
    pub fn resolve(&self, obj: &dyn VersionedObject) -> Result<Box<dyn VersionedObject>, ConversionError> {
        let Some(cache) = &self.cache else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return resolve_hub(&self.scheme, obj);
        };

        let gvk = obj.group_version_kind();
        if !self.scheme.recognizes(&gvk) {
            return Err(SchemeError::NotRegistered(gvk).into());
        }
        let family = gvk.family();

        let cached = cache.lock().get(&family).cloned();
        if let Some(hub_gvk) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(family = %family, hub = %hub_gvk, "hub resolved from cache");
            return Ok(self.scheme.new_object(&hub_gvk)?);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let hub = resolve_hub(&self.scheme, obj)?;
        debug!(family = %family, hub = %hub.group_version_kind(), "hub resolved");
        cache.lock().put(family, hub.group_version_kind());
        Ok(hub)
    }

    /// Current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.as_ref().map(|c| c.lock().len()).unwrap_or(0),
        }
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }
}

impl std::fmt::Debug for HubResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubResolver")
            .field("scheme", &self.scheme.fingerprint())
            .field("cached", &self.cache.is_some())
            .field("stats", &self.stats())
            .finish()
    }
}
