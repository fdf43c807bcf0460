//! Service state management.
//!
//! Holds the conversion handler and the startup time shared by every request.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::apis;
use crate::error::SchemeError;
use crate::hub::CacheConfig;
use crate::review::ConversionHandler;
use crate::scheme::Scheme;

use super::config::ServiceConfig;

/// Shared service state.
pub struct ServiceState {
    /// Batch conversion handler (owns the router and hub cache).
    pub handler: Arc<ConversionHandler>,
    /// When the state was created.
    pub started_at: DateTime<Utc>,
}

impl ServiceState {
    /// Create service state for a scheme.
    pub fn new(scheme: Arc<Scheme>, cache: CacheConfig) -> Self {
        Self {
            handler: Arc::new(ConversionHandler::with_scheme(scheme, cache)),
            started_at: Utc::now(),
        }
    }

    /// Create service state serving the built-in resources.
    ///
    /// Fails if the built-in scheme does not validate.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, SchemeError> {
        let scheme = apis::default_scheme()?;
        tracing::info!(
            kinds = scheme.len(),
            fingerprint = %scheme.fingerprint(),
            cache_enabled = config.hub_cache.enabled,
            "scheme initialized"
        );
        Ok(Self::new(Arc::new(scheme), config.hub_cache.clone()))
    }

    /// The scheme being served.
    pub fn scheme(&self) -> &Arc<Scheme> {
        self.handler.scheme()
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}

impl Clone for ServiceState {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            started_at: self.started_at,
        }
    }
}
