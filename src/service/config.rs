//! Service configuration.
//!
//! ## Environment
//!
//! | Variable                | Default   |
//! |-------------------------|-----------|
//! | `HOST`                  | `0.0.0.0` |
//! | `PORT`                  | `9876`    |
//! | `HUB_CACHE_ENABLED`     | `true`    |
//! | `HUB_CACHE_MAX_ENTRIES` | `256`     |
//!
//! Unparseable values fall back to the default with a warning.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hub::CacheConfig;

/// Default listen port for the conversion webhook.
pub const DEFAULT_PORT: u16 = 9876;

/// Default listen host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Runtime configuration for the webhook service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Hub resolution cache.
    pub hub_cache: CacheConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            hub_cache: CacheConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST")
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);

        Self {
            host,
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            hub_cache: CacheConfig {
                enabled: parse_or("HUB_CACHE_ENABLED", lookup("HUB_CACHE_ENABLED"), defaults.hub_cache.enabled),
                max_entries: parse_or(
                    "HUB_CACHE_MAX_ENTRIES",
                    lookup("HUB_CACHE_MAX_ENTRIES"),
                    defaults.hub_cache.max_entries,
                ),
            },
        }
    }

    /// `host:port` string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = key, value = %value, "invalid value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:9876");
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8443"),
            ("HUB_CACHE_ENABLED", "false"),
            ("HUB_CACHE_MAX_ENTRIES", "16"),
        ]));
        assert_eq!(config.bind_address(), "127.0.0.1:8443");
        assert!(!config.hub_cache.enabled);
        assert_eq!(config.hub_cache.max_entries, 16);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[("PORT", "eighty"), ("HUB_CACHE_ENABLED", "yes")]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.hub_cache.enabled);
    }
}
