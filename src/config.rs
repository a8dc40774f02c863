//! Environment-driven configuration.
//!
//! Values come from the process environment after loading an optional
//! `.env` file. A missing Firebase key leaves the remote unconfigured, and
//! the stores then run on the built-in sample data.

use crate::error::{NexusError, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
/// Shortest poll period a subscription will use
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_API_KEY: &str = "FIREBASE_API_KEY";
const ENV_AUTH_DOMAIN: &str = "FIREBASE_AUTH_DOMAIN";
const ENV_PROJECT_ID: &str = "FIREBASE_PROJECT_ID";
const ENV_STORAGE_BUCKET: &str = "FIREBASE_STORAGE_BUCKET";
const ENV_MESSAGING_SENDER_ID: &str = "FIREBASE_MESSAGING_SENDER_ID";
const ENV_APP_ID: &str = "FIREBASE_APP_ID";
const ENV_CACHE_DIR: &str = "NEXUS_CACHE_DIR";
const ENV_POLL_INTERVAL: &str = "NEXUS_POLL_INTERVAL_SECS";
const ENV_LOG: &str = "NEXUS_LOG";

/// Credentials for the hosted document store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

impl RemoteConfig {
    /// Reads the Firebase keys from the environment, loading `.env` first
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the Firebase keys through an arbitrary lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        Self {
            api_key: read(ENV_API_KEY),
            auth_domain: read(ENV_AUTH_DOMAIN),
            project_id: read(ENV_PROJECT_ID),
            storage_bucket: read(ENV_STORAGE_BUCKET),
            messaging_sender_id: read(ENV_MESSAGING_SENDER_ID),
            app_id: read(ENV_APP_ID),
        }
    }

    /// Names of the required keys that are empty
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            (ENV_API_KEY, &self.api_key),
            (ENV_AUTH_DOMAIN, &self.auth_domain),
            (ENV_PROJECT_ID, &self.project_id),
            (ENV_STORAGE_BUCKET, &self.storage_bucket),
            (ENV_MESSAGING_SENDER_ID, &self.messaging_sender_id),
            (ENV_APP_ID, &self.app_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key)
        .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing_keys().is_empty()
    }
}

/// Everything the crate reads from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub cache_dir: Option<PathBuf>,
    pub poll_interval: Duration,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            cache_dir: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let remote = RemoteConfig::from_lookup(&lookup);
        let missing = remote.missing_keys();
        if !missing.is_empty() {
            warn!(missing = ?missing, "remote store not configured, using sample data");
        }

        let poll_interval = match lookup(ENV_POLL_INTERVAL).filter(|v| !v.trim().is_empty()) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    NexusError::ConfigError(format!("{} must be a whole number, got {:?}", ENV_POLL_INTERVAL, raw))
                })?;
                if secs == 0 {
                    return Err(NexusError::ConfigError(format!(
                        "{} must be greater than zero",
                        ENV_POLL_INTERVAL
                    )));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            remote,
            cache_dir: lookup(ENV_CACHE_DIR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            poll_interval,
            log_level: lookup(ENV_LOG)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn full_remote() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_API_KEY, "key"),
            (ENV_AUTH_DOMAIN, "demo.firebaseapp.com"),
            (ENV_PROJECT_ID, "demo"),
            (ENV_STORAGE_BUCKET, "demo.appspot.com"),
            (ENV_MESSAGING_SENDER_ID, "123"),
            (ENV_APP_ID, "1:123:web:abc"),
        ]
    }

    #[test]
    fn test_remote_configured_when_all_keys_present() {
        let config = RemoteConfig::from_lookup(lookup_from(&full_remote()));
        assert!(config.is_configured());
        assert_eq!(config.project_id, "demo");
    }

    #[test]
    fn test_missing_and_blank_keys_reported() {
        let mut pairs = full_remote();
        pairs.retain(|(k, _)| *k != ENV_APP_ID);
        pairs.push((ENV_API_KEY, "   "));

        let config = RemoteConfig::from_lookup(lookup_from(&pairs));
        assert!(!config.is_configured());
        assert_eq!(config.missing_keys(), vec![ENV_API_KEY, ENV_APP_ID]);
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_app_config_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_CACHE_DIR, "/tmp/nexus"),
            (ENV_POLL_INTERVAL, "30"),
            (ENV_LOG, "debug"),
        ]))
        .unwrap();

        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/nexus")));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_poll_interval_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[(ENV_POLL_INTERVAL, "soon")]));
        assert!(matches!(result, Err(NexusError::ConfigError(_))));

        let result = AppConfig::from_lookup(lookup_from(&[(ENV_POLL_INTERVAL, "0")]));
        assert!(matches!(result, Err(NexusError::ConfigError(_))));
    }
}
