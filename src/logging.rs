//! Process-wide tracing setup.
//!
//! `init_logging` installs a formatted `tracing` subscriber filtered by
//! level. It can be called repeatedly with the same level; switching to a
//! different level after the first call is rejected.

use crate::error::{NexusError, Result};
use std::sync::OnceLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

static ACTIVE_LEVEL: OnceLock<String> = OnceLock::new();

/// Installs the global subscriber with the given filter directive
pub fn init_logging(level: &str) -> Result<()> {
    let level = level.trim().to_ascii_lowercase();
    let filter = EnvFilter::try_new(&level)
        .map_err(|err| NexusError::ConfigError(format!("invalid log level `{}`: {}", level, err)))?;

    let active = ACTIVE_LEVEL.get_or_init(|| {
        // Another subscriber may already be installed by the host; keep it.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
        info!(level = %level, version = env!("CARGO_PKG_VERSION"), "logging initialized");
        level.clone()
    });

    if *active != level {
        return Err(NexusError::ConfigError(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            active, level
        )));
    }
    Ok(())
}

/// Level passed to the first successful `init_logging` call
pub fn active_level() -> Option<&'static str> {
    ACTIVE_LEVEL.get().map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_and_rejects_level_switch() {
        init_logging("debug").unwrap();
        init_logging("DEBUG").unwrap();
        assert_eq!(active_level(), Some("debug"));

        assert!(matches!(init_logging("warn"), Err(NexusError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_directive_rejected() {
        assert!(init_logging("nexus_core=loud").is_err());
    }
}
