//! Engine configuration from the environment
//!
//! Values come from process environment variables, optionally seeded from a
//! `.env` file. Unset variables take their defaults; set but invalid values
//! are configuration errors, never silently replaced.

use artisync_core::errors::{ExError, ExErrorKind};
use artisync_core::logging_facility::Profile;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_SOURCE_ROOTS: &str = "ARTISYNC_SOURCE_ROOTS";
pub const ENV_SYNC_INTERVAL_SECS: &str = "ARTISYNC_SYNC_INTERVAL_SECS";
pub const ENV_PASS_TIMEOUT_SECS: &str = "ARTISYNC_PASS_TIMEOUT_SECS";
pub const ENV_SYNC_ENABLED: &str = "ARTISYNC_SYNC_ENABLED";
pub const ENV_ACTOR: &str = "ARTISYNC_ACTOR";
pub const ENV_DB_PATH: &str = "ARTISYNC_DB_PATH";
pub const ENV_LOG: &str = "ARTISYNC_LOG";

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_PASS_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_ACTOR: &str = "system";
pub const DEFAULT_DB_PATH: &str = ".artisync/state.db";

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Directories scanned for artifact sources, in priority order
    pub source_roots: Vec<PathBuf>,
    pub sync_interval: Duration,
    pub pass_timeout: Duration,
    pub sync_enabled: bool,
    /// Audit user stamped on every state write
    pub actor: String,
    pub db_path: PathBuf,
    pub log_profile: Profile,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_roots: Vec::new(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            pass_timeout: DEFAULT_PASS_TIMEOUT,
            sync_enabled: true,
            actor: DEFAULT_ACTOR.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_profile: Profile::Development,
        }
    }
}

impl SyncConfig {
    /// Load `.env` if present, then read the process environment
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error naming the first invalid variable.
    pub fn from_env() -> Result<Self, ExError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error naming the first invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ExError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(roots) = get(ENV_SOURCE_ROOTS) {
            config.source_roots = std::env::split_paths(&roots).collect();
        }
        if let Some(v) = get(ENV_SYNC_INTERVAL_SECS) {
            config.sync_interval = parse_secs(ENV_SYNC_INTERVAL_SECS, &v)?;
        }
        if let Some(v) = get(ENV_PASS_TIMEOUT_SECS) {
            config.pass_timeout = parse_secs(ENV_PASS_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = get(ENV_SYNC_ENABLED) {
            config.sync_enabled = parse_bool(ENV_SYNC_ENABLED, &v)?;
        }
        if let Some(v) = get(ENV_ACTOR) {
            config.actor = v.trim().to_string();
        }
        if let Some(v) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_LOG) {
            config.log_profile = v
                .parse()
                .map_err(|reason: String| invalid(ENV_LOG, &v, &reason))?;
        }

        Ok(config)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ExError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(invalid(key, value, "must be greater than zero")),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(invalid(key, value, &e.to_string())),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ExError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Configuration)
        .with_op("load_config")
        .with_message(format!("{}={:?} is invalid: {}", key, value, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = SyncConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.sync_interval, Duration::from_secs(10));
        assert_eq!(config.pass_timeout, Duration::from_secs(300));
        assert!(config.sync_enabled);
    }

    #[test]
    fn test_all_variables_read() {
        let roots = std::env::join_paths(["/srv/a", "/srv/b"]).unwrap();
        let roots = roots.to_string_lossy().to_string();
        let config = SyncConfig::from_lookup(lookup(&[
            (ENV_SOURCE_ROOTS, roots.as_str()),
            (ENV_SYNC_INTERVAL_SECS, "30"),
            (ENV_PASS_TIMEOUT_SECS, "60"),
            (ENV_SYNC_ENABLED, "off"),
            (ENV_ACTOR, "deployer"),
            (ENV_DB_PATH, "/var/lib/artisync.db"),
            (ENV_LOG, "production"),
        ]))
        .unwrap();

        assert_eq!(
            config.source_roots,
            vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")]
        );
        assert_eq!(config.sync_interval, Duration::from_secs(30));
        assert_eq!(config.pass_timeout, Duration::from_secs(60));
        assert!(!config.sync_enabled);
        assert_eq!(config.actor, "deployer");
        assert_eq!(config.db_path, PathBuf::from("/var/lib/artisync.db"));
        assert_eq!(config.log_profile, Profile::Production);
    }

    #[test]
    fn test_invalid_interval_is_error() {
        let err = SyncConfig::from_lookup(lookup(&[(ENV_SYNC_INTERVAL_SECS, "soon")])).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Configuration);
        assert!(err.message().contains(ENV_SYNC_INTERVAL_SECS));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        assert!(SyncConfig::from_lookup(lookup(&[(ENV_PASS_TIMEOUT_SECS, "0")])).is_err());
    }

    #[test]
    fn test_invalid_flag_and_profile_are_errors() {
        assert!(SyncConfig::from_lookup(lookup(&[(ENV_SYNC_ENABLED, "maybe")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[(ENV_LOG, "chatty")])).is_err());
    }
}
