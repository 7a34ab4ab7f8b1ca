//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Scan token settings
    #[serde(default)]
    pub tokens: RawTokenConfig,

    /// Defaults and limits applied when sessions are scheduled
    #[serde(default)]
    pub sessions: RawSessionDefaults,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path (default: `$XDG_RUNTIME_DIR/rollcall/rollcalld.sock`)
    pub socket_path: Option<PathBuf>,

    /// Data directory holding the ledger database
    pub data_dir: Option<PathBuf>,
}

/// Scan token settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTokenConfig {
    /// Lifetime of a freshly issued token
    pub ttl_seconds: Option<u64>,
}

/// Session defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSessionDefaults {
    /// Geofence radius used when a session does not specify one
    pub default_radius_meters: Option<f64>,

    /// Late threshold used when a session does not specify one
    pub default_late_threshold_minutes: Option<u32>,

    /// Upper bound on any session's radius
    pub max_radius_meters: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [service]
            socket_path = "/run/rollcall/rollcalld.sock"
            data_dir = "/var/lib/rollcall"

            [tokens]
            ttl_seconds = 90

            [sessions]
            default_radius_meters = 75.0
            default_late_threshold_minutes = 10
            max_radius_meters = 1000.0
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tokens.ttl_seconds, Some(90));
        assert_eq!(config.sessions.default_radius_meters, Some(75.0));
        assert_eq!(
            config.service.data_dir,
            Some(PathBuf::from("/var/lib/rollcall"))
        );
    }

    #[test]
    fn sections_are_optional() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.service.socket_path.is_none());
        assert!(config.tokens.ttl_seconds.is_none());
        assert!(config.sessions.max_radius_meters.is_none());
    }
}
