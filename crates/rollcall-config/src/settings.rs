//! Validated settings structures

use crate::schema::{RawConfig, RawServiceConfig};
use rollcall_util::{default_data_dir, default_socket_path};
use std::path::PathBuf;
use std::time::Duration;

/// Token lifetime when `[tokens] ttl_seconds` is absent
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 120;

/// Geofence radius when neither the session nor the config names one
pub const DEFAULT_RADIUS_METERS: f64 = 50.0;

/// Late threshold when neither the session nor the config names one
pub const DEFAULT_LATE_THRESHOLD_MINUTES: u32 = 15;

/// Upper bound on session radius when the config names none
pub const DEFAULT_MAX_RADIUS_METERS: f64 = 5000.0;

/// Validated settings ready for use by the service and the engine
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub service: ServiceConfig,
    pub admission: AdmissionConfig,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let token_ttl = Duration::from_secs(
            raw.tokens
                .ttl_seconds
                .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS),
        );

        Self {
            service: ServiceConfig::from_raw(raw.service),
            admission: AdmissionConfig {
                token_ttl,
                default_radius_meters: raw
                    .sessions
                    .default_radius_meters
                    .unwrap_or(DEFAULT_RADIUS_METERS),
                default_late_threshold_minutes: raw
                    .sessions
                    .default_late_threshold_minutes
                    .unwrap_or(DEFAULT_LATE_THRESHOLD_MINUTES),
                max_radius_meters: raw
                    .sessions
                    .max_radius_meters
                    .unwrap_or(DEFAULT_MAX_RADIUS_METERS),
            },
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            socket_path: raw.socket_path.unwrap_or_else(default_socket_path),
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
        }
    }

    /// Path of the SQLite ledger inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("rollcall.db")
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            data_dir: default_data_dir(),
        }
    }
}

/// Knobs consumed by the admission engine
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionConfig {
    pub token_ttl: Duration,
    pub default_radius_meters: f64,
    pub default_late_threshold_minutes: u32,
    pub max_radius_meters: f64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECONDS),
            default_radius_meters: DEFAULT_RADIUS_METERS,
            default_late_threshold_minutes: DEFAULT_LATE_THRESHOLD_MINUTES,
            max_radius_meters: DEFAULT_MAX_RADIUS_METERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let raw: RawConfig = toml::from_str("config_version = 1").unwrap();
        let settings = Settings::from_raw(raw);
        assert_eq!(settings.admission, AdmissionConfig::default());
        assert_eq!(settings.admission.token_ttl, Duration::from_secs(120));
    }

    #[test]
    fn database_lives_in_data_dir() {
        let service = ServiceConfig {
            socket_path: PathBuf::from("/tmp/rollcalld.sock"),
            data_dir: PathBuf::from("/var/lib/rollcall"),
        };
        assert_eq!(
            service.database_path(),
            PathBuf::from("/var/lib/rollcall/rollcall.db")
        );
    }
}
