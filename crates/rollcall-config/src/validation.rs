//! Configuration validation

use crate::schema::RawConfig;
use crate::settings::{DEFAULT_MAX_RADIUS_METERS, DEFAULT_RADIUS_METERS};
use thiserror::Error;

/// Longest token lifetime accepted; a scan token is meant to be short-lived
pub const MAX_TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("[tokens] ttl_seconds must be between 1 and {max}, got {value}")]
    InvalidTokenTtl { value: u64, max: u64 },

    #[error("[sessions] {field} must be a positive number of meters, got {value}")]
    InvalidRadius { field: &'static str, value: f64 },

    #[error("[sessions] default_radius_meters {radius} exceeds max_radius_meters {max}")]
    DefaultRadiusExceedsMax { radius: f64, max: f64 },

    #[error("[sessions] default_late_threshold_minutes must be at most {max}, got {value}")]
    InvalidLateThreshold { value: u32, max: u32 },

    #[error("[service] {field} cannot be empty")]
    EmptyPath { field: &'static str },
}

/// Largest accepted late threshold (one day)
pub const MAX_LATE_THRESHOLD_MINUTES: u32 = 24 * 60;

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(ttl) = config.tokens.ttl_seconds
        && (ttl == 0 || ttl > MAX_TOKEN_TTL_SECONDS)
    {
        errors.push(ValidationError::InvalidTokenTtl {
            value: ttl,
            max: MAX_TOKEN_TTL_SECONDS,
        });
    }

    let sessions = &config.sessions;
    for (field, value) in [
        ("default_radius_meters", sessions.default_radius_meters),
        ("max_radius_meters", sessions.max_radius_meters),
    ] {
        if let Some(value) = value
            && !is_positive_meters(value)
        {
            errors.push(ValidationError::InvalidRadius { field, value });
        }
    }

    let radius = sessions.default_radius_meters.unwrap_or(DEFAULT_RADIUS_METERS);
    let max = sessions.max_radius_meters.unwrap_or(DEFAULT_MAX_RADIUS_METERS);
    if is_positive_meters(radius) && is_positive_meters(max) && radius > max {
        errors.push(ValidationError::DefaultRadiusExceedsMax { radius, max });
    }

    if let Some(threshold) = sessions.default_late_threshold_minutes
        && threshold > MAX_LATE_THRESHOLD_MINUTES
    {
        errors.push(ValidationError::InvalidLateThreshold {
            value: threshold,
            max: MAX_LATE_THRESHOLD_MINUTES,
        });
    }

    if let Some(path) = &config.service.socket_path
        && path.as_os_str().is_empty()
    {
        errors.push(ValidationError::EmptyPath {
            field: "socket_path",
        });
    }
    if let Some(path) = &config.service.data_dir
        && path.as_os_str().is_empty()
    {
        errors.push(ValidationError::EmptyPath { field: "data_dir" });
    }

    errors
}

fn is_positive_meters(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
