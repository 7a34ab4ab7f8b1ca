//! Clock utilities for rollcall
//!
//! All instants handled by rollcall are absolute UTC instants. Engine
//! operations take `now` as an argument; the service obtains it from [`now`].
//!
//! # Mock Time for Development
//!
//! In debug builds, the `ROLLCALL_MOCK_TIME` environment variable can be set
//! to shift the service clock. The mock clock starts at the given UTC instant
//! and advances at the real rate, which makes it possible to exercise late
//! thresholds and token expiry by hand.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-09-01 09:05:00`)
//!
//! ```bash
//! ROLLCALL_MOCK_TIME="2025-09-01 09:05:00" rollcalld
//! ```

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "ROLLCALL_MOCK_TIME";

/// Expected format of [`MOCK_TIME_ENV_VAR`]
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, captured once per process.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // wraps Utc::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            match parse_mock_time(&mock_time_str) {
                Some(mock_dt) => {
                    let offset = mock_dt.signed_duration_since(Utc::now());
                    tracing::info!(
                        mock_time = %mock_time_str,
                        offset_secs = offset.num_seconds(),
                        "Mock time enabled"
                    );
                    Some(offset)
                }
                None => {
                    tracing::warn!(
                        mock_time = %mock_time_str,
                        expected_format = MOCK_TIME_FORMAT,
                        "Invalid mock time format"
                    );
                    None
                }
            }
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Parse a mock time string as a UTC instant.
pub fn parse_mock_time(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, MOCK_TIME_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current instant, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // this is the wrapper that provides mock time support
pub fn now() -> DateTime<Utc> {
    let real_now = Utc::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Milliseconds since the Unix epoch, the storage representation of instants.
pub fn to_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Inverse of [`to_millis`]. Out-of-range values clamp to the epoch.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Convert a std duration into a chrono duration, saturating on overflow.
pub fn chrono_duration(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

/// Format an instant for logs and CLI output.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_millis_round_trip_keeps_millisecond_precision() {
        let dt = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(from_millis(to_millis(&dt)), dt);
    }

    #[test]
    fn test_chrono_duration_saturates() {
        assert_eq!(
            chrono_duration(Duration::from_secs(90)),
            chrono::Duration::seconds(90)
        );
        assert_eq!(chrono_duration(Duration::MAX), chrono::Duration::MAX);
    }

    #[test]
    fn test_format_instant() {
        let dt = Utc.with_ymd_and_hms(2025, 9, 1, 14, 30, 45).unwrap();
        assert_eq!(format_instant(&dt), "2025-09-01 14:30:45 UTC");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[test]
    fn test_parse_mock_time() {
        let parsed = parse_mock_time("2025-09-01 09:05:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 9, 1, 9, 5, 0).unwrap());

        for invalid in ["2025-09-01", "09:05:00", "2025-09-01T09:05:00", "", "soon"] {
            assert!(parse_mock_time(invalid).is_none(), "{invalid:?} should not parse");
        }
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_now_advances() {
        let t1 = now();
        std::thread::sleep(Duration::from_millis(20));
        let t2 = now();
        assert!(t2 > t1, "Time should advance forward");
    }
}
