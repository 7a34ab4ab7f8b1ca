//! Shared types for the rollcall API

use chrono::{DateTime, Utc};
use rollcall_util::{PrincipalId, SessionId, StudentId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of an admitted (recorded) attendance attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    /// Outside the geofence. Still recorded for audit.
    Invalid,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Invalid => "INVALID",
        }
    }

    /// Whether this status counts towards attendance
    pub fn is_admitted(&self) -> bool {
        !matches!(self, AttendanceStatus::Invalid)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRESENT" => Ok(AttendanceStatus::Present),
            "LATE" => Ok(AttendanceStatus::Late),
            "INVALID" => Ok(AttendanceStatus::Invalid),
            other => Err(format!("Unknown attendance status: {}", other)),
        }
    }
}

/// WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Parameters for scheduling a new session.
///
/// `radius_meters` and `late_threshold_minutes` fall back to the configured
/// defaults when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub course_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub center: GeoPoint,
    #[serde(default)]
    pub radius_meters: Option<f64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub late_threshold_minutes: Option<u32>,
}

/// Partial update of a session's geofence and time window.
/// Fields left as `None` are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowUpdate {
    #[serde(default)]
    pub center: Option<GeoPoint>,
    #[serde(default)]
    pub radius_meters: Option<f64>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub late_threshold_minutes: Option<u32>,
    /// `Some("")` clears the description
    #[serde(default)]
    pub description: Option<String>,
}

impl WindowUpdate {
    pub fn is_empty(&self) -> bool {
        self.center.is_none()
            && self.radius_meters.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.late_threshold_minutes.is_none()
            && self.description.is_none()
    }
}

/// View of a session for its owner. Never carries the live token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub course_name: String,
    pub description: Option<String>,
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub late_threshold_minutes: u32,
    pub is_active: bool,
    pub created_by: PrincipalId,
    pub created_at: DateTime<Utc>,
    pub token_expires_at: DateTime<Utc>,
}

/// A live scan token, as handed to the session owner for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenView {
    pub session_id: SessionId,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// One attendance attempt as submitted by a student device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceAttempt {
    pub token: String,
    /// When present, must match the session the token belongs to
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub student_id: StudentId,
    pub student_name: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub device_fingerprint: Option<String>,
    /// Network origin reported by the caller (e.g. client IP)
    #[serde(default)]
    pub origin_hint: Option<String>,
}

/// A recorded attendance row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceView {
    pub id: i64,
    pub session_id: SessionId,
    pub student_id: StudentId,
    pub student_name: String,
    pub location: GeoPoint,
    pub distance_meters: f64,
    pub device_fingerprint: String,
    pub status: AttendanceStatus,
    pub origin_hint: String,
    pub created_at: DateTime<Utc>,
}

/// A row in a student's history, with the session it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAttendanceView {
    #[serde(flatten)]
    pub record: AttendanceView,
    pub course_name: String,
    pub description: Option<String>,
    pub session_start: DateTime<Utc>,
}

/// Per-student attendance counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total: usize,
    pub present: usize,
    pub late: usize,
    pub invalid: usize,
}

impl AttendanceStats {
    pub fn record(&mut self, status: AttendanceStatus) {
        self.total += 1;
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Invalid => self.invalid += 1,
        }
    }
}

impl<'a> FromIterator<&'a AttendanceStatus> for AttendanceStats {
    fn from_iter<I: IntoIterator<Item = &'a AttendanceStatus>>(iter: I) -> Self {
        let mut stats = AttendanceStats::default();
        for status in iter {
            stats.record(*status);
        }
        stats
    }
}

/// Result returned to the student after a recorded attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResult {
    pub status: AttendanceStatus,
    pub distance_meters: f64,
    pub message: String,
    pub attendance_id: i64,
    /// Other records in this session sharing the device fingerprint.
    /// Audit signal only; admission is not blocked on it.
    pub shared_device_count: usize,
}

/// Attendance rows in one session that share a device fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCollision {
    pub device_fingerprint: String,
    pub records: Vec<AttendanceView>,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub store_healthy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_uppercase_wire_names() {
        let json = serde_json::to_string(&AttendanceStatus::Late).unwrap();
        assert_eq!(json, "\"LATE\"");

        let parsed: AttendanceStatus = serde_json::from_str("\"INVALID\"").unwrap();
        assert_eq!(parsed, AttendanceStatus::Invalid);
        assert_eq!("PRESENT".parse::<AttendanceStatus>(), Ok(AttendanceStatus::Present));
        assert!("present".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn geo_point_bounds() {
        assert!(GeoPoint::new(12.9716, 77.5946).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.1).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn stats_count_each_status() {
        let statuses = [
            AttendanceStatus::Present,
            AttendanceStatus::Late,
            AttendanceStatus::Present,
            AttendanceStatus::Invalid,
        ];
        let stats: AttendanceStats = statuses.iter().collect();
        assert_eq!(
            stats,
            AttendanceStats {
                total: 4,
                present: 2,
                late: 1,
                invalid: 1,
            }
        );
    }

    #[test]
    fn attempt_optional_fields_default() {
        let json = r#"{
            "token": "abc",
            "student_id": "CS2021-041",
            "student_name": "Asha Rao",
            "location": { "latitude": 12.9716, "longitude": 77.5946 }
        }"#;
        let attempt: AttendanceAttempt = serde_json::from_str(json).unwrap();
        assert!(attempt.session_id.is_none());
        assert!(attempt.device_fingerprint.is_none());
        assert!(attempt.origin_hint.is_none());
    }
}
