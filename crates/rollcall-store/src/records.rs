//! Ledger record types

use chrono::{DateTime, Utc};
use rollcall_api::{
    AttendanceStatus, AttendanceView, GeoPoint, SessionView, StudentAttendanceView,
};
use rollcall_util::{PrincipalId, SessionId, StudentId};
use serde::{Deserialize, Serialize};

/// Token fields as persisted on a session row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A scheduled class session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub course_name: String,
    pub description: Option<String>,
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub late_threshold_minutes: u32,
    pub is_active: bool,
    pub created_by: PrincipalId,
    pub token: TokenRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_owned_by(&self, principal: &PrincipalId) -> bool {
        &self.created_by == principal
    }

    pub fn to_view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            course_name: self.course_name.clone(),
            description: self.description.clone(),
            center: self.center,
            radius_meters: self.radius_meters,
            start_time: self.start_time,
            end_time: self.end_time,
            late_threshold_minutes: self.late_threshold_minutes,
            is_active: self.is_active,
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            token_expires_at: self.token.expires_at,
        }
    }
}

/// One committed attendance row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    /// Row ID, assigned by the store on insert
    pub id: i64,
    pub session_id: SessionId,
    pub student_id: StudentId,
    pub student_name: String,
    pub location: GeoPoint,
    pub distance_meters: f64,
    /// Empty when the device did not report one
    pub device_fingerprint: String,
    pub status: AttendanceStatus,
    pub origin_hint: String,
    pub created_at: DateTime<Utc>,
}

impl Attendance {
    pub fn to_view(&self) -> AttendanceView {
        AttendanceView {
            id: self.id,
            session_id: self.session_id,
            student_id: self.student_id.clone(),
            student_name: self.student_name.clone(),
            location: self.location,
            distance_meters: self.distance_meters,
            device_fingerprint: self.device_fingerprint.clone(),
            status: self.status,
            origin_hint: self.origin_hint.clone(),
            created_at: self.created_at,
        }
    }
}

/// An attendance row joined with its session, archived or not
#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub attendance: Attendance,
    pub course_name: String,
    pub description: Option<String>,
    pub session_start: DateTime<Utc>,
}

impl StudentRecord {
    pub fn to_view(&self) -> StudentAttendanceView {
        StudentAttendanceView {
            record: self.attendance.to_view(),
            course_name: self.course_name.clone(),
            description: self.description.clone(),
            session_start: self.session_start,
        }
    }
}

/// Result of the atomic insert-if-absent on (session, student)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { id: i64 },
    /// A row for this (session, student) already existed; nothing was written
    Duplicate,
}
