//! Audit event types

use chrono::{DateTime, Utc};
use rollcall_api::AttendanceStatus;
use rollcall_util::{PrincipalId, SessionId, StudentId};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// Configuration loaded
    ConfigLoaded { token_ttl_secs: u64 },

    /// Session scheduled
    SessionCreated {
        session_id: SessionId,
        owner: PrincipalId,
        course_name: String,
    },

    /// Scan token replaced
    TokenRotated {
        session_id: SessionId,
        expires_at: DateTime<Utc>,
        /// Triggered by a stale read rather than an owner request
        lazy: bool,
    },

    /// Kill switch flipped
    SessionActiveChanged { session_id: SessionId, is_active: bool },

    /// Geofence or time window changed
    SessionWindowUpdated { session_id: SessionId },

    /// Session deleted by its owner
    SessionArchived { session_id: SessionId },

    /// Attendance row committed
    AttendanceRecorded {
        session_id: SessionId,
        student_id: StudentId,
        status: AttendanceStatus,
        distance_meters: f64,
    },

    /// Attempt rejected without writing a record
    AttemptRejected {
        session_id: Option<SessionId>,
        student_id: StudentId,
        reason: String,
    },

    /// Client connected
    ClientConnected { client_id: String, uid: Option<u32> },

    /// Client disconnected
    ClientDisconnected { client_id: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: rollcall_util::now(),
            event,
        }
    }
}
