//! Event types for rollcalld -> client streaming

use chrono::{DateTime, Utc};
use rollcall_util::{SessionId, StudentId};
use serde::{Deserialize, Serialize};

use crate::{API_VERSION, AttendanceStatus};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: rollcall_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients.
///
/// Events never carry scan tokens; a display client reacts to
/// `TokenRotated` by asking for the live token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    SessionCreated {
        session_id: SessionId,
        course_name: String,
    },

    TokenRotated {
        session_id: SessionId,
        expires_at: DateTime<Utc>,
        /// True when the rotation was triggered by a stale read
        lazy: bool,
    },

    SessionActiveChanged {
        session_id: SessionId,
        is_active: bool,
    },

    SessionUpdated {
        session_id: SessionId,
    },

    SessionArchived {
        session_id: SessionId,
    },

    AttendanceRecorded {
        session_id: SessionId,
        student_id: StudentId,
        status: AttendanceStatus,
    },

    /// Service is shutting down
    Shutdown,
}
