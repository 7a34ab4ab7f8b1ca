//! Core events emitted by the engine

use chrono::{DateTime, Utc};
use rollcall_api::AttendanceStatus;
use rollcall_util::{SessionId, StudentId};
use std::sync::Mutex;

/// Events emitted by the core engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Session scheduled
    SessionCreated {
        session_id: SessionId,
        course_name: String,
    },

    /// A new token replaced the previous one
    TokenRotated {
        session_id: SessionId,
        expires_at: DateTime<Utc>,
        lazy: bool,
    },

    /// Owner toggled the kill switch
    SessionActiveChanged {
        session_id: SessionId,
        is_active: bool,
    },

    /// Geofence, window or description changed
    SessionUpdated {
        session_id: SessionId,
    },

    /// Owner deleted the session
    SessionArchived {
        session_id: SessionId,
    },

    /// An attendance row was committed
    AttendanceRecorded {
        session_id: SessionId,
        student_id: StudentId,
        status: AttendanceStatus,
    },
}

/// Events waiting to be picked up by the service.
///
/// Failed requests can still produce events (a lazy rotation during a
/// rejected scan), so events are queued rather than returned.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Mutex<Vec<CoreEvent>>,
}

impl EventQueue {
    pub fn push(&self, event: CoreEvent) {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    /// Take every queued event, oldest first
    pub fn drain(&self) -> Vec<CoreEvent> {
        std::mem::take(
            &mut *self
                .pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}
