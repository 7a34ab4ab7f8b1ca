//! Command types for the rollcalld protocol

use rollcall_util::{ClientId, PrincipalId, SessionId, StudentId};
use serde::{Deserialize, Serialize};

use crate::{
    API_VERSION, AttendanceAttempt, AttendanceStats, AttendanceStatus, AttendanceView,
    DeviceCollision, HealthStatus, NewSession, SessionView, StudentAttendanceView, SubmitResult,
    TokenView, WindowUpdate,
};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    /// Status of the existing record, for `already_recorded`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_status: Option<AttendanceStatus>,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            prior_status: None,
        }
    }

    pub fn with_prior_status(mut self, status: AttendanceStatus) -> Self {
        self.prior_status = Some(status);
        self
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    NotFound,
    ExpiredOrInvalidToken,
    SessionInactive,
    AlreadyRecorded,
    Unauthorized,
    TransientStoreError,
    InternalError,
}

impl ErrorCode {
    /// Only transient store failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::TransientStoreError)
    }
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Schedule a new session owned by `owner`
    CreateSession {
        owner: PrincipalId,
        session: NewSession,
    },

    /// Fetch one session (owner only)
    GetSession {
        session_id: SessionId,
        owner: PrincipalId,
    },

    /// List the owner's sessions, newest first
    ListSessions { owner: PrincipalId },

    /// Current scan token, rotated first if stale
    GetLiveToken {
        session_id: SessionId,
        owner: PrincipalId,
    },

    /// Force a token rotation
    RotateToken {
        session_id: SessionId,
        owner: PrincipalId,
    },

    /// Kill switch for admissions
    SetSessionActive {
        session_id: SessionId,
        owner: PrincipalId,
        active: bool,
    },

    /// Change the geofence or time window
    UpdateSessionWindow {
        session_id: SessionId,
        owner: PrincipalId,
        update: WindowUpdate,
    },

    /// Archive a session; recorded attendance is kept
    DeleteSession {
        session_id: SessionId,
        owner: PrincipalId,
    },

    /// Submit an attendance attempt
    SubmitAttempt(AttendanceAttempt),

    /// All records for a session (owner only)
    GetAttendanceForSession {
        session_id: SessionId,
        owner: PrincipalId,
    },

    /// A student's history with summary counts
    GetAttendanceForStudent { student_id: StudentId },

    /// Records sharing a device fingerprint within a session (owner only)
    GetDeviceCollisions {
        session_id: SessionId,
        owner: PrincipalId,
    },

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Unsubscribe from events
    UnsubscribeEvents,

    /// Get health status
    GetHealth,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    Session(SessionView),
    Sessions {
        sessions: Vec<SessionView>,
    },
    Token(TokenView),
    ActiveChanged {
        session_id: SessionId,
        is_active: bool,
    },
    Deleted {
        session_id: SessionId,
    },
    Submitted(SubmitResult),
    SessionAttendance {
        records: Vec<AttendanceView>,
    },
    StudentAttendance {
        records: Vec<StudentAttendanceView>,
        stats: AttendanceStats,
    },
    DeviceCollisions {
        collisions: Vec<DeviceCollision>,
    },
    Subscribed {
        client_id: ClientId,
    },
    Unsubscribed,
    Health(HealthStatus),
    Pong,
}

/// Client connection info (set by IPC layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: ClientId,
    /// Unix UID if available
    pub uid: Option<u32>,
}

impl ClientInfo {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            uid: None,
        }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }
}
