//! Store trait definitions

use chrono::{DateTime, Utc};
use rollcall_util::{PrincipalId, SessionId, StudentId};

use crate::{
    Attendance, AuditEvent, InsertOutcome, Session, StoreResult, StudentRecord, TokenRecord,
};

/// The attendance ledger.
///
/// Implementations must provide two atomic primitives the engine relies on:
/// [`Store::swap_token`] (conditional update keyed on the old token) and
/// [`Store::insert_attendance`] (insert unless a row for the same
/// session and student exists).
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Sessions

    /// Insert a newly scheduled session
    fn insert_session(&self, session: &Session) -> StoreResult<()>;

    /// Get a session by ID. Archived sessions are not returned.
    fn get_session(&self, id: &SessionId) -> StoreResult<Option<Session>>;

    /// Find the session whose current token is `token`, regardless of expiry.
    /// Archived sessions are not returned.
    fn find_session_by_token(&self, token: &str) -> StoreResult<Option<Session>>;

    /// List an owner's non-archived sessions, newest first
    fn list_sessions_by_owner(&self, owner: &PrincipalId) -> StoreResult<Vec<Session>>;

    /// Persist the schedule of a session (window, geofence, late threshold,
    /// description). The active flag and token are left untouched.
    /// Returns false if the session is gone.
    fn update_session(&self, session: &Session) -> StoreResult<bool>;

    /// Set only the active flag. Returns false if the session is gone.
    fn set_session_active(
        &self,
        id: &SessionId,
        active: bool,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Replace the session's token only if its current value is `expected`.
    /// Returns false when another rotation got there first.
    fn swap_token(
        &self,
        id: &SessionId,
        expected: &str,
        next: &TokenRecord,
    ) -> StoreResult<bool>;

    /// Mark a session archived. Returns false if it was already gone.
    fn archive_session(&self, id: &SessionId, at: DateTime<Utc>) -> StoreResult<bool>;

    // Attendance

    /// Insert unless a record for (session, student) already exists.
    /// The `id` field of `record` is ignored.
    fn insert_attendance(&self, record: &Attendance) -> StoreResult<InsertOutcome>;

    /// Get the record for a (session, student) pair
    fn get_attendance(
        &self,
        session_id: &SessionId,
        student_id: &StudentId,
    ) -> StoreResult<Option<Attendance>>;

    /// All records for a session, newest first
    fn list_attendance_for_session(&self, session_id: &SessionId) -> StoreResult<Vec<Attendance>>;

    /// All records for a student across sessions, newest first, each with
    /// its session's course details. Archived sessions are included.
    fn list_attendance_for_student(
        &self,
        student_id: &StudentId,
    ) -> StoreResult<Vec<StudentRecord>>;

    /// Records in a session reported from the given device fingerprint
    fn list_attendance_for_device(
        &self,
        session_id: &SessionId,
        device_fingerprint: &str,
    ) -> StoreResult<Vec<Attendance>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
