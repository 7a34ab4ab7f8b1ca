//! SQLite-based store implementation

use chrono::{DateTime, Utc};
use rollcall_api::{AttendanceStatus, GeoPoint};
use rollcall_util::{PrincipalId, SessionId, StudentId, from_millis, to_millis};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Params, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    Attendance, AuditEvent, AuditEventType, InsertOutcome, Session, Store, StoreError,
    StoreResult, StudentRecord, TokenRecord,
};

const SESSION_COLUMNS: &str = "id, course_name, description, center_lat, center_lon, radius_m, \
     start_ms, end_ms, late_threshold_min, is_active, created_by, \
     token, token_issued_ms, token_expires_ms, created_ms, updated_ms, archived_ms";

const ATTENDANCE_COLUMNS: &str = "id, session_id, student_id, student_name, latitude, longitude, \
     distance_m, device_fingerprint, status, origin_hint, created_ms";

/// How long a writer waits on a locked database file before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Sessions; instants are stored as Unix milliseconds
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                course_name TEXT NOT NULL,
                description TEXT,
                center_lat REAL NOT NULL,
                center_lon REAL NOT NULL,
                radius_m REAL NOT NULL CHECK (radius_m > 0),
                start_ms INTEGER NOT NULL,
                end_ms INTEGER NOT NULL,
                late_threshold_min INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_by TEXT NOT NULL,
                token TEXT NOT NULL UNIQUE,
                token_issued_ms INTEGER NOT NULL,
                token_expires_ms INTEGER NOT NULL CHECK (token_expires_ms >= token_issued_ms),
                created_ms INTEGER NOT NULL,
                updated_ms INTEGER NOT NULL,
                archived_ms INTEGER
            );

            -- Attendance; one row per (session, student)
            CREATE TABLE IF NOT EXISTS attendance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                student_id TEXT NOT NULL,
                student_name TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                distance_m REAL NOT NULL CHECK (distance_m >= 0),
                device_fingerprint TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL CHECK (status IN ('PRESENT', 'LATE', 'INVALID')),
                origin_hint TEXT NOT NULL DEFAULT '',
                created_ms INTEGER NOT NULL,
                UNIQUE (session_id, student_id)
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            CREATE INDEX IF NOT EXISTS idx_sessions_owner ON sessions(created_by);
            CREATE INDEX IF NOT EXISTS idx_attendance_device ON attendance(session_id, device_fingerprint);
            CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student_id);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }

    fn query_sessions(
        conn: &Connection,
        where_clause: &str,
        params: impl Params,
    ) -> StoreResult<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE {where_clause} AND archived_ms IS NULL \
             ORDER BY created_ms DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params, session_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn query_attendance(
        conn: &Connection,
        where_clause: &str,
        params: impl Params,
    ) -> StoreResult<Vec<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE {where_clause} \
             ORDER BY created_ms DESC, id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params, attendance_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn conversion_error(
    column: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err.into())
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let id: String = row.get(0)?;
    let id: SessionId = id.parse().map_err(|e| conversion_error(0, e))?;
    let created_by: String = row.get(10)?;
    let archived_ms: Option<i64> = row.get(16)?;

    Ok(Session {
        id,
        course_name: row.get(1)?,
        description: row.get(2)?,
        center: GeoPoint::new(row.get(3)?, row.get(4)?),
        radius_meters: row.get(5)?,
        start_time: from_millis(row.get(6)?),
        end_time: from_millis(row.get(7)?),
        late_threshold_minutes: row.get(8)?,
        is_active: row.get(9)?,
        created_by: PrincipalId::new(created_by),
        token: TokenRecord {
            value: row.get(11)?,
            issued_at: from_millis(row.get(12)?),
            expires_at: from_millis(row.get(13)?),
        },
        created_at: from_millis(row.get(14)?),
        updated_at: from_millis(row.get(15)?),
        archived_at: archived_ms.map(from_millis),
    })
}

fn attendance_from_row(row: &Row<'_>) -> rusqlite::Result<Attendance> {
    let session_id: String = row.get(1)?;
    let session_id: SessionId = session_id.parse().map_err(|e| conversion_error(1, e))?;
    let student_id: String = row.get(2)?;
    let status: String = row.get(8)?;
    let status: AttendanceStatus = status.parse().map_err(|e: String| conversion_error(8, e))?;

    Ok(Attendance {
        id: row.get(0)?,
        session_id,
        student_id: StudentId::new(student_id),
        student_name: row.get(3)?,
        location: GeoPoint::new(row.get(4)?, row.get(5)?),
        distance_meters: row.get(6)?,
        device_fingerprint: row.get(7)?,
        status,
        origin_hint: row.get(9)?,
        created_at: from_millis(row.get(10)?),
    })
}

impl Store for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StoreError::Corrupt(format!("audit timestamp: {}", e)))?;
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn insert_session(&self, session: &Session) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            &format!(
                "INSERT INTO sessions ({SESSION_COLUMNS}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                session.id.to_string(),
                session.course_name,
                session.description,
                session.center.latitude,
                session.center.longitude,
                session.radius_meters,
                to_millis(&session.start_time),
                to_millis(&session.end_time),
                session.late_threshold_minutes,
                session.is_active,
                session.created_by.as_str(),
                session.token.value,
                to_millis(&session.token.issued_at),
                to_millis(&session.token.expires_at),
                to_millis(&session.created_at),
                to_millis(&session.updated_at),
                session.archived_at.as_ref().map(to_millis),
            ],
        )?;

        debug!(session_id = %session.id, "Session inserted");
        Ok(())
    }

    fn get_session(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn()?;

        let session = conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ? AND archived_ms IS NULL"
                ),
                [id.to_string()],
                session_from_row,
            )
            .optional()?;

        Ok(session)
    }

    fn find_session_by_token(&self, token: &str) -> StoreResult<Option<Session>> {
        let conn = self.conn()?;

        let session = conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE token = ? AND archived_ms IS NULL"
                ),
                [token],
                session_from_row,
            )
            .optional()?;

        Ok(session)
    }

    fn list_sessions_by_owner(&self, owner: &PrincipalId) -> StoreResult<Vec<Session>> {
        let conn = self.conn()?;
        Self::query_sessions(&conn, "created_by = ?", [owner.as_str()])
    }

    fn update_session(&self, session: &Session) -> StoreResult<bool> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            UPDATE sessions
            SET description = ?, center_lat = ?, center_lon = ?, radius_m = ?,
                start_ms = ?, end_ms = ?, late_threshold_min = ?, updated_ms = ?
            WHERE id = ? AND archived_ms IS NULL
            "#,
            params![
                session.description,
                session.center.latitude,
                session.center.longitude,
                session.radius_meters,
                to_millis(&session.start_time),
                to_millis(&session.end_time),
                session.late_threshold_minutes,
                to_millis(&session.updated_at),
                session.id.to_string(),
            ],
        )?;

        debug!(session_id = %session.id, changed, "Session updated");
        Ok(changed == 1)
    }

    fn set_session_active(
        &self,
        id: &SessionId,
        active: bool,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE sessions SET is_active = ?, updated_ms = ? WHERE id = ? AND archived_ms IS NULL",
            params![active, to_millis(&at), id.to_string()],
        )?;

        debug!(session_id = %id, is_active = active, changed, "Session active flag set");
        Ok(changed == 1)
    }

    fn swap_token(
        &self,
        id: &SessionId,
        expected: &str,
        next: &TokenRecord,
    ) -> StoreResult<bool> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            UPDATE sessions
            SET token = ?, token_issued_ms = ?, token_expires_ms = ?, updated_ms = ?
            WHERE id = ? AND token = ? AND archived_ms IS NULL
            "#,
            params![
                next.value,
                to_millis(&next.issued_at),
                to_millis(&next.expires_at),
                to_millis(&next.issued_at),
                id.to_string(),
                expected,
            ],
        )?;

        debug!(session_id = %id, swapped = changed == 1, "Token swap attempted");
        Ok(changed == 1)
    }

    fn archive_session(&self, id: &SessionId, at: DateTime<Utc>) -> StoreResult<bool> {
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE sessions SET archived_ms = ?, is_active = 0, updated_ms = ? \
             WHERE id = ? AND archived_ms IS NULL",
            params![to_millis(&at), to_millis(&at), id.to_string()],
        )?;

        Ok(changed == 1)
    }

    fn insert_attendance(&self, record: &Attendance) -> StoreResult<InsertOutcome> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            INSERT INTO attendance (session_id, student_id, student_name, latitude, longitude,
                                    distance_m, device_fingerprint, status, origin_hint, created_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id, student_id) DO NOTHING
            "#,
            params![
                record.session_id.to_string(),
                record.student_id.as_str(),
                record.student_name,
                record.location.latitude,
                record.location.longitude,
                record.distance_meters,
                record.device_fingerprint,
                record.status.as_str(),
                record.origin_hint,
                to_millis(&record.created_at),
            ],
        )?;

        if changed == 0 {
            debug!(
                session_id = %record.session_id,
                student_id = %record.student_id,
                "Attendance insert skipped: duplicate"
            );
            return Ok(InsertOutcome::Duplicate);
        }

        let id = conn.last_insert_rowid();
        debug!(attendance_id = id, session_id = %record.session_id, "Attendance inserted");
        Ok(InsertOutcome::Inserted { id })
    }

    fn get_attendance(
        &self,
        session_id: &SessionId,
        student_id: &StudentId,
    ) -> StoreResult<Option<Attendance>> {
        let conn = self.conn()?;

        let record = conn
            .query_row(
                &format!(
                    "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
                     WHERE session_id = ? AND student_id = ?"
                ),
                params![session_id.to_string(), student_id.as_str()],
                attendance_from_row,
            )
            .optional()?;

        Ok(record)
    }

    fn list_attendance_for_session(&self, session_id: &SessionId) -> StoreResult<Vec<Attendance>> {
        let conn = self.conn()?;
        Self::query_attendance(&conn, "session_id = ?", [session_id.to_string()])
    }

    fn list_attendance_for_student(
        &self,
        student_id: &StudentId,
    ) -> StoreResult<Vec<StudentRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT a.id, a.session_id, a.student_id, a.student_name, a.latitude, a.longitude,
                   a.distance_m, a.device_fingerprint, a.status, a.origin_hint, a.created_ms,
                   s.course_name, s.description, s.start_ms
            FROM attendance a
            JOIN sessions s ON s.id = a.session_id
            WHERE a.student_id = ?
            ORDER BY a.created_ms DESC, a.id DESC
            "#,
        )?;

        let rows = stmt.query_map([student_id.as_str()], |row| {
            Ok(StudentRecord {
                attendance: attendance_from_row(row)?,
                course_name: row.get(11)?,
                description: row.get(12)?,
                session_start: from_millis(row.get(13)?),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_attendance_for_device(
        &self,
        session_id: &SessionId,
        device_fingerprint: &str,
    ) -> StoreResult<Vec<Attendance>> {
        let conn = self.conn()?;
        Self::query_attendance(
            &conn,
            "session_id = ? AND device_fingerprint = ?",
            params![session_id.to_string(), device_fingerprint],
        )
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap()
    }

    fn sample_session(owner: &str, token: &str) -> Session {
        Session {
            id: SessionId::new(),
            course_name: "CS101".into(),
            description: Some("Intro lecture".into()),
            center: GeoPoint::new(12.9716, 77.5946),
            radius_meters: 50.0,
            start_time: t0(),
            end_time: t0() + chrono::Duration::hours(1),
            late_threshold_minutes: 15,
            is_active: true,
            created_by: PrincipalId::new(owner),
            token: TokenRecord {
                value: token.into(),
                issued_at: t0(),
                expires_at: t0() + chrono::Duration::minutes(2),
            },
            created_at: t0(),
            updated_at: t0(),
            archived_at: None,
        }
    }

    fn sample_attendance(session_id: SessionId, student: &str, fingerprint: &str) -> Attendance {
        Attendance {
            id: 0,
            session_id,
            student_id: StudentId::new(student),
            student_name: format!("Student {}", student),
            location: GeoPoint::new(12.9717, 77.5946),
            distance_meters: 11.1,
            device_fingerprint: fingerprint.into(),
            status: AttendanceStatus::Present,
            origin_hint: String::new(),
            created_at: t0() + chrono::Duration::minutes(3),
        }
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollcall.db");

        let session = sample_session("lecturer-1", "tok-disk");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_session(&session).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let loaded = reopened.get_session(&session.id).unwrap().unwrap();
        assert_eq!(loaded.course_name, "CS101");
    }

    #[test]
    fn test_audit_log() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStarted))
            .unwrap();
        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped))
            .unwrap();

        let events = store.get_recent_audits(10).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].event, AuditEventType::ServiceStopped));
        assert!(matches!(events[1].event, AuditEventType::ServiceStarted));
    }

    #[test]
    fn test_session_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let session = sample_session("lecturer-1", "tok-a");
        store.insert_session(&session).unwrap();

        let loaded = store.get_session(&session.id).unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.center, session.center);
        assert_eq!(loaded.start_time, session.start_time);
        assert_eq!(loaded.token, session.token);
        assert!(loaded.is_active);
        assert!(loaded.archived_at.is_none());

        let by_token = store.find_session_by_token("tok-a").unwrap().unwrap();
        assert_eq!(by_token.id, session.id);
        assert!(store.find_session_by_token("tok-b").unwrap().is_none());
    }

    #[test]
    fn test_swap_token_is_conditional() {
        let store = SqliteStore::in_memory().unwrap();
        let session = sample_session("lecturer-1", "tok-old");
        store.insert_session(&session).unwrap();

        let next = TokenRecord {
            value: "tok-new".into(),
            issued_at: t0() + chrono::Duration::minutes(5),
            expires_at: t0() + chrono::Duration::minutes(7),
        };
        assert!(store.swap_token(&session.id, "tok-old", &next).unwrap());

        // A second rotation still expecting the old token loses
        let loser = TokenRecord {
            value: "tok-loser".into(),
            ..next.clone()
        };
        assert!(!store.swap_token(&session.id, "tok-old", &loser).unwrap());

        assert!(store.find_session_by_token("tok-old").unwrap().is_none());
        assert!(store.find_session_by_token("tok-loser").unwrap().is_none());
        let current = store.get_session(&session.id).unwrap().unwrap();
        assert_eq!(current.token, next);
    }

    #[test]
    fn test_update_session_leaves_token_and_flag_alone() {
        let store = SqliteStore::in_memory().unwrap();
        let mut session = sample_session("lecturer-1", "tok-a");
        store.insert_session(&session).unwrap();

        session.radius_meters = 120.0;
        session.is_active = false;
        session.token.value = "should-not-persist".into();
        assert!(store.update_session(&session).unwrap());

        let loaded = store.get_session(&session.id).unwrap().unwrap();
        assert_eq!(loaded.radius_meters, 120.0);
        assert!(loaded.is_active);
        assert_eq!(loaded.token.value, "tok-a");
    }

    #[test]
    fn test_set_session_active() {
        let store = SqliteStore::in_memory().unwrap();
        let session = sample_session("lecturer-1", "tok-a");
        store.insert_session(&session).unwrap();

        let later = t0() + chrono::Duration::minutes(5);
        assert!(store.set_session_active(&session.id, false, later).unwrap());

        let loaded = store.get_session(&session.id).unwrap().unwrap();
        assert!(!loaded.is_active);
        assert_eq!(loaded.updated_at, later);
        assert_eq!(loaded.radius_meters, session.radius_meters);

        store.archive_session(&session.id, later).unwrap();
        assert!(!store.set_session_active(&session.id, true, later).unwrap());
    }

    #[test]
    fn test_archive_hides_session_but_keeps_attendance() {
        let store = SqliteStore::in_memory().unwrap();
        let session = sample_session("lecturer-1", "tok-a");
        store.insert_session(&session).unwrap();
        store
            .insert_attendance(&sample_attendance(session.id, "s1", ""))
            .unwrap();

        assert!(store.archive_session(&session.id, t0()).unwrap());
        assert!(!store.archive_session(&session.id, t0()).unwrap());

        assert!(store.get_session(&session.id).unwrap().is_none());
        assert!(store.find_session_by_token("tok-a").unwrap().is_none());
        assert!(store.list_sessions_by_owner(&PrincipalId::new("lecturer-1")).unwrap().is_empty());
        let history = store.list_attendance_for_student(&StudentId::new("s1")).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].course_name, "CS101");
    }

    #[test]
    fn test_insert_attendance_rejects_duplicates() {
        let store = SqliteStore::in_memory().unwrap();
        let session = sample_session("lecturer-1", "tok-a");
        store.insert_session(&session).unwrap();

        let first = store
            .insert_attendance(&sample_attendance(session.id, "s1", "fp"))
            .unwrap();
        assert!(matches!(first, InsertOutcome::Inserted { .. }));

        let mut again = sample_attendance(session.id, "s1", "fp");
        again.status = AttendanceStatus::Late;
        let second = store.insert_attendance(&again).unwrap();
        assert_eq!(second, InsertOutcome::Duplicate);

        // The original row is untouched
        let stored = store
            .get_attendance(&session.id, &StudentId::new("s1"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, AttendanceStatus::Present);
        assert_eq!(store.list_attendance_for_session(&session.id).unwrap().len(), 1);
    }

    #[test]
    fn test_device_fingerprint_is_not_unique() {
        let store = SqliteStore::in_memory().unwrap();
        let session = sample_session("lecturer-1", "tok-a");
        store.insert_session(&session).unwrap();

        for student in ["s1", "s2", "s3"] {
            store
                .insert_attendance(&sample_attendance(session.id, student, "shared-phone"))
                .unwrap();
        }
        store
            .insert_attendance(&sample_attendance(session.id, "s4", "own-phone"))
            .unwrap();

        let shared = store
            .list_attendance_for_device(&session.id, "shared-phone")
            .unwrap();
        assert_eq!(shared.len(), 3);
    }

    #[test]
    fn test_student_history_is_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        let older = sample_session("lecturer-1", "tok-a");
        let newer = sample_session("lecturer-1", "tok-b");
        store.insert_session(&older).unwrap();
        store.insert_session(&newer).unwrap();

        store
            .insert_attendance(&sample_attendance(older.id, "s1", ""))
            .unwrap();
        let mut later = sample_attendance(newer.id, "s1", "");
        later.created_at = later.created_at + chrono::Duration::days(7);
        store.insert_attendance(&later).unwrap();

        let history = store.list_attendance_for_student(&StudentId::new("s1")).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].attendance.session_id, newer.id);
        assert_eq!(history[1].attendance.session_id, older.id);
        assert_eq!(history[0].course_name, "CS101");
        assert_eq!(history[0].description.as_deref(), Some("Intro lecture"));
        assert_eq!(history[0].session_start, t0());
    }
}
