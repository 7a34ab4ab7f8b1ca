//! Admission engine

use chrono::{DateTime, Utc};
use rollcall_api::{
    AttendanceAttempt, AttendanceStats, AttendanceStatus, AttendanceView, DeviceCollision,
    StudentAttendanceView, SubmitResult,
};
use rollcall_config::AdmissionConfig;
use rollcall_store::{Attendance, AuditEventType, InsertOutcome, Session, Store, StudentRecord};
use rollcall_util::{PrincipalId, SessionId, StudentId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::geoclock;
use crate::{
    AdmissionError, AdmissionResult, CoreEvent, EventQueue, SessionRegistry, TokenLookup,
};

/// A student's history across sessions
#[derive(Debug, Clone)]
pub struct StudentHistory {
    pub records: Vec<StudentAttendanceView>,
    pub stats: AttendanceStats,
}

/// The admission engine.
///
/// Stateless per request; every method takes `&self` and may run on many
/// threads at once. Uniqueness and token exclusivity come from the store's
/// atomic primitives.
pub struct AdmissionEngine {
    store: Arc<dyn Store>,
    registry: SessionRegistry,
    events: Arc<EventQueue>,
}

impl AdmissionEngine {
    /// Create a new admission engine
    pub fn new(store: Arc<dyn Store>, config: AdmissionConfig) -> Self {
        info!(
            token_ttl_secs = config.token_ttl.as_secs(),
            default_radius_meters = config.default_radius_meters,
            "Admission engine initialized"
        );

        let events = Arc::new(EventQueue::default());
        let registry = SessionRegistry::new(store.clone(), config, events.clone());

        Self {
            store,
            registry,
            events,
        }
    }

    /// Session lifecycle operations
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Take events produced since the last call
    pub fn drain_events(&self) -> Vec<CoreEvent> {
        self.events.drain()
    }

    pub fn is_healthy(&self) -> bool {
        self.store.is_healthy()
    }

    /// Run one scan through token check, duplicate check, classification
    /// and commit.
    pub fn submit(
        &self,
        attempt: &AttendanceAttempt,
        now: DateTime<Utc>,
    ) -> AdmissionResult<SubmitResult> {
        if attempt.student_id.as_str().trim().is_empty() {
            return Err(AdmissionError::InvalidRequest("student_id cannot be empty".into()));
        }
        if !attempt.location.is_valid() {
            return Err(AdmissionError::InvalidRequest(
                "reported location is out of range".into(),
            ));
        }

        // Token check
        let session = match self.registry.lookup_by_token(&attempt.token, now)? {
            TokenLookup::Live(session) => session,
            TokenLookup::Unknown => return Err(self.reject(None, attempt, "unknown token")),
            TokenLookup::Expired { session_id } => {
                return Err(self.reject(Some(session_id), attempt, "expired token"));
            }
        };
        if let Some(expected) = attempt.session_id
            && expected != session.id
        {
            return Err(self.reject(Some(session.id), attempt, "token belongs to another session"));
        }
        if !session.is_active {
            return Err(self.reject(Some(session.id), attempt, "session inactive"));
        }

        // Duplicate check (early out; the commit below is the real guard)
        if let Some(prior) = self.store.get_attendance(&session.id, &attempt.student_id)? {
            debug!(session_id = %session.id, student_id = %attempt.student_id, "Already recorded");
            return Err(AdmissionError::AlreadyRecorded {
                prior_status: prior.status,
            });
        }

        // Classify
        let distance_meters = geoclock::distance(attempt.location, session.center);
        let status = geoclock::classify(
            distance_meters,
            session.radius_meters,
            session.start_time,
            session.late_threshold_minutes,
            now,
        );

        // Commit
        let mut record = Attendance {
            id: 0,
            session_id: session.id,
            student_id: attempt.student_id.clone(),
            student_name: attempt.student_name.trim().to_string(),
            location: attempt.location,
            distance_meters,
            device_fingerprint: normalize(attempt.device_fingerprint.as_deref()),
            status,
            origin_hint: normalize(attempt.origin_hint.as_deref()),
            created_at: now,
        };

        record.id = match self.store.insert_attendance(&record)? {
            InsertOutcome::Inserted { id } => id,
            InsertOutcome::Duplicate => {
                let prior_status = self
                    .store
                    .get_attendance(&session.id, &attempt.student_id)?
                    .map(|prior| prior.status)
                    .unwrap_or(status);
                debug!(
                    session_id = %session.id,
                    student_id = %attempt.student_id,
                    "Lost insert race to a concurrent scan"
                );
                return Err(AdmissionError::AlreadyRecorded { prior_status });
            }
        };

        let shared_device_count = self.shared_device_count(&record);

        self.registry.audit(AuditEventType::AttendanceRecorded {
            session_id: session.id,
            student_id: record.student_id.clone(),
            status,
            distance_meters,
        });

        if status.is_admitted() {
            info!(
                session_id = %session.id,
                student_id = %record.student_id,
                status = %status,
                distance_meters,
                "Attendance recorded"
            );
        } else {
            warn!(
                session_id = %session.id,
                student_id = %record.student_id,
                distance_meters,
                radius_meters = session.radius_meters,
                "Attendance recorded outside geofence"
            );
        }
        if shared_device_count > 0 {
            warn!(
                session_id = %session.id,
                student_id = %record.student_id,
                shared_device_count,
                "Device fingerprint already used in this session"
            );
        }

        self.events.push(CoreEvent::AttendanceRecorded {
            session_id: session.id,
            student_id: record.student_id.clone(),
            status,
        });

        Ok(SubmitResult {
            status,
            distance_meters,
            message: result_message(status, distance_meters, &session),
            attendance_id: record.id,
            shared_device_count,
        })
    }

    /// Records for one session (owner only), newest first
    pub fn attendance_for_session(
        &self,
        id: &SessionId,
        owner: &PrincipalId,
    ) -> AdmissionResult<Vec<AttendanceView>> {
        let session = self.registry.lookup_owned(id, owner)?;
        let records = self.store.list_attendance_for_session(&session.id)?;
        Ok(records.iter().map(Attendance::to_view).collect())
    }

    /// A student's records across all sessions, newest first, with totals
    pub fn attendance_for_student(&self, student_id: &StudentId) -> AdmissionResult<StudentHistory> {
        let records = self.store.list_attendance_for_student(student_id)?;
        let stats = records.iter().map(|r| &r.attendance.status).collect();

        Ok(StudentHistory {
            records: records.iter().map(StudentRecord::to_view).collect(),
            stats,
        })
    }

    /// Groups of records in a session that share a device fingerprint
    pub fn device_collisions(
        &self,
        id: &SessionId,
        owner: &PrincipalId,
    ) -> AdmissionResult<Vec<DeviceCollision>> {
        let session = self.registry.lookup_owned(id, owner)?;
        let records = self.store.list_attendance_for_session(&session.id)?;

        let mut by_device: BTreeMap<&str, Vec<&Attendance>> = BTreeMap::new();
        for record in &records {
            if !record.device_fingerprint.is_empty() {
                by_device
                    .entry(record.device_fingerprint.as_str())
                    .or_default()
                    .push(record);
            }
        }

        Ok(by_device
            .into_iter()
            .filter(|(_, group)| group.len() > 1)
            .map(|(fingerprint, group)| DeviceCollision {
                device_fingerprint: fingerprint.to_string(),
                records: group.into_iter().map(Attendance::to_view).collect(),
            })
            .collect())
    }

    /// Other rows in the session reported from the same device. A failed
    /// lookup is logged and counted as zero since the row is already committed.
    fn shared_device_count(&self, record: &Attendance) -> usize {
        if record.device_fingerprint.is_empty() {
            return 0;
        }

        match self
            .store
            .list_attendance_for_device(&record.session_id, &record.device_fingerprint)
        {
            Ok(rows) => rows.iter().filter(|r| r.id != record.id).count(),
            Err(e) => {
                warn!(error = %e, "Failed to count shared device records");
                0
            }
        }
    }

    fn reject(
        &self,
        session_id: Option<SessionId>,
        attempt: &AttendanceAttempt,
        reason: &str,
    ) -> AdmissionError {
        warn!(
            session_id = ?session_id,
            student_id = %attempt.student_id,
            reason,
            "Attempt rejected"
        );
        self.registry.audit(AuditEventType::AttemptRejected {
            session_id,
            student_id: attempt.student_id.clone(),
            reason: reason.to_string(),
        });
        AdmissionError::ExpiredOrInvalidToken
    }
}

fn normalize(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn result_message(status: AttendanceStatus, distance_meters: f64, session: &Session) -> String {
    match status {
        AttendanceStatus::Present => "Attendance marked successfully".to_string(),
        AttendanceStatus::Late => "Attendance marked as late".to_string(),
        AttendanceStatus::Invalid => format!(
            "You are {}m from the session location (allowed {}m)",
            distance_meters.round(),
            session.radius_meters.round()
        ),
    }
}
