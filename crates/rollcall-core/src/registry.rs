//! Session registry: scheduling, ownership checks and token rotation

use chrono::{DateTime, Utc};
use rollcall_api::{GeoPoint, NewSession, WindowUpdate};
use rollcall_config::{AdmissionConfig, MAX_LATE_THRESHOLD_MINUTES};
use rollcall_store::{AuditEvent, AuditEventType, Session, Store};
use rollcall_util::{PrincipalId, SessionId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{AdmissionError, AdmissionResult, CoreEvent, EventQueue, ScanToken};

/// Result of resolving a presented token
#[derive(Debug)]
pub enum TokenLookup {
    /// The token is the session's current one and has not expired
    Live(Session),
    /// No session currently holds this token
    Unknown,
    /// The token was current but has expired; a replacement was issued
    Expired { session_id: SessionId },
}

/// Owns the lifecycle of sessions and their tokens
pub struct SessionRegistry {
    store: Arc<dyn Store>,
    config: AdmissionConfig,
    events: Arc<EventQueue>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn Store>, config: AdmissionConfig, events: Arc<EventQueue>) -> Self {
        Self {
            store,
            config,
            events,
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Schedule a session and issue its first token
    pub fn create(
        &self,
        new: NewSession,
        owner: &PrincipalId,
        now: DateTime<Utc>,
    ) -> AdmissionResult<Session> {
        let course_name = new.course_name.trim().to_string();
        if course_name.is_empty() {
            return Err(AdmissionError::InvalidRequest(
                "course_name cannot be empty".into(),
            ));
        }
        if owner.as_str().is_empty() {
            return Err(AdmissionError::InvalidRequest("owner cannot be empty".into()));
        }

        let radius_meters = new
            .radius_meters
            .unwrap_or(self.config.default_radius_meters);
        let late_threshold_minutes = new
            .late_threshold_minutes
            .unwrap_or(self.config.default_late_threshold_minutes);
        self.check_geofence(new.center, radius_meters)?;
        check_window(new.start_time, new.end_time)?;
        check_late_threshold(late_threshold_minutes)?;

        let token = ScanToken::issue(now, self.config.token_ttl);
        let session = Session {
            id: SessionId::new(),
            course_name,
            description: new.description.filter(|d| !d.is_empty()),
            center: new.center,
            radius_meters,
            start_time: new.start_time,
            end_time: new.end_time,
            late_threshold_minutes,
            is_active: true,
            created_by: owner.clone(),
            token: token.to_record(),
            created_at: now,
            updated_at: now,
            archived_at: None,
        };

        self.store.insert_session(&session)?;

        self.audit(AuditEventType::SessionCreated {
            session_id: session.id,
            owner: owner.clone(),
            course_name: session.course_name.clone(),
        });

        info!(
            session_id = %session.id,
            owner = %owner,
            course = %session.course_name,
            radius_meters,
            "Session created"
        );

        self.events.push(CoreEvent::SessionCreated {
            session_id: session.id,
            course_name: session.course_name.clone(),
        });

        Ok(session)
    }

    /// Get a session by ID. Archived sessions are `NotFound`.
    pub fn lookup(&self, id: &SessionId) -> AdmissionResult<Session> {
        self.store.get_session(id)?.ok_or(AdmissionError::NotFound)
    }

    /// Get a session the requester owns
    pub fn lookup_owned(
        &self,
        id: &SessionId,
        requester: &PrincipalId,
    ) -> AdmissionResult<Session> {
        let session = self.lookup(id)?;
        if !session.is_owned_by(requester) {
            warn!(requester = %requester, "Owner check failed");
            return Err(AdmissionError::Unauthorized);
        }
        Ok(session)
    }

    /// Resolve a presented token. An expired token is rotated on the spot.
    pub fn lookup_by_token(&self, token: &str, now: DateTime<Utc>) -> AdmissionResult<TokenLookup> {
        if token.is_empty() {
            return Ok(TokenLookup::Unknown);
        }

        let Some(session) = self.store.find_session_by_token(token)? else {
            return Ok(TokenLookup::Unknown);
        };

        let current = ScanToken::from(session.token.clone());
        if current.is_live(now) {
            return Ok(TokenLookup::Live(session));
        }

        debug!(session_id = %session.id, "Presented token has expired");
        let session_id = session.id;
        self.replace_token(&session, now, true)?;
        Ok(TokenLookup::Expired { session_id })
    }

    /// Issue a new token on the owner's request
    pub fn rotate(
        &self,
        id: &SessionId,
        requester: &PrincipalId,
        now: DateTime<Utc>,
    ) -> AdmissionResult<ScanToken> {
        let session = self.lookup_owned(id, requester)?;
        if !session.is_active {
            return Err(AdmissionError::SessionInactive);
        }
        self.replace_token(&session, now, false)
    }

    /// The token to display right now, rotating first if it is stale
    pub fn live_token(
        &self,
        id: &SessionId,
        requester: &PrincipalId,
        now: DateTime<Utc>,
    ) -> AdmissionResult<ScanToken> {
        let session = self.lookup_owned(id, requester)?;
        if !session.is_active {
            return Err(AdmissionError::SessionInactive);
        }

        let current = ScanToken::from(session.token.clone());
        if current.is_live(now) {
            return Ok(current);
        }
        self.replace_token(&session, now, true)
    }

    /// Flip the kill switch. Only the flag is written; the current token
    /// and schedule stay as they are.
    pub fn set_active(
        &self,
        id: &SessionId,
        requester: &PrincipalId,
        active: bool,
        now: DateTime<Utc>,
    ) -> AdmissionResult<Session> {
        let session = self.lookup_owned(id, requester)?;
        if session.is_active == active {
            return Ok(session);
        }

        if !self.store.set_session_active(&session.id, active, now)? {
            return Err(AdmissionError::NotFound);
        }

        self.audit(AuditEventType::SessionActiveChanged {
            session_id: session.id,
            is_active: active,
        });
        info!(session_id = %session.id, is_active = active, "Session active flag changed");
        self.events.push(CoreEvent::SessionActiveChanged {
            session_id: session.id,
            is_active: active,
        });

        self.lookup(id)
    }

    /// Change the geofence, time window or description. An empty
    /// description clears it. The active flag is never written here.
    pub fn update_window(
        &self,
        id: &SessionId,
        requester: &PrincipalId,
        update: WindowUpdate,
        now: DateTime<Utc>,
    ) -> AdmissionResult<Session> {
        if update.is_empty() {
            return Err(AdmissionError::InvalidRequest("no changes requested".into()));
        }

        let mut session = self.lookup_owned(id, requester)?;

        if let Some(center) = update.center {
            session.center = center;
        }
        if let Some(radius) = update.radius_meters {
            session.radius_meters = radius;
        }
        if let Some(start) = update.start_time {
            session.start_time = start;
        }
        if let Some(end) = update.end_time {
            session.end_time = end;
        }
        if let Some(threshold) = update.late_threshold_minutes {
            session.late_threshold_minutes = threshold;
        }
        if let Some(description) = update.description {
            session.description = Some(description).filter(|d| !d.is_empty());
        }

        self.check_geofence(session.center, session.radius_meters)?;
        check_window(session.start_time, session.end_time)?;
        check_late_threshold(session.late_threshold_minutes)?;

        session.updated_at = now;
        if !self.store.update_session(&session)? {
            return Err(AdmissionError::NotFound);
        }

        self.audit(AuditEventType::SessionWindowUpdated {
            session_id: session.id,
        });
        info!(session_id = %session.id, "Session window updated");
        self.events.push(CoreEvent::SessionUpdated {
            session_id: session.id,
        });

        self.lookup(id)
    }

    /// Soft-delete a session. Its attendance records stay queryable.
    pub fn archive(
        &self,
        id: &SessionId,
        requester: &PrincipalId,
        now: DateTime<Utc>,
    ) -> AdmissionResult<()> {
        let session = self.lookup_owned(id, requester)?;
        if !self.store.archive_session(&session.id, now)? {
            return Err(AdmissionError::NotFound);
        }

        self.audit(AuditEventType::SessionArchived {
            session_id: session.id,
        });
        info!(session_id = %session.id, "Session archived");
        self.events.push(CoreEvent::SessionArchived {
            session_id: session.id,
        });

        Ok(())
    }

    /// The owner's sessions, newest first
    pub fn list_for_owner(&self, owner: &PrincipalId) -> AdmissionResult<Vec<Session>> {
        Ok(self.store.list_sessions_by_owner(owner)?)
    }

    /// Swap in a fresh token, conditional on the session still holding the
    /// one we read. If another rotation won, its token is returned instead.
    fn replace_token(
        &self,
        session: &Session,
        now: DateTime<Utc>,
        lazy: bool,
    ) -> AdmissionResult<ScanToken> {
        let next = ScanToken::issue(now, self.config.token_ttl);

        if !self
            .store
            .swap_token(&session.id, &session.token.value, &next.to_record())?
        {
            debug!(session_id = %session.id, "Token rotation lost the race");
            let winner = self.lookup(&session.id)?;
            return Ok(ScanToken::from(winner.token));
        }

        self.audit(AuditEventType::TokenRotated {
            session_id: session.id,
            expires_at: next.expires_at(),
            lazy,
        });
        info!(
            session_id = %session.id,
            expires_at = %next.expires_at(),
            lazy,
            "Token rotated"
        );
        self.events.push(CoreEvent::TokenRotated {
            session_id: session.id,
            expires_at: next.expires_at(),
            lazy,
        });

        Ok(next)
    }

    fn check_geofence(&self, center: GeoPoint, radius_meters: f64) -> AdmissionResult<()> {
        if !center.is_valid() {
            return Err(AdmissionError::InvalidRequest(
                "latitude must be within [-90, 90] and longitude within [-180, 180]".into(),
            ));
        }
        if !radius_meters.is_finite()
            || radius_meters <= 0.0
            || radius_meters > self.config.max_radius_meters
        {
            return Err(AdmissionError::InvalidRequest(format!(
                "radius must be positive and at most {}m",
                self.config.max_radius_meters
            )));
        }
        Ok(())
    }

    pub(crate) fn audit(&self, event: AuditEventType) {
        if let Err(e) = self.store.append_audit(AuditEvent::new(event)) {
            warn!(error = %e, "Failed to append audit event");
        }
    }
}

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> AdmissionResult<()> {
    if end <= start {
        return Err(AdmissionError::InvalidRequest(
            "end_time must be after start_time".into(),
        ));
    }
    Ok(())
}

fn check_late_threshold(minutes: u32) -> AdmissionResult<()> {
    if minutes > MAX_LATE_THRESHOLD_MINUTES {
        return Err(AdmissionError::InvalidRequest(format!(
            "late_threshold_minutes must be at most {}",
            MAX_LATE_THRESHOLD_MINUTES
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rollcall_store::{
        Attendance, InsertOutcome, SqliteStore, StoreResult, StudentRecord, TokenRecord,
    };
    use rollcall_util::StudentId;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap()
    }

    fn lecturer() -> PrincipalId {
        PrincipalId::new("lecturer-1")
    }

    fn setup() -> (SessionRegistry, Arc<SqliteStore>, Arc<EventQueue>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let events = Arc::new(EventQueue::default());
        let registry =
            SessionRegistry::new(store.clone(), AdmissionConfig::default(), events.clone());
        (registry, store, events)
    }

    fn new_session() -> NewSession {
        NewSession {
            course_name: "CS101".into(),
            description: None,
            center: GeoPoint::new(12.9716, 77.5946),
            radius_meters: None,
            start_time: t0(),
            end_time: t0() + Duration::hours(1),
            late_threshold_minutes: None,
        }
    }

    #[test]
    fn create_applies_defaults_and_issues_token() {
        let (registry, _, events) = setup();
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();

        assert_eq!(session.radius_meters, 50.0);
        assert_eq!(session.late_threshold_minutes, 15);
        assert!(session.is_active);
        assert_eq!(session.token.expires_at, t0() + Duration::seconds(120));
        assert!(matches!(
            events.drain().as_slice(),
            [CoreEvent::SessionCreated { .. }]
        ));
    }

    #[test]
    fn create_rejects_bad_input() {
        let (registry, _, _) = setup();

        let mut bad_lat = new_session();
        bad_lat.center = GeoPoint::new(91.0, 0.0);
        assert!(matches!(
            registry.create(bad_lat, &lecturer(), t0()),
            Err(AdmissionError::InvalidRequest(_))
        ));

        let mut backwards = new_session();
        backwards.end_time = backwards.start_time;
        assert!(matches!(
            registry.create(backwards, &lecturer(), t0()),
            Err(AdmissionError::InvalidRequest(_))
        ));

        let mut huge = new_session();
        huge.radius_meters = Some(10_000.0);
        assert!(matches!(
            registry.create(huge, &lecturer(), t0()),
            Err(AdmissionError::InvalidRequest(_))
        ));

        let mut nameless = new_session();
        nameless.course_name = "   ".into();
        assert!(matches!(
            registry.create(nameless, &lecturer(), t0()),
            Err(AdmissionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn lookup_by_token_only_matches_live_token() {
        let (registry, _, _) = setup();
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();
        let token = session.token.value.clone();

        let live = registry
            .lookup_by_token(&token, t0() + Duration::seconds(119))
            .unwrap();
        assert!(matches!(live, TokenLookup::Live(s) if s.id == session.id));

        assert!(matches!(
            registry.lookup_by_token("not-a-token", t0()).unwrap(),
            TokenLookup::Unknown
        ));
    }

    #[test]
    fn expired_lookup_rotates_lazily() {
        let (registry, _, events) = setup();
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();
        let old = session.token.value.clone();
        events.drain();

        let later = t0() + Duration::minutes(5);
        let result = registry.lookup_by_token(&old, later).unwrap();
        assert!(matches!(result, TokenLookup::Expired { session_id } if session_id == session.id));

        // The stale token no longer resolves at all
        assert!(matches!(
            registry.lookup_by_token(&old, later).unwrap(),
            TokenLookup::Unknown
        ));
        let fresh = registry.lookup(&session.id).unwrap().token;
        assert_ne!(fresh.value, old);
        assert_eq!(fresh.expires_at, later + Duration::seconds(120));
        assert!(matches!(
            events.drain().as_slice(),
            [CoreEvent::TokenRotated { lazy: true, .. }]
        ));
    }

    #[test]
    fn rotation_invalidates_previous_token() {
        let (registry, _, _) = setup();
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();
        let old = session.token.value.clone();

        let at = t0() + Duration::seconds(30);
        let next = registry.rotate(&session.id, &lecturer(), at).unwrap();
        assert_ne!(next.value(), old);
        assert!(matches!(
            registry.lookup_by_token(&old, at).unwrap(),
            TokenLookup::Unknown
        ));
        assert!(matches!(
            registry.lookup_by_token(next.value(), at).unwrap(),
            TokenLookup::Live(_)
        ));
    }

    #[test]
    fn concurrent_rotations_leave_one_live_token() {
        let (registry, store, _) = setup();
        let registry = Arc::new(registry);
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();
        let stale = t0() + Duration::minutes(10);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let id = session.id;
                std::thread::spawn(move || registry.live_token(&id, &lecturer(), stale).unwrap())
            })
            .collect();
        let tokens: Vec<ScanToken> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let current = store.get_session(&session.id).unwrap().unwrap().token;
        assert!(tokens.iter().all(|t| t.value() == current.value));
    }

    #[test]
    fn owner_only_operations() {
        let (registry, _, _) = setup();
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();
        let intruder = PrincipalId::new("someone-else");

        assert!(matches!(
            registry.rotate(&session.id, &intruder, t0()),
            Err(AdmissionError::Unauthorized)
        ));
        assert!(matches!(
            registry.set_active(&session.id, &intruder, false, t0()),
            Err(AdmissionError::Unauthorized)
        ));
        assert!(matches!(
            registry.archive(&session.id, &intruder, t0()),
            Err(AdmissionError::Unauthorized)
        ));
        assert!(matches!(
            registry.live_token(&SessionId::new(), &lecturer(), t0()),
            Err(AdmissionError::NotFound)
        ));
    }

    #[test]
    fn inactive_session_has_no_live_token() {
        let (registry, _, _) = setup();
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();
        let updated = registry
            .set_active(&session.id, &lecturer(), false, t0())
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.token, session.token);

        assert!(matches!(
            registry.live_token(&session.id, &lecturer(), t0()),
            Err(AdmissionError::SessionInactive)
        ));
        assert!(matches!(
            registry.rotate(&session.id, &lecturer(), t0()),
            Err(AdmissionError::SessionInactive)
        ));
    }

    #[test]
    fn update_window_keeps_token() {
        let (registry, _, _) = setup();
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();

        let update = WindowUpdate {
            radius_meters: Some(120.0),
            late_threshold_minutes: Some(5),
            ..Default::default()
        };
        let updated = registry
            .update_window(&session.id, &lecturer(), update, t0())
            .unwrap();
        assert_eq!(updated.radius_meters, 120.0);
        assert_eq!(updated.late_threshold_minutes, 5);

        let stored = registry.lookup(&session.id).unwrap();
        assert_eq!(stored.token, session.token);

        assert!(matches!(
            registry.update_window(&session.id, &lecturer(), WindowUpdate::default(), t0()),
            Err(AdmissionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn archive_hides_session() {
        let (registry, _, _) = setup();
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();
        registry.archive(&session.id, &lecturer(), t0()).unwrap();

        assert!(matches!(
            registry.lookup(&session.id),
            Err(AdmissionError::NotFound)
        ));
        assert!(matches!(
            registry.lookup_by_token(&session.token.value, t0()).unwrap(),
            TokenLookup::Unknown
        ));
        assert!(registry.list_for_owner(&lecturer()).unwrap().is_empty());
    }

    #[test]
    fn late_threshold_is_capped() {
        let (registry, _, _) = setup();

        let mut endless = new_session();
        endless.late_threshold_minutes = Some(u32::MAX);
        assert!(matches!(
            registry.create(endless, &lecturer(), t0()),
            Err(AdmissionError::InvalidRequest(_))
        ));

        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();
        let update = WindowUpdate {
            late_threshold_minutes: Some(MAX_LATE_THRESHOLD_MINUTES + 1),
            ..Default::default()
        };
        assert!(matches!(
            registry.update_window(&session.id, &lecturer(), update, t0()),
            Err(AdmissionError::InvalidRequest(_))
        ));
        assert_eq!(registry.lookup(&session.id).unwrap().late_threshold_minutes, 15);
    }

    #[test]
    fn empty_description_clears_it() {
        let (registry, _, _) = setup();
        let mut described = new_session();
        described.description = Some("Room 4".into());
        let session = registry.create(described, &lecturer(), t0()).unwrap();
        assert_eq!(session.description.as_deref(), Some("Room 4"));

        let update = WindowUpdate {
            description: Some(String::new()),
            ..Default::default()
        };
        let updated = registry
            .update_window(&session.id, &lecturer(), update, t0())
            .unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(registry.lookup(&session.id).unwrap().description, None);
    }

    #[test]
    fn issued_expiry_matches_stored_expiry() {
        let (registry, _, _) = setup();
        let now = t0() + Duration::nanoseconds(987_654_321);
        let session = registry.create(new_session(), &lecturer(), now).unwrap();

        let shown = registry.live_token(&session.id, &lecturer(), now).unwrap();
        assert_eq!(shown.expires_at(), session.token.expires_at);

        let stale = now + Duration::minutes(5);
        let rotated = registry.rotate(&session.id, &lecturer(), stale).unwrap();
        let reread = registry.live_token(&session.id, &lecturer(), stale).unwrap();
        assert_eq!(rotated, reread);
    }

    /// Deactivates the session just before a schedule write lands, as an
    /// owner toggling the kill switch from another client would.
    struct DeactivateDuringUpdate {
        inner: SqliteStore,
    }

    impl Store for DeactivateDuringUpdate {
        fn append_audit(&self, event: AuditEvent) -> StoreResult<()> {
            self.inner.append_audit(event)
        }
        fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
            self.inner.get_recent_audits(limit)
        }
        fn insert_session(&self, session: &Session) -> StoreResult<()> {
            self.inner.insert_session(session)
        }
        fn get_session(&self, id: &SessionId) -> StoreResult<Option<Session>> {
            self.inner.get_session(id)
        }
        fn find_session_by_token(&self, token: &str) -> StoreResult<Option<Session>> {
            self.inner.find_session_by_token(token)
        }
        fn list_sessions_by_owner(&self, owner: &PrincipalId) -> StoreResult<Vec<Session>> {
            self.inner.list_sessions_by_owner(owner)
        }
        fn update_session(&self, session: &Session) -> StoreResult<bool> {
            self.inner
                .set_session_active(&session.id, false, session.updated_at)?;
            self.inner.update_session(session)
        }
        fn set_session_active(
            &self,
            id: &SessionId,
            active: bool,
            at: DateTime<Utc>,
        ) -> StoreResult<bool> {
            self.inner.set_session_active(id, active, at)
        }
        fn swap_token(
            &self,
            id: &SessionId,
            expected: &str,
            next: &TokenRecord,
        ) -> StoreResult<bool> {
            self.inner.swap_token(id, expected, next)
        }
        fn archive_session(&self, id: &SessionId, at: DateTime<Utc>) -> StoreResult<bool> {
            self.inner.archive_session(id, at)
        }
        fn insert_attendance(&self, record: &Attendance) -> StoreResult<InsertOutcome> {
            self.inner.insert_attendance(record)
        }
        fn get_attendance(
            &self,
            session_id: &SessionId,
            student_id: &StudentId,
        ) -> StoreResult<Option<Attendance>> {
            self.inner.get_attendance(session_id, student_id)
        }
        fn list_attendance_for_session(
            &self,
            session_id: &SessionId,
        ) -> StoreResult<Vec<Attendance>> {
            self.inner.list_attendance_for_session(session_id)
        }
        fn list_attendance_for_student(
            &self,
            student_id: &StudentId,
        ) -> StoreResult<Vec<StudentRecord>> {
            self.inner.list_attendance_for_student(student_id)
        }
        fn list_attendance_for_device(
            &self,
            session_id: &SessionId,
            device_fingerprint: &str,
        ) -> StoreResult<Vec<Attendance>> {
            self.inner
                .list_attendance_for_device(session_id, device_fingerprint)
        }
        fn is_healthy(&self) -> bool {
            self.inner.is_healthy()
        }
    }

    #[test]
    fn window_update_does_not_reactivate_session() {
        let store = Arc::new(DeactivateDuringUpdate {
            inner: SqliteStore::in_memory().unwrap(),
        });
        let registry =
            SessionRegistry::new(store.clone(), AdmissionConfig::default(), Arc::default());
        let session = registry.create(new_session(), &lecturer(), t0()).unwrap();
        assert!(session.is_active);

        let update = WindowUpdate {
            radius_meters: Some(80.0),
            ..Default::default()
        };
        let updated = registry
            .update_window(&session.id, &lecturer(), update, t0())
            .unwrap();

        assert!(!updated.is_active);
        assert_eq!(updated.radius_meters, 80.0);
        let stored = store.get_session(&session.id).unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(matches!(
            registry.live_token(&session.id, &lecturer(), t0()),
            Err(AdmissionError::SessionInactive)
        ));
    }
}
