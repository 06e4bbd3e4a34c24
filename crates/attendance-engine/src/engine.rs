//! The attendance engine: rule checks and persistence behind one lock.
//!
//! Every write runs its guard-then-write sequence while holding the store
//! mutex, so two concurrent check-ins for the same (session, student) can
//! never both be accepted. Collaborator calls that may block on a device
//! (location) happen before the lock is taken. Reports work on a snapshot
//! cloned under the lock.

use std::sync::{Mutex, MutexGuard};

use crate::checkin::{self, AttendanceRecord};
use crate::config::EngineConfig;
use crate::eligibility::{self, AttendanceStats, CourseAttendanceSummary, ExamEligibility};
use crate::error::{AttendanceError, Result};
use crate::excuse::{self, ExcuseId, ExcuseSubmission, ReviewOutcome, ReviewVerdict};
use crate::geo::Coordinates;
use crate::identity::{Address, IdentityProvider};
use crate::ledger::{DigestLedger, Ledger, Statement};
use crate::location::LocationProvider;
use crate::profile::{self, ProfileRegistration, Role, UserProfile};
use crate::rejection::{Decision, Rejection};
use crate::session::{self, Session, SessionDeclaration, SessionId};
use crate::storage::{EventStore, StoreSnapshot};

/// Engine over an event store `S` publishing to ledger `L`.
pub struct AttendanceEngine<S, L = DigestLedger> {
    store: Mutex<S>,
    ledger: L,
    config: EngineConfig,
}

/// Map a store failure to `CollaboratorUnavailable`.
fn store_failure(e: AttendanceError) -> AttendanceError {
    match e {
        AttendanceError::CollaboratorUnavailable(_) => e,
        other => AttendanceError::CollaboratorUnavailable(format!("event store: {other}")),
    }
}

fn not_found(session_id: &SessionId) -> Vec<Rejection> {
    vec![Rejection::SessionNotFound {
        session_id: session_id.0.clone(),
    }]
}

impl<S: EventStore> AttendanceEngine<S, DigestLedger> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_ledger(store, DigestLedger, config)
    }
}

impl<S: EventStore, L: Ledger> AttendanceEngine<S, L> {
    pub fn with_ledger(store: S, ledger: L, config: EngineConfig) -> Self {
        Self {
            store: Mutex::new(store),
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Consume the engine and return its store.
    pub fn into_store(self) -> Result<S> {
        self.store
            .into_inner()
            .map_err(|_| AttendanceError::CollaboratorUnavailable("event store lock poisoned".into()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>> {
        self.store
            .lock()
            .map_err(|_| AttendanceError::CollaboratorUnavailable("event store lock poisoned".into()))
    }

    // ── Profiles ─────────────────────────────────────────────────────────────

    /// Register the profile for `address`. One per wallet; emails are unique.
    pub fn register_profile(
        &self,
        address: &Address,
        role: Role,
        registration: ProfileRegistration,
        now: u64,
    ) -> Result<Decision<UserProfile>> {
        let mut store = self.lock()?;
        let existing = store.profile(address).map_err(store_failure)?;
        let email_taken = profile::is_valid_email(&registration.email)
            && store
                .profile_by_email(&registration.email)
                .map_err(store_failure)?
                .is_some();

        match profile::register(address, role, registration, existing.as_ref(), email_taken, now) {
            Decision::Accepted(profile) => {
                store.insert_profile(profile.clone()).map_err(store_failure)?;
                log::debug!("registered {} as {} ({})", address.short(), role, profile.id);
                Ok(Decision::Accepted(profile))
            }
            Decision::Rejected(reasons) => {
                log::warn!(
                    "profile registration by {} rejected: {:?}",
                    address.short(),
                    reasons.iter().map(Rejection::code).collect::<Vec<_>>()
                );
                Ok(Decision::Rejected(reasons))
            }
        }
    }

    pub fn profile(&self, address: &Address) -> Result<Option<UserProfile>> {
        self.lock()?.profile(address).map_err(store_failure)
    }

    pub fn profiles(&self) -> Result<Vec<UserProfile>> {
        self.lock()?.profiles().map_err(store_failure)
    }

    // ── Sessions ─────────────────────────────────────────────────────────────

    /// Declare a new class session on behalf of `creator`, who must have a
    /// teacher profile.
    pub fn declare_session(
        &self,
        creator: &Address,
        declaration: SessionDeclaration,
        now: u64,
    ) -> Result<Decision<Session>> {
        let mut store = self.lock()?;
        let creator_profile = store.profile(creator).map_err(store_failure)?;
        let decision = session::declare(creator, creator_profile.as_ref(), declaration, &self.config, now);
        let mut session = match decision {
            Decision::Accepted(session) => session,
            Decision::Rejected(reasons) => {
                log::warn!("session declaration by {} rejected: {reasons:?}", creator.short());
                return Ok(Decision::Rejected(reasons));
            }
        };

        session.reference = self.ledger.submit(&Statement::DeclareClassSession { session: &session })?;
        store.insert_session(session.clone()).map_err(store_failure)?;

        log::debug!("declared {} for {}", session.id, session.course_code);
        Ok(Decision::Accepted(session))
    }

    /// Deactivate a session. Only its creator may do so; repeating is a no-op.
    pub fn deactivate_session(&self, actor: &Address, session_id: &SessionId) -> Result<Decision<Session>> {
        let mut store = self.lock()?;
        let Some(mut session) = store.session(session_id).map_err(store_failure)? else {
            return Ok(Decision::Rejected(not_found(session_id)));
        };

        let rejections = session::deactivation_checks(&session, actor);
        if !rejections.is_empty() {
            log::warn!("deactivation of {session_id} by {} rejected", actor.short());
            return Ok(Decision::Rejected(rejections));
        }
        if !session.active {
            return Ok(Decision::Accepted(session));
        }

        self.ledger.submit(&Statement::DeactivateSession { session_id, actor })?;
        session.active = false;
        store.update_session(session.clone()).map_err(store_failure)?;

        log::debug!("deactivated {session_id}");
        Ok(Decision::Accepted(session))
    }

    // ── Check-in ─────────────────────────────────────────────────────────────

    /// Check `student` in at `observed` coordinates.
    ///
    /// Rejected attempts by a registered student bump the per-(session,
    /// student) attempt counter. If the session update fails after the
    /// record was written, the record is removed again.
    pub fn check_in(
        &self,
        session_id: &SessionId,
        student: &Address,
        observed: Coordinates,
        now: u64,
    ) -> Result<Decision<AttendanceRecord>> {
        let mut store = self.lock()?;
        let Some(mut session) = store.session(session_id).map_err(store_failure)? else {
            return Ok(Decision::Rejected(not_found(session_id)));
        };
        let student_profile = store.profile(student).map_err(store_failure)?;
        let existing = store.record_for(session_id, student).map_err(store_failure)?;
        let prior_attempts = store.attempts(session_id, student).map_err(store_failure)?;

        let decision = checkin::check_in(
            &session,
            student,
            student_profile.as_ref(),
            &observed,
            now,
            existing.as_ref(),
            prior_attempts,
            self.config.late_threshold_minutes,
        );

        match decision {
            Decision::Accepted(mut record) => {
                record.reference = self.ledger.submit(&Statement::RecordAttendance { record: &record })?;
                store.insert_record(record.clone()).map_err(store_failure)?;
                session.attendee_count = session.attendee_count.saturating_add(1);
                if let Err(e) = store.update_session(session) {
                    if let Err(undo) = store.remove_record(&record.id) {
                        log::error!("could not remove {} after failed session update: {undo}", record.id);
                    }
                    return Err(store_failure(e));
                }

                log::debug!(
                    "{} checked in to {session_id} as {} ({}m)",
                    student.short(),
                    record.status,
                    record.distance_from_class
                );
                Ok(Decision::Accepted(record))
            }
            Decision::Rejected(reasons) => {
                let codes: Vec<&str> = reasons.iter().map(Rejection::code).collect();
                if student_profile.as_ref().is_some_and(UserProfile::is_student) {
                    let attempts = store.bump_attempts(session_id, student).map_err(store_failure)?;
                    log::warn!(
                        "check-in by {} to {session_id} rejected (attempt {attempts}): {codes:?}",
                        student.short()
                    );
                } else {
                    log::warn!("check-in by {} to {session_id} rejected: {codes:?}", student.short());
                }
                Ok(Decision::Rejected(reasons))
            }
        }
    }

    /// Check in the connected identity at the device's current location.
    ///
    /// The location is acquired before the store lock is taken. A location
    /// failure is returned as `CollaboratorUnavailable` with its message
    /// unchanged; no attempt is counted.
    pub fn check_in_with(
        &self,
        session_id: &SessionId,
        identity: &dyn IdentityProvider,
        location: &dyn LocationProvider,
        now: u64,
    ) -> Result<Decision<AttendanceRecord>> {
        let Some(student) = identity.current_identity() else {
            return Ok(Decision::Rejected(vec![Rejection::InvalidIdentity {
                identity: String::new(),
            }]));
        };
        let observed = location.current_location().map_err(|failure| {
            log::warn!("location unavailable for {}: {failure}", student.short());
            AttendanceError::from(failure)
        })?;
        self.check_in(session_id, &student, observed, now)
    }

    // ── Excuses ──────────────────────────────────────────────────────────────

    /// Submit an excuse for a missed session.
    pub fn submit_excuse(
        &self,
        session_id: &SessionId,
        student: &Address,
        reason: &str,
        now: u64,
    ) -> Result<Decision<ExcuseSubmission>> {
        let mut store = self.lock()?;
        let Some(session) = store.session(session_id).map_err(store_failure)? else {
            return Ok(Decision::Rejected(not_found(session_id)));
        };
        let student_profile = store.profile(student).map_err(store_failure)?;
        let record = store.record_for(session_id, student).map_err(store_failure)?;
        let prior = store.excuse_for(session_id, student).map_err(store_failure)?;

        match excuse::submit(
            &session,
            student,
            student_profile.as_ref(),
            reason,
            now,
            record.as_ref(),
            prior.as_ref(),
        ) {
            Decision::Accepted(mut submission) => {
                submission.reference = self.ledger.submit(&Statement::SubmitExcuse { excuse: &submission })?;
                store.insert_excuse(submission.clone()).map_err(store_failure)?;
                log::debug!("{} submitted {} for {session_id}", student.short(), submission.id);
                Ok(Decision::Accepted(submission))
            }
            Decision::Rejected(reasons) => {
                log::warn!(
                    "excuse by {} for {session_id} rejected: {:?}",
                    student.short(),
                    reasons.iter().map(Rejection::code).collect::<Vec<_>>()
                );
                Ok(Decision::Rejected(reasons))
            }
        }
    }

    /// Whether `student` could submit an excuse for `session_id` right now.
    pub fn can_submit_excuse(&self, session_id: &SessionId, student: &Address, now: u64) -> Result<bool> {
        let store = self.lock()?;
        let Some(session) = store.session(session_id).map_err(store_failure)? else {
            return Ok(false);
        };
        let student_profile = store.profile(student).map_err(store_failure)?;
        let record = store.record_for(session_id, student).map_err(store_failure)?;
        let prior = store.excuse_for(session_id, student).map_err(store_failure)?;
        Ok(excuse::can_submit(
            &session,
            student,
            student_profile.as_ref(),
            now,
            record.as_ref(),
            prior.as_ref(),
        ))
    }

    /// Approve or reject a pending excuse.
    ///
    /// Approval upgrades the student's record to `excused` or creates one.
    /// The record is written before the excuse is marked reviewed; if the
    /// excuse update fails the record write is undone, so the review can be
    /// retried.
    pub fn review_excuse(
        &self,
        excuse_id: &ExcuseId,
        reviewer: &Address,
        verdict: ReviewVerdict,
        notes: Option<&str>,
        now: u64,
    ) -> Result<Decision<ReviewOutcome>> {
        let mut store = self.lock()?;
        let Some(submission) = store.excuse(excuse_id).map_err(store_failure)? else {
            return Ok(Decision::Rejected(vec![Rejection::ExcuseNotFound {
                excuse_id: excuse_id.0.clone(),
            }]));
        };
        let Some(session) = store.session(&submission.session_id).map_err(store_failure)? else {
            return Ok(Decision::Rejected(not_found(&submission.session_id)));
        };
        let existing = store
            .record_for(&submission.session_id, &submission.student)
            .map_err(store_failure)?;

        let mut outcome = match excuse::review(&submission, &session, reviewer, verdict, notes, now, existing.as_ref()) {
            Decision::Accepted(outcome) => outcome,
            Decision::Rejected(reasons) => {
                log::warn!("review of {excuse_id} by {} rejected", reviewer.short());
                return Ok(Decision::Rejected(reasons));
            }
        };

        outcome.reference = self.ledger.submit(&Statement::ReviewExcuse {
            excuse_id,
            reviewer,
            status: outcome.excuse.approval_status,
            notes: outcome.excuse.review_notes.as_deref(),
        })?;

        if let Some(record) = outcome.record.as_mut() {
            if outcome.record_created {
                record.reference = outcome.reference.clone();
                store.insert_record(record.clone()).map_err(store_failure)?;
            } else {
                store.update_record(record.clone()).map_err(store_failure)?;
            }
        }
        if let Err(e) = store.update_excuse(outcome.excuse.clone()) {
            let undo = match (&outcome.record, existing) {
                (Some(created), _) if outcome.record_created => store.remove_record(&created.id),
                (Some(_), Some(previous)) => store.update_record(previous),
                _ => Ok(()),
            };
            if let Err(undo) = undo {
                log::error!("could not restore attendance after failed review of {excuse_id}: {undo}");
            }
            return Err(store_failure(e));
        }

        log::debug!("{excuse_id} {} by {}", outcome.excuse.approval_status, reviewer.short());
        Ok(Decision::Accepted(outcome))
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn session(&self, session_id: &SessionId) -> Result<Option<Session>> {
        self.lock()?.session(session_id).map_err(store_failure)
    }

    pub fn sessions(&self) -> Result<Vec<Session>> {
        self.lock()?.sessions().map_err(store_failure)
    }

    pub fn active_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.sessions()?.into_iter().filter(|s| s.active).collect())
    }

    pub fn sessions_by_creator(&self, creator: &Address) -> Result<Vec<Session>> {
        Ok(self
            .sessions()?
            .into_iter()
            .filter(|s| &s.created_by == creator)
            .collect())
    }

    pub fn session_records(&self, session_id: &SessionId) -> Result<Vec<AttendanceRecord>> {
        self.lock()?.records_for_session(session_id).map_err(store_failure)
    }

    /// Every record for `student`, oldest first.
    pub fn student_history(&self, student: &Address) -> Result<Vec<AttendanceRecord>> {
        self.lock()?.records_for_student(student).map_err(store_failure)
    }

    pub fn session_excuses(&self, session_id: &SessionId) -> Result<Vec<ExcuseSubmission>> {
        self.lock()?.excuses_for_session(session_id).map_err(store_failure)
    }

    pub fn student_excuses(&self, student: &Address) -> Result<Vec<ExcuseSubmission>> {
        self.lock()?.excuses_for_student(student).map_err(store_failure)
    }

    /// Pending excuses for sessions declared by `teacher`.
    pub fn pending_excuses_for(&self, teacher: &Address) -> Result<Vec<ExcuseSubmission>> {
        let snapshot = self.snapshot()?;
        let owned: std::collections::HashSet<&SessionId> = snapshot
            .sessions
            .iter()
            .filter(|s| &s.created_by == teacher)
            .map(|s| &s.id)
            .collect();
        Ok(snapshot
            .excuses
            .iter()
            .filter(|e| e.is_pending() && owned.contains(&e.session_id))
            .cloned()
            .collect())
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot> {
        let store = self.lock()?;
        StoreSnapshot::capture(&*store).map_err(store_failure)
    }

    // ── Reports ──────────────────────────────────────────────────────────────

    pub fn eligibility(&self, student: &Address, course_code: &str) -> Result<ExamEligibility> {
        let snapshot = self.snapshot()?;
        Ok(eligibility::eligibility(
            student,
            course_code,
            &snapshot.sessions,
            &snapshot.records,
            &self.config,
        ))
    }

    pub fn course_summaries(&self, student: &Address) -> Result<Vec<CourseAttendanceSummary>> {
        let snapshot = self.snapshot()?;
        Ok(eligibility::course_summaries(
            student,
            &snapshot.sessions,
            &snapshot.records,
            &self.config,
        ))
    }

    pub fn attendance_stats(&self, student: &Address) -> Result<AttendanceStats> {
        let snapshot = self.snapshot()?;
        Ok(eligibility::attendance_stats(student, &snapshot.sessions, &snapshot.records))
    }
}
