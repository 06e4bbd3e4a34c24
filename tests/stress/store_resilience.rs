//! Resilience tests: store writes that fail halfway through an operation.
//!
//! A failed write must leave nothing half-applied. The caller sees
//! `CollaboratorUnavailable` and can retry the same operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use attendance_engine::time::{hours, minutes};
use attendance_engine::{
    Address, ApprovalStatus, AttendanceEngine, AttendanceError, AttendanceRecord, AttendanceStatus,
    Coordinates, EngineConfig, EventStore, ExcuseId, ExcuseSubmission, MemoryStore,
    ProfileRegistration, RecordId, Result, ReviewVerdict, Role, Session, SessionDeclaration,
    SessionId, SessionLocation, UserProfile, Wallet,
};

const START: u64 = 1_757_325_600_000_000; // 2025-09-08T10:00:00Z

#[derive(Default)]
struct Faults {
    insert_record: AtomicBool,
    update_session: AtomicBool,
    update_excuse: AtomicBool,
}

fn injected(flag: &AtomicBool, what: &str) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(AttendanceError::StorageError(format!("injected {what} failure")));
    }
    Ok(())
}

/// A [`MemoryStore`] whose writes fail while the matching fault is set.
struct FaultyStore {
    inner: MemoryStore,
    faults: Arc<Faults>,
}

impl EventStore for FaultyStore {
    fn insert_profile(&mut self, profile: UserProfile) -> Result<()> {
        self.inner.insert_profile(profile)
    }

    fn profile(&self, address: &Address) -> Result<Option<UserProfile>> {
        self.inner.profile(address)
    }

    fn profiles(&self) -> Result<Vec<UserProfile>> {
        self.inner.profiles()
    }

    fn insert_session(&mut self, session: Session) -> Result<()> {
        self.inner.insert_session(session)
    }

    fn update_session(&mut self, session: Session) -> Result<()> {
        injected(&self.faults.update_session, "session update")?;
        self.inner.update_session(session)
    }

    fn session(&self, id: &SessionId) -> Result<Option<Session>> {
        self.inner.session(id)
    }

    fn sessions(&self) -> Result<Vec<Session>> {
        self.inner.sessions()
    }

    fn insert_record(&mut self, record: AttendanceRecord) -> Result<()> {
        injected(&self.faults.insert_record, "record insert")?;
        self.inner.insert_record(record)
    }

    fn update_record(&mut self, record: AttendanceRecord) -> Result<()> {
        self.inner.update_record(record)
    }

    fn remove_record(&mut self, id: &RecordId) -> Result<()> {
        self.inner.remove_record(id)
    }

    fn record_for(&self, session_id: &SessionId, student: &Address) -> Result<Option<AttendanceRecord>> {
        self.inner.record_for(session_id, student)
    }

    fn records_for_session(&self, session_id: &SessionId) -> Result<Vec<AttendanceRecord>> {
        self.inner.records_for_session(session_id)
    }

    fn records_for_student(&self, student: &Address) -> Result<Vec<AttendanceRecord>> {
        self.inner.records_for_student(student)
    }

    fn records(&self) -> Result<Vec<AttendanceRecord>> {
        self.inner.records()
    }

    fn insert_excuse(&mut self, excuse: ExcuseSubmission) -> Result<()> {
        self.inner.insert_excuse(excuse)
    }

    fn update_excuse(&mut self, excuse: ExcuseSubmission) -> Result<()> {
        injected(&self.faults.update_excuse, "excuse update")?;
        self.inner.update_excuse(excuse)
    }

    fn excuse(&self, id: &ExcuseId) -> Result<Option<ExcuseSubmission>> {
        self.inner.excuse(id)
    }

    fn excuse_for(&self, session_id: &SessionId, student: &Address) -> Result<Option<ExcuseSubmission>> {
        self.inner.excuse_for(session_id, student)
    }

    fn excuses_for_session(&self, session_id: &SessionId) -> Result<Vec<ExcuseSubmission>> {
        self.inner.excuses_for_session(session_id)
    }

    fn excuses_for_student(&self, student: &Address) -> Result<Vec<ExcuseSubmission>> {
        self.inner.excuses_for_student(student)
    }

    fn excuses(&self) -> Result<Vec<ExcuseSubmission>> {
        self.inner.excuses()
    }

    fn bump_attempts(&mut self, session_id: &SessionId, student: &Address) -> Result<u32> {
        self.inner.bump_attempts(session_id, student)
    }

    fn attempts(&self, session_id: &SessionId, student: &Address) -> Result<u32> {
        self.inner.attempts(session_id, student)
    }
}

struct Setup {
    engine: AttendanceEngine<FaultyStore>,
    faults: Arc<Faults>,
    teacher: Address,
    student: Address,
    session: Session,
}

fn enroll(engine: &AttendanceEngine<FaultyStore>, role: Role) -> Address {
    let address = Wallet::generate(None).address();
    let registration = ProfileRegistration {
        name: "Casey Morgan".into(),
        email: format!("{}@resilience.edu", address.0.to_lowercase()),
        phone: "+1 555 0177".into(),
        institution: "State University".into(),
        department: None,
        student_id: Some("STU-3".into()),
        employee_id: Some("EMP-3".into()),
    };
    engine
        .register_profile(&address, role, registration, 0)
        .unwrap()
        .into_accepted()
        .unwrap();
    address
}

fn setup() -> Setup {
    let faults = Arc::new(Faults::default());
    let store = FaultyStore {
        inner: MemoryStore::new(),
        faults: Arc::clone(&faults),
    };
    let engine = AttendanceEngine::new(store, EngineConfig::default());
    let teacher = enroll(&engine, Role::Teacher);
    let student = enroll(&engine, Role::Student);
    let session = engine
        .declare_session(
            &teacher,
            SessionDeclaration {
                course_code: "CS101".into(),
                course_name: "Computer Science 101".into(),
                description: String::new(),
                start_time: START,
                end_time: START + minutes(90),
                location: SessionLocation::new(40.7128, -74.0060, None),
                allowed_radius_meters: Some(50),
                check_in_window_minutes: Some(10),
                excuse_deadline_hours: Some(48),
            },
            START - hours(1),
        )
        .unwrap()
        .into_accepted()
        .unwrap();
    Setup {
        engine,
        faults,
        teacher,
        student,
        session,
    }
}

fn pending_excuse(s: &Setup) -> ExcuseSubmission {
    s.engine
        .submit_excuse(&s.session.id, &s.student, "Medical appointment", s.session.end_time + hours(1))
        .unwrap()
        .into_accepted()
        .unwrap()
}

#[test]
fn resilience_failed_record_insert_keeps_excuse_pending() {
    let s = setup();
    let excuse = pending_excuse(&s);
    let at = s.session.end_time + hours(2);

    s.faults.insert_record.store(true, Ordering::SeqCst);
    let err = s
        .engine
        .review_excuse(&excuse.id, &s.teacher, ReviewVerdict::Approve, None, at)
        .unwrap_err();
    assert!(matches!(err, AttendanceError::CollaboratorUnavailable(_)), "got {err}");
    assert!(s.engine.student_excuses(&s.student).unwrap()[0].is_pending());
    assert!(s.engine.student_history(&s.student).unwrap().is_empty());

    s.faults.insert_record.store(false, Ordering::SeqCst);
    let outcome = s
        .engine
        .review_excuse(&excuse.id, &s.teacher, ReviewVerdict::Approve, None, at)
        .unwrap()
        .into_accepted()
        .expect("retry after a failed write should be accepted");
    assert_eq!(outcome.excuse.approval_status, ApprovalStatus::Approved);

    let e = s.engine.eligibility(&s.student, "CS101").unwrap();
    assert_eq!(e.attended_sessions, 1);
    assert!(e.is_eligible);
}

#[test]
fn resilience_failed_excuse_update_removes_new_record() {
    let s = setup();
    let excuse = pending_excuse(&s);
    let at = s.session.end_time + hours(2);

    s.faults.update_excuse.store(true, Ordering::SeqCst);
    assert!(s
        .engine
        .review_excuse(&excuse.id, &s.teacher, ReviewVerdict::Approve, None, at)
        .is_err());
    assert!(s.engine.student_history(&s.student).unwrap().is_empty());
    assert!(s.engine.student_excuses(&s.student).unwrap()[0].is_pending());

    s.faults.update_excuse.store(false, Ordering::SeqCst);
    s.engine
        .review_excuse(&excuse.id, &s.teacher, ReviewVerdict::Approve, None, at)
        .unwrap()
        .into_accepted()
        .unwrap();
    let history = s.engine.student_history(&s.student).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, AttendanceStatus::Excused);
}

#[test]
fn resilience_failed_session_update_removes_check_in() {
    let s = setup();
    let class = Coordinates::new(40.7128, -74.0060);

    s.faults.update_session.store(true, Ordering::SeqCst);
    assert!(s.engine.check_in(&s.session.id, &s.student, class, START).is_err());
    assert!(s.engine.session_records(&s.session.id).unwrap().is_empty());
    assert_eq!(s.engine.session(&s.session.id).unwrap().unwrap().attendee_count, 0);

    s.faults.update_session.store(false, Ordering::SeqCst);
    let record = s
        .engine
        .check_in(&s.session.id, &s.student, class, START + minutes(1))
        .unwrap()
        .into_accepted()
        .expect("retry after a failed write should be accepted");
    assert_eq!(record.check_in_attempts, 1);
    assert_eq!(s.engine.session(&s.session.id).unwrap().unwrap().attendee_count, 1);
}
