//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Create wallets and profiles for a teacher and two students
//! 2. Declare sessions over a term
//! 3. Check in (present, late, rejected attempts)
//! 4. Submit and review excuses
//! 5. Compute eligibility and summaries
//! 6. Verify the signed journal

use attendance_engine::geo::offset_north;
use attendance_engine::time::{hours, minutes, rfc3339_to_micros};
use attendance_engine::{
    Address, AttendanceEngine, AttendanceStatus, Coordinates, EligibilityBand, EngineConfig, Ledger,
    MemoryStore, ProfileRegistration, ReviewVerdict, Role, Session, SessionDeclaration,
    SessionLocation, SigningLedger, Wallet,
};

fn class_point() -> Coordinates {
    Coordinates::new(40.7128, -74.0060)
}

fn register<L: Ledger>(engine: &AttendanceEngine<MemoryStore, L>, who: &Address, name: &str, role: Role) {
    let registration = ProfileRegistration {
        name: name.to_string(),
        email: format!("{}@university.edu", name.to_lowercase()),
        phone: "+1 555 0100".into(),
        institution: "State University".into(),
        department: Some("Computer Science".into()),
        student_id: Some(format!("STU-{name}")),
        employee_id: Some(format!("EMP-{name}")),
    };
    let profile = engine
        .register_profile(who, role, registration, 0)
        .unwrap()
        .into_accepted()
        .expect("registration should be accepted");
    assert_eq!(profile.role, role);
}

fn declaration(course: &str, start: u64) -> SessionDeclaration {
    SessionDeclaration {
        course_code: course.to_string(),
        course_name: format!("{course} lecture"),
        description: String::new(),
        start_time: start,
        end_time: start + minutes(90),
        location: SessionLocation::new(40.7128, -74.0060, Some("Room 101".into())),
        allowed_radius_meters: Some(50),
        check_in_window_minutes: Some(10),
        excuse_deadline_hours: Some(48),
    }
}

#[test]
fn full_workflow_term_to_eligibility() {
    // ── Step 1: Wallets and profiles ────────────────────────────────────
    let teacher_wallet = Wallet::generate(Some("teacher".into()));
    let teacher = teacher_wallet.address();
    let alice = Wallet::generate(Some("alice".into())).address();
    let bob = Wallet::generate(Some("bob".into())).address();
    assert_ne!(alice, bob);

    let journal = tempfile::tempdir().unwrap();
    let ledger = SigningLedger::new(teacher_wallet, journal.path()).unwrap();
    let engine = AttendanceEngine::with_ledger(MemoryStore::new(), ledger, EngineConfig::default());
    register(&engine, &teacher, "Rivera", Role::Teacher);
    register(&engine, &alice, "Alice", Role::Student);
    register(&engine, &bob, "Bob", Role::Student);
    assert_eq!(engine.profiles().unwrap().len(), 3);

    // ── Step 2: Four CS101 sessions, one per day ────────────────────────
    let first = rfc3339_to_micros("2025-09-08T10:00:00Z").unwrap();
    let sessions: Vec<Session> = (0..4)
        .map(|day| {
            let start = first + hours(24 * day);
            engine
                .declare_session(&teacher, declaration("CS101", start), start - hours(1))
                .unwrap()
                .into_accepted()
                .expect("declaration should be accepted")
        })
        .collect();
    assert_eq!(engine.sessions().unwrap().len(), 4);

    // ── Step 3: Check-ins ───────────────────────────────────────────────
    // Alice: present, late, excused, missing.
    let near = offset_north(&class_point(), 30.0);
    let r0 = engine
        .check_in(&sessions[0].id, &alice, near, sessions[0].start_time + minutes(2))
        .unwrap()
        .into_accepted()
        .unwrap();
    assert_eq!(r0.status, AttendanceStatus::Present);
    assert_eq!(r0.distance_from_class, 30);

    let too_far = offset_north(&class_point(), 120.0);
    let rejected = engine
        .check_in(&sessions[1].id, &alice, too_far, sessions[1].start_time + minutes(1))
        .unwrap();
    assert!(rejected.has_code("out_of_range"));

    let r1 = engine
        .check_in(&sessions[1].id, &alice, near, sessions[1].start_time + minutes(7))
        .unwrap()
        .into_accepted()
        .unwrap();
    assert_eq!(r1.status, AttendanceStatus::Late);
    assert_eq!(r1.check_in_attempts, 2);

    // Bob: present only in the first session.
    engine
        .check_in(&sessions[0].id, &bob, class_point(), sessions[0].start_time)
        .unwrap()
        .into_accepted()
        .unwrap();

    // Too late for anyone.
    let late = engine
        .check_in(&sessions[2].id, &bob, class_point(), sessions[2].start_time + minutes(15))
        .unwrap();
    assert!(late.has_code("window_closed"));

    // ── Step 4: Excuses ─────────────────────────────────────────────────
    let premature = engine
        .submit_excuse(&sessions[2].id, &alice, "Sick", sessions[2].end_time)
        .unwrap();
    assert!(premature.has_code("deadline_passed"));

    let excuse = engine
        .submit_excuse(&sessions[2].id, &alice, "Sick", sessions[2].end_time + hours(3))
        .unwrap()
        .into_accepted()
        .unwrap();
    assert_eq!(engine.pending_excuses_for(&teacher).unwrap().len(), 1);

    let not_teacher = engine
        .review_excuse(&excuse.id, &alice, ReviewVerdict::Approve, None, sessions[2].end_time + hours(4))
        .unwrap();
    assert!(not_teacher.has_code("not_authorized"));

    let outcome = engine
        .review_excuse(
            &excuse.id,
            &teacher,
            ReviewVerdict::Approve,
            Some("Doctor's note"),
            sessions[2].end_time + hours(5),
        )
        .unwrap()
        .into_accepted()
        .unwrap();
    assert!(outcome.record_created);
    assert_eq!(outcome.record.as_ref().unwrap().reference, outcome.reference);

    let expired = engine
        .submit_excuse(&sessions[3].id, &bob, "Overslept", sessions[3].end_time + hours(50))
        .unwrap();
    assert!(expired.has_code("deadline_passed"));

    // ── Step 5: Eligibility ─────────────────────────────────────────────
    let a = engine.eligibility(&alice, "CS101").unwrap();
    assert_eq!(a.attended_sessions, 3);
    assert_eq!(a.attendance_percentage, 75.0);
    assert!(a.is_eligible);
    assert_eq!(a.sessions_needed, None);

    let b = engine.eligibility(&bob, "CS101").unwrap();
    assert_eq!(b.attendance_percentage, 25.0);
    assert_eq!(b.band, EligibilityBand::NotEligible);
    assert_eq!(b.sessions_needed, Some(2));

    let summary = &engine.course_summaries(&alice).unwrap()[0];
    assert_eq!(summary.attended_sessions, 2);
    assert_eq!(summary.excused_sessions, 1);
    assert_eq!(summary.missed_sessions, 1);

    let stats = engine.attendance_stats(&alice).unwrap();
    assert_eq!(stats.excused_absences, 1);
    assert_eq!(stats.unexcused_absences, 1);

    // ── Step 6: Journal ─────────────────────────────────────────────────
    // 4 declarations, 3 check-ins, 1 excuse, 1 review. Profiles are not journaled.
    let ledger = engine.ledger();
    let tokens = ledger.tokens().unwrap();
    assert_eq!(tokens.len(), 9);
    for token in &tokens {
        let entry = ledger.load(token).unwrap();
        assert!(entry.verify().is_ok(), "journal entry {token} should verify");
        assert_eq!(entry.signer, teacher);
    }
    let declared = ledger.load(&sessions[0].reference).unwrap();
    assert_eq!(declared.kind, "DECLARE_CLASS_SESSION");
}

#[test]
fn full_workflow_excuse_over_late_record() {
    let teacher = Wallet::generate(None).address();
    let student = Wallet::generate(None).address();
    let engine = AttendanceEngine::new(MemoryStore::new(), EngineConfig::default());
    register(&engine, &teacher, "Nguyen", Role::Teacher);
    register(&engine, &student, "Dana", Role::Student);

    let start = rfc3339_to_micros("2025-10-01T09:00:00Z").unwrap();
    let session = engine
        .declare_session(&teacher, declaration("MATH201", start), start)
        .unwrap()
        .into_accepted()
        .unwrap();

    let late = engine
        .check_in(&session.id, &student, class_point(), start + minutes(9))
        .unwrap()
        .into_accepted()
        .unwrap();
    assert_eq!(late.status, AttendanceStatus::Late);

    // A late student has attended; excuses are refused.
    let refused = engine
        .submit_excuse(&session.id, &student, "Traffic", session.end_time + hours(1))
        .unwrap();
    assert!(refused.has_code("already_attended"));
    assert!(!engine
        .can_submit_excuse(&session.id, &student, session.end_time + hours(1))
        .unwrap());

    let history = engine.student_history(&student).unwrap();
    assert_eq!(history, vec![late]);
}
