//! Stress test: eligibility over a full term for a large class.
//!
//! 100 students, 20 CS101 sessions. Student k attends the first `k % 21`
//! sessions, so every attendance count from 0 to 20 appears.

use attendance_engine::eligibility;
use attendance_engine::time::{hours, minutes};
use attendance_engine::{
    Address, AttendanceEngine, Coordinates, EligibilityBand, EngineConfig, MemoryStore,
    ProfileRegistration, Role, Session, SessionDeclaration, SessionLocation, Wallet,
};

const START: u64 = 1_757_325_600_000_000; // 2025-09-08T10:00:00Z
const SESSIONS: u64 = 20;

fn enroll(engine: &AttendanceEngine<MemoryStore>, role: Role) -> Address {
    let address = Wallet::generate(None).address();
    let registration = ProfileRegistration {
        name: "Load Tester".into(),
        email: format!("{}@stress.edu", address.0.to_lowercase()),
        phone: "555".into(),
        institution: "Stress University".into(),
        department: None,
        student_id: Some("S".into()),
        employee_id: Some("E".into()),
    };
    engine
        .register_profile(&address, role, registration, 0)
        .unwrap()
        .into_accepted()
        .unwrap();
    address
}

fn declare_term(engine: &AttendanceEngine<MemoryStore>, teacher: &Address) -> Vec<Session> {
    (0..SESSIONS)
        .map(|day| {
            let start = START + hours(24 * day);
            engine
                .declare_session(
                    teacher,
                    SessionDeclaration {
                        course_code: "CS101".into(),
                        course_name: "Computer Science 101".into(),
                        description: format!("Lecture {}", day + 1),
                        start_time: start,
                        end_time: start + minutes(90),
                        location: SessionLocation::new(40.7128, -74.0060, None),
                        allowed_radius_meters: None,
                        check_in_window_minutes: None,
                        excuse_deadline_hours: None,
                    },
                    start - hours(1),
                )
                .unwrap()
                .into_accepted()
                .unwrap()
        })
        .collect()
}

#[test]
fn stress_term_eligibility_bands() {
    let engine = AttendanceEngine::new(MemoryStore::new(), EngineConfig::default());
    let teacher = enroll(&engine, Role::Teacher);
    let sessions = declare_term(&engine, &teacher);
    let class = Coordinates::new(40.7128, -74.0060);
    let students: Vec<Address> = (0..100).map(|_| enroll(&engine, Role::Student)).collect();

    for (k, student) in students.iter().enumerate() {
        for session in sessions.iter().take(k % 21) {
            engine
                .check_in(&session.id, student, class, session.start_time + minutes(3))
                .unwrap()
                .into_accepted()
                .expect("check-in inside window and radius");
        }
    }

    for (k, student) in students.iter().enumerate() {
        let attended = (k % 21) as u32;
        let e = engine.eligibility(student, "CS101").unwrap();
        assert_eq!(e.total_sessions, 20);
        assert_eq!(e.attended_sessions, attended, "student {k}");
        assert_eq!(e.attendance_percentage, attended as f64 * 5.0);

        let expected_band = if attended >= 15 {
            EligibilityBand::Eligible
        } else if attended >= 12 {
            EligibilityBand::AtRisk
        } else {
            EligibilityBand::NotEligible
        };
        assert_eq!(e.band, expected_band, "student {k} with {attended} sessions");
        assert_eq!(e.is_eligible, attended >= 15);

        let needed = 15u32.saturating_sub(attended);
        assert_eq!(e.sessions_needed, (needed > 0).then_some(needed));
    }
}

#[test]
fn stress_snapshot_matches_pure_fold() {
    let engine = AttendanceEngine::new(MemoryStore::new(), EngineConfig::default());
    let teacher = enroll(&engine, Role::Teacher);
    let sessions = declare_term(&engine, &teacher);
    let class = Coordinates::new(40.7128, -74.0060);
    let student = enroll(&engine, Role::Student);

    for session in sessions.iter().step_by(2) {
        engine
            .check_in(&session.id, &student, class, session.start_time + minutes(8))
            .unwrap()
            .into_accepted()
            .unwrap();
    }

    let snapshot = engine.snapshot().unwrap();
    assert_eq!(snapshot.sessions.len(), 20);
    assert_eq!(snapshot.records.len(), 10);

    let pure = eligibility::eligibility(
        &student,
        "CS101",
        &snapshot.sessions,
        &snapshot.records,
        engine.config(),
    );
    assert_eq!(pure, engine.eligibility(&student, "CS101").unwrap());
    assert_eq!(pure.attendance_percentage, 50.0);
    assert_eq!(pure.band, EligibilityBand::NotEligible);

    let stats = engine.attendance_stats(&student).unwrap();
    assert_eq!(stats.total_sessions, 20);
    assert_eq!(stats.unexcused_absences, 10);
}
