//! Stress test: many threads race to check in to the same session.
//!
//! Exactly one record per (session, student) must survive, and the session's
//! attendee count must match the number of distinct students.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use attendance_engine::time::{hours, minutes};
use attendance_engine::{
    Address, AttendanceEngine, Coordinates, EngineConfig, MemoryStore, ProfileRegistration, Role,
    SessionDeclaration, SessionId, SessionLocation, Wallet,
};

const START: u64 = 1_757_325_600_000_000; // 2025-09-08T10:00:00Z

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

fn engine_with_session() -> (Arc<AttendanceEngine<MemoryStore>>, SessionId) {
    let engine = AttendanceEngine::new(MemoryStore::new(), EngineConfig::default());
    let teacher = enroll(&engine, Role::Teacher);
    let session = engine
        .declare_session(
            &teacher,
            SessionDeclaration {
                course_code: "CS101".into(),
                course_name: "Computer Science 101".into(),
                description: String::new(),
                start_time: START,
                end_time: START + hours(2),
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
    (Arc::new(engine), session.id)
}

#[test]
fn stress_duplicate_check_ins_single_winner() {
    let (engine, session_id) = engine_with_session();
    let student = enroll(&engine, Role::Student);
    let class = Coordinates::new(40.7128, -74.0060);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let session_id = session_id.clone();
            let student = student.clone();
            thread::spawn(move || {
                engine
                    .check_in(&session_id, &student, class, START + minutes(1) + i)
                    .expect("collaborators should be available")
                    .is_accepted()
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .filter(|ok| *ok)
        .count();

    assert_eq!(accepted, 1, "exactly one concurrent check-in should win");
    assert_eq!(engine.session_records(&session_id).unwrap().len(), 1);
    assert_eq!(engine.session(&session_id).unwrap().unwrap().attendee_count, 1);
}

#[test]
fn stress_200_students_concurrently() {
    let (engine, session_id) = engine_with_session();
    let class = Coordinates::new(40.7128, -74.0060);
    let students: Vec<Address> = (0..200).map(|_| enroll(&engine, Role::Student)).collect();

    thread::scope(|scope| {
        for chunk in students.chunks(25) {
            let engine = &engine;
            let session_id = &session_id;
            scope.spawn(move || {
                for student in chunk {
                    // Every student tries twice; only the first may succeed.
                    let first = engine.check_in(session_id, student, class, START).unwrap();
                    let second = engine.check_in(session_id, student, class, START + 1).unwrap();
                    assert!(first.is_accepted());
                    assert!(second.has_code("duplicate_check_in"));
                }
            });
        }
    });

    let records = engine.session_records(&session_id).unwrap();
    assert_eq!(records.len(), 200);
    let distinct: HashSet<&Address> = records.iter().map(|r| &r.student).collect();
    assert_eq!(distinct.len(), 200);
    assert_eq!(engine.session(&session_id).unwrap().unwrap().attendee_count, 200);
}
