//! Stress test: geographic and temporal edge cases.

use attendance_engine::geo::{distance_meters, offset_north, round_meters, within_radius};
use attendance_engine::time::{hours, minutes};
use attendance_engine::window::{classify, in_check_in_window, within_excuse_deadline};
use attendance_engine::{
    Address, AttendanceEngine, AttendanceStatus, Coordinates, EngineConfig, MemoryStore,
    ProfileRegistration, Rejection, Role, SessionDeclaration, SessionLocation, Wallet,
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

#[test]
fn edge_antipodal_distance_is_half_circumference() {
    let d = distance_meters(0.0, 0.0, 0.0, 180.0);
    let half = std::f64::consts::PI * 6_371_000.0;
    assert!((d - half).abs() < 1.0, "got {d}");
    assert!(distance_meters(90.0, 0.0, -90.0, 0.0).is_finite());
}

#[test]
fn edge_antimeridian_and_poles() {
    let east = Coordinates::new(0.0, 179.9999);
    let west = Coordinates::new(0.0, -179.9999);
    let d = east.distance_to(&west);
    assert!(d > 20.0 && d < 25.0, "crossing the antimeridian is short, got {d}");

    // Any two points at the pole coincide.
    assert!(distance_meters(90.0, 10.0, 90.0, -170.0) < 1e-6);
}

#[test]
fn edge_symmetry_over_grid() {
    let points: Vec<Coordinates> = (-4..=4)
        .flat_map(|i| (-4..=4).map(move |j| Coordinates::new(i as f64 * 20.0, j as f64 * 40.0)))
        .collect();
    for a in &points {
        assert_eq!(a.distance_to(a), 0.0);
        for b in &points {
            assert!((a.distance_to(b) - b.distance_to(a)).abs() < 1e-6);
        }
    }
}

#[test]
fn edge_radius_boundary() {
    let class = Coordinates::new(40.7128, -74.0060);
    assert!(within_radius(&offset_north(&class, 49.9), &class, 50.0).is_valid);
    assert!(!within_radius(&offset_north(&class, 50.1), &class, 50.0).is_valid);
    assert_eq!(round_meters(49.5), 50);
    assert_eq!(round_meters(f64::NAN), 0);
    assert_eq!(round_meters(1e12), u32::MAX);
}

#[test]
fn edge_window_and_deadline_boundaries() {
    assert!(in_check_in_window(START, START, 10));
    assert!(in_check_in_window(START + minutes(10), START, 10));
    assert!(!in_check_in_window(START + minutes(10) + 1, START, 10));

    assert_eq!(classify(START + minutes(5), START, 5), AttendanceStatus::Present);
    assert_eq!(classify(START + minutes(5) + 1, START, 5), AttendanceStatus::Late);

    let end = START + minutes(90);
    assert!(within_excuse_deadline(end + hours(48), end, 48));
    assert!(!within_excuse_deadline(end + hours(48) + 1, end, 48));
    assert!(within_excuse_deadline(u64::MAX, u64::MAX - 10, 1));
}

#[test]
fn edge_engine_boundaries() {
    let engine = AttendanceEngine::new(MemoryStore::new(), EngineConfig::default());
    let teacher = enroll(&engine, Role::Teacher);
    let class = Coordinates::new(-33.8688, 151.2093);

    let declare = |start: u64, window: u32| {
        engine.declare_session(
            &teacher,
            SessionDeclaration {
                course_code: "GEO100".into(),
                course_name: "Physical Geography".into(),
                description: String::new(),
                start_time: start,
                end_time: start + minutes(60),
                location: SessionLocation::new(class.latitude, class.longitude, None),
                allowed_radius_meters: Some(25),
                check_in_window_minutes: Some(window),
                excuse_deadline_hours: Some(1),
            },
            0,
        )
    };

    assert!(declare(START, 0).unwrap().has_code("invalid_session"));
    let session = declare(START, 1).unwrap().into_accepted().unwrap();

    let early = enroll(&engine, Role::Student);
    let d = engine
        .check_in(&session.id, &early, class, START - 1)
        .unwrap();
    assert!(d.has_code("window_not_open"));

    let last_instant = enroll(&engine, Role::Student);
    let record = engine
        .check_in(&session.id, &last_instant, class, START + minutes(1))
        .unwrap()
        .into_accepted()
        .unwrap();
    assert_eq!(record.status, AttendanceStatus::Present);

    let excuse_at_deadline = engine
        .submit_excuse(&session.id, &early, "Train delay", session.end_time + hours(1))
        .unwrap();
    assert!(excuse_at_deadline.is_accepted());
}

#[test]
fn edge_non_finite_observations_rejected() {
    let engine = AttendanceEngine::new(MemoryStore::new(), EngineConfig::default());
    let teacher = enroll(&engine, Role::Teacher);
    let student = enroll(&engine, Role::Student);
    let session = engine
        .declare_session(
            &teacher,
            SessionDeclaration {
                course_code: "GEO100".into(),
                course_name: "Physical Geography".into(),
                description: String::new(),
                start_time: START,
                end_time: START + minutes(60),
                location: SessionLocation::new(0.0, 0.0, None),
                allowed_radius_meters: Some(25),
                check_in_window_minutes: Some(10),
                excuse_deadline_hours: None,
            },
            0,
        )
        .unwrap()
        .into_accepted()
        .unwrap();

    for observed in [
        Coordinates::new(f64::NAN, 0.0),
        Coordinates::new(0.0, f64::NAN),
        Coordinates::new(f64::NEG_INFINITY, 0.0),
        Coordinates::new(0.0, 180.5),
    ] {
        let d = engine.check_in(&session.id, &student, observed, START).unwrap();
        assert_eq!(d.rejections(), &[Rejection::InvalidLocation], "{observed:?}");
    }
    assert!(engine.session_records(&session.id).unwrap().is_empty());
}
