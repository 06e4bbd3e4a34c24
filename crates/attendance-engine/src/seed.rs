//! Demo data: a small history for one teacher and one student.
//!
//! Both get a demo profile unless they already have one. Everything goes
//! through the engine, so the seeded history obeys the same
//! rules as live use and carries real ledger references. Times are relative
//! to `now`:
//!
//! | course  | start        | state                          |
//! |---------|--------------|--------------------------------|
//! | CS101   | now - 7 days | ended, student present         |
//! | MATH201 | now - 5 days | ended, excuse approved         |
//! | PHYS301 | now - 3 h    | ended, student present         |
//! | CS101   | now - 30 min | running, window closed         |
//! | MATH201 | now + 1 h    | upcoming                       |

use serde::Serialize;

use crate::checkin::AttendanceRecord;
use crate::error::{AttendanceError, Result};
use crate::excuse::{ExcuseSubmission, ReviewVerdict};
use crate::geo::{self, Coordinates};
use crate::identity::Address;
use crate::ledger::Ledger;
use crate::profile::{ProfileRegistration, Role, UserProfile};
use crate::rejection::Decision;
use crate::session::{Session, SessionDeclaration, SessionLocation};
use crate::storage::EventStore;
use crate::time::{hours, minutes};
use crate::AttendanceEngine;

/// What `seed_demo` created.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub profiles: Vec<UserProfile>,
    pub sessions: Vec<Session>,
    pub records: Vec<AttendanceRecord>,
    pub excuses: Vec<ExcuseSubmission>,
}

struct DemoSession {
    course_code: &'static str,
    course_name: &'static str,
    description: &'static str,
    label: &'static str,
    latitude: f64,
    longitude: f64,
    radius: u32,
    window: u32,
    /// Offset of the start from `now`, in minutes.
    start_offset_minutes: i64,
    duration_minutes: u64,
}

const DEMO_SESSIONS: [DemoSession; 5] = [
    DemoSession {
        course_code: "CS101",
        course_name: "Computer Science 101",
        description: "Data Structures and Algorithms",
        label: "Computer Science Building, Room 102",
        latitude: 40.7128,
        longitude: -74.0060,
        radius: 50,
        window: 10,
        start_offset_minutes: -7 * 24 * 60,
        duration_minutes: 90,
    },
    DemoSession {
        course_code: "MATH201",
        course_name: "Advanced Mathematics",
        description: "Differential Equations",
        label: "Mathematics Hall, Room 206",
        latitude: 40.7589,
        longitude: -73.9851,
        radius: 30,
        window: 15,
        start_offset_minutes: -5 * 24 * 60,
        duration_minutes: 90,
    },
    DemoSession {
        course_code: "PHYS301",
        course_name: "Advanced Physics",
        description: "Quantum Mechanics and Relativity",
        label: "Physics Laboratory, Room 301",
        latitude: 40.7505,
        longitude: -73.9934,
        radius: 40,
        window: 10,
        start_offset_minutes: -180,
        duration_minutes: 90,
    },
    DemoSession {
        course_code: "CS101",
        course_name: "Computer Science 101",
        description: "Introduction to Programming",
        label: "Computer Science Building, Room 101",
        latitude: 40.7128,
        longitude: -74.0060,
        radius: 50,
        window: 10,
        start_offset_minutes: -30,
        duration_minutes: 120,
    },
    DemoSession {
        course_code: "MATH201",
        course_name: "Advanced Mathematics",
        description: "Advanced Calculus and Linear Algebra",
        label: "Mathematics Hall, Room 205",
        latitude: 40.7589,
        longitude: -73.9851,
        radius: 30,
        window: 15,
        start_offset_minutes: 60,
        duration_minutes: 90,
    },
];

fn offset(now: u64, offset_minutes: i64) -> u64 {
    let delta = minutes(offset_minutes.unsigned_abs());
    if offset_minutes < 0 {
        now.saturating_sub(delta)
    } else {
        now.saturating_add(delta)
    }
}

fn accepted<T>(decision: Decision<T>, what: &str) -> Result<T> {
    match decision {
        Decision::Accepted(value) => Ok(value),
        Decision::Rejected(reasons) => {
            let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
            Err(AttendanceError::StorageError(format!(
                "demo {what} rejected: {}",
                reasons.join(" ")
            )))
        }
    }
}

fn demo_registration(address: &Address, role: Role) -> ProfileRegistration {
    let tag: String = address.0.chars().take(8).collect::<String>().to_ascii_lowercase();
    match role {
        Role::Teacher => ProfileRegistration {
            name: "Dr. Maria Rivera".into(),
            email: format!("teacher.{tag}@demo.edu"),
            phone: "+1 555 0100".into(),
            institution: "Demo University".into(),
            department: Some("Computer Science".into()),
            student_id: None,
            employee_id: Some("EMP-1001".into()),
        },
        Role::Student => ProfileRegistration {
            name: "Alex Johnson".into(),
            email: format!("student.{tag}@demo.edu"),
            phone: "+1 555 0101".into(),
            institution: "Demo University".into(),
            department: Some("Computer Science".into()),
            student_id: Some("STU-2024-001".into()),
            employee_id: None,
        },
    }
}

/// Populate `engine` with the demo history.
pub fn seed_demo<S: EventStore, L: Ledger>(
    engine: &AttendanceEngine<S, L>,
    teacher: &Address,
    student: &Address,
    now: u64,
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for (address, role) in [(teacher, Role::Teacher), (student, Role::Student)] {
        if engine.profile(address)?.is_none() {
            let registration = demo_registration(address, role);
            let decision = engine.register_profile(address, role, registration, now)?;
            report.profiles.push(accepted(decision, "profile")?);
        }
    }

    for demo in &DEMO_SESSIONS {
        let start = offset(now, demo.start_offset_minutes);
        let declaration = SessionDeclaration {
            course_code: demo.course_code.into(),
            course_name: demo.course_name.into(),
            description: demo.description.into(),
            start_time: start,
            end_time: start + minutes(demo.duration_minutes),
            location: SessionLocation::new(demo.latitude, demo.longitude, Some(demo.label.into())),
            allowed_radius_meters: Some(demo.radius),
            check_in_window_minutes: Some(demo.window),
            excuse_deadline_hours: Some(48),
        };
        let decision = engine.declare_session(teacher, declaration, start.saturating_sub(minutes(15)))?;
        report.sessions.push(accepted(decision, "session")?);
    }

    let [cs_past, math_past, phys, ..] = &report.sessions[..] else {
        return Ok(report);
    };
    let (cs_past, math_past, phys) = (cs_past.clone(), math_past.clone(), phys.clone());

    for (session, meters) in [(&cs_past, 12.0), (&phys, 15.0)] {
        let class = Coordinates::new(session.location.latitude, session.location.longitude);
        let here = geo::offset_north(&class, meters);
        let decision = engine.check_in(&session.id, student, here, session.start_time + minutes(1))?;
        report.records.push(accepted(decision, "check-in")?);
    }

    let submitted_at = math_past.end_time + hours(22);
    let excuse = accepted(
        engine.submit_excuse(
            &math_past.id,
            student,
            "Medical appointment - had to visit the doctor for a scheduled check-up",
            submitted_at,
        )?,
        "excuse",
    )?;
    let outcome = accepted(
        engine.review_excuse(
            &excuse.id,
            teacher,
            ReviewVerdict::Approve,
            Some("Valid medical excuse with documentation provided."),
            submitted_at + hours(2),
        )?,
        "review",
    )?;
    report.records.extend(outcome.record);
    report.excuses.push(outcome.excuse);

    for session in report.sessions.iter_mut() {
        if session.end_time < now {
            *session = accepted(engine.deactivate_session(teacher, &session.id)?, "deactivation")?;
        }
    }

    log::info!(
        "seeded {} profiles, {} sessions, {} records, {} excuses",
        report.profiles.len(),
        report.sessions.len(),
        report.records.len(),
        report.excuses.len()
    );
    Ok(report)
}
