//! Eligibility engine: percentages, bands and per-course folds.

use std::collections::{HashMap, HashSet};

use crate::checkin::AttendanceRecord;
use crate::config::EngineConfig;
use crate::identity::Address;
use crate::session::{Session, SessionId};
use crate::status::AttendanceStatus;

use super::types::*;

/// `part / total × 100`, or 0 when `total` is 0.
pub fn percentage(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Latest status per session for one student, restricted to `session_ids`.
///
/// The store keeps one record per (session, student), so "latest" only
/// matters for hand-assembled inputs.
fn statuses_for<'a>(
    student: &Address,
    session_ids: &HashSet<&'a SessionId>,
    records: &'a [AttendanceRecord],
) -> HashMap<&'a SessionId, AttendanceStatus> {
    let mut statuses = HashMap::new();
    for record in records {
        if &record.student == student && session_ids.contains(&record.session_id) {
            statuses.insert(&record.session_id, record.status);
        }
    }
    statuses
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Compute exam eligibility for `student` in `course_code`.
pub fn eligibility(
    student: &Address,
    course_code: &str,
    sessions: &[Session],
    records: &[AttendanceRecord],
    config: &EngineConfig,
) -> ExamEligibility {
    let course_ids: HashSet<&SessionId> = sessions
        .iter()
        .filter(|s| s.course_code == course_code)
        .map(|s| &s.id)
        .collect();
    let total = course_ids.len() as u32;

    let attended = statuses_for(student, &course_ids, records)
        .values()
        .filter(|status| status.counts_toward_eligibility())
        .count() as u32;

    from_counts(student, course_code, total, attended, config)
}

fn from_counts(
    student: &Address,
    course_code: &str,
    total: u32,
    attended: u32,
    config: &EngineConfig,
) -> ExamEligibility {
    let attendance_percentage = percentage(attended, total);
    let required = config.required_percentage;
    let is_eligible = total > 0 && attendance_percentage >= required;

    let band = if is_eligible {
        EligibilityBand::Eligible
    } else if total > 0 && attendance_percentage >= required * config.at_risk_factor {
        EligibilityBand::AtRisk
    } else {
        EligibilityBand::NotEligible
    };

    let required_sessions = (required * total as f64 / 100.0).ceil() as u32;
    let sessions_needed = required_sessions.saturating_sub(attended);

    ExamEligibility {
        student: student.clone(),
        course_code: course_code.to_string(),
        total_sessions: total,
        attended_sessions: attended,
        attendance_percentage,
        required_percentage: required,
        is_eligible,
        band,
        sessions_needed: (sessions_needed > 0).then_some(sessions_needed),
    }
}

// ---------------------------------------------------------------------------
// Course summaries
// ---------------------------------------------------------------------------

/// One summary per course, in the order each course first appears in
/// `sessions`.
pub fn course_summaries(
    student: &Address,
    sessions: &[Session],
    records: &[AttendanceRecord],
    config: &EngineConfig,
) -> Vec<CourseAttendanceSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_course: HashMap<&str, Vec<&Session>> = HashMap::new();
    for session in sessions {
        let code = session.course_code.as_str();
        by_course
            .entry(code)
            .or_insert_with(|| {
                order.push(code);
                Vec::new()
            })
            .push(session);
    }

    order
        .into_iter()
        .map(|code| {
            let course_sessions = &by_course[code];
            let ids: HashSet<&SessionId> = course_sessions.iter().map(|s| &s.id).collect();
            let total = ids.len() as u32;
            let statuses = statuses_for(student, &ids, records);

            let attended = statuses.values().filter(|s| s.is_attended()).count() as u32;
            let excused = statuses
                .values()
                .filter(|s| **s == AttendanceStatus::Excused)
                .count() as u32;

            CourseAttendanceSummary {
                course_code: code.to_string(),
                course_name: course_sessions[0].course_name.clone(),
                total_sessions: total,
                attended_sessions: attended,
                excused_sessions: excused,
                missed_sessions: total.saturating_sub(attended + excused),
                attendance_percentage: percentage(attended + excused, total),
                eligibility: from_counts(student, code, total, attended + excused, config),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Overall stats
// ---------------------------------------------------------------------------

/// Attendance across every session in `sessions`.
pub fn attendance_stats(
    student: &Address,
    sessions: &[Session],
    records: &[AttendanceRecord],
) -> AttendanceStats {
    let ids: HashSet<&SessionId> = sessions.iter().map(|s| &s.id).collect();
    let total = ids.len() as u32;
    let statuses = statuses_for(student, &ids, records);

    let attended = statuses.values().filter(|s| s.is_attended()).count() as u32;
    let excused = statuses
        .values()
        .filter(|s| **s == AttendanceStatus::Excused)
        .count() as u32;

    AttendanceStats {
        student: student.clone(),
        total_sessions: total,
        attended_sessions: attended,
        excused_absences: excused,
        unexcused_absences: total.saturating_sub(attended + excused),
        attendance_rate: percentage(attended + excused, total),
    }
}
