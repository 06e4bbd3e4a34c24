//! Data structures for eligibility results and attendance summaries.

use serde::{Deserialize, Serialize};

use crate::identity::Address;

/// Eligibility band for one student in one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EligibilityBand {
    Eligible,
    /// Not yet eligible, but at or above the at-risk fraction of the
    /// required percentage.
    AtRisk,
    NotEligible,
}

impl EligibilityBand {
    pub fn as_str(self) -> &'static str {
        match self {
            EligibilityBand::Eligible => "eligible",
            EligibilityBand::AtRisk => "at-risk",
            EligibilityBand::NotEligible => "not-eligible",
        }
    }
}

impl std::fmt::Display for EligibilityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Exam eligibility of one student for one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamEligibility {
    pub student: Address,
    pub course_code: String,
    pub total_sessions: u32,
    /// Sessions attended or excused, each counted once.
    pub attended_sessions: u32,
    pub attendance_percentage: f64,
    pub required_percentage: f64,
    pub is_eligible: bool,
    pub band: EligibilityBand,
    /// Further sessions needed to reach the requirement; `None` when none.
    pub sessions_needed: Option<u32>,
}

/// Per-course attendance breakdown for a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAttendanceSummary {
    pub course_code: String,
    pub course_name: String,
    pub total_sessions: u32,
    /// Present or late.
    pub attended_sessions: u32,
    pub excused_sessions: u32,
    pub missed_sessions: u32,
    pub attendance_percentage: f64,
    pub eligibility: ExamEligibility,
}

/// Attendance of a student across every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub student: Address,
    pub total_sessions: u32,
    /// Present or late.
    pub attended_sessions: u32,
    pub excused_absences: u32,
    pub unexcused_absences: u32,
    pub attendance_rate: f64,
}
