//! Exam eligibility and attendance reporting.
//!
//! Everything here is a pure function of the session and record history:
//! the same input always yields the same output.

pub mod engine;
pub mod types;

pub use types::{AttendanceStats, CourseAttendanceSummary, EligibilityBand, ExamEligibility};

pub use engine::{attendance_stats, course_summaries, eligibility, percentage};
