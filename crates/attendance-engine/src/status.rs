//! Attendance status and its allowed transitions.
//!
//! ```text
//!   ∅ ──check-in──▶ present ─┐
//!   ∅ ──check-in──▶ late ────┼─excuse approved─▶ excused
//!   ∅ ──excuse approved──────┘
//! ```
//!
//! `Absent` is never stored by the engine. It is the implicit state of a
//! session that ended with no record and no approved excuse, and reports
//! derive it as `total - attended - excused`.

use serde::{Deserialize, Serialize};

/// Outcome recorded for one (session, student) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Excused,
}

impl AttendanceStatus {
    /// Physically checked in (present or late).
    pub fn is_attended(self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }

    /// Counts toward exam eligibility (present, late or excused).
    pub fn counts_toward_eligibility(self) -> bool {
        self.is_attended() || self == AttendanceStatus::Excused
    }

    /// Whether a stored record may move from `self` to `next`.
    pub fn can_transition_to(self, next: AttendanceStatus) -> bool {
        matches!(
            (self, next),
            (AttendanceStatus::Present, AttendanceStatus::Excused)
                | (AttendanceStatus::Late, AttendanceStatus::Excused)
        )
    }

    /// Statuses a brand-new record may be created with.
    pub fn is_valid_initial(self) -> bool {
        self != AttendanceStatus::Absent
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Excused => "excused",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}
