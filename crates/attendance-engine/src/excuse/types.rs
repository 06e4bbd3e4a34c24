//! Data structures for excuse submissions and reviews.

use serde::{Deserialize, Serialize};

use crate::checkin::AttendanceRecord;
use crate::identity::Address;
use crate::session::SessionId;

/// Unique identifier for an excuse (`aexc_...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExcuseId(pub String);

impl std::fmt::Display for ExcuseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ExcuseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Review state of an excuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A student's excuse for missing one session.
///
/// At most one exists per (session, student). Reviewed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcuseSubmission {
    pub id: ExcuseId,
    pub session_id: SessionId,
    pub student: Address,
    pub reason: String,
    pub submitted_at: u64,
    pub approval_status: ApprovalStatus,
    pub reviewed_by: Option<Address>,
    pub reviewed_at: Option<u64>,
    pub review_notes: Option<String>,
    /// Whether the submission arrived within the deadline.
    pub within_deadline: bool,
    /// Ledger reference token.
    pub reference: String,
}

impl ExcuseSubmission {
    pub fn is_pending(&self) -> bool {
        self.approval_status == ApprovalStatus::Pending
    }
}

/// Teacher's decision on an excuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    Approve,
    Reject,
}

impl ReviewVerdict {
    pub fn status(self) -> ApprovalStatus {
        match self {
            ReviewVerdict::Approve => ApprovalStatus::Approved,
            ReviewVerdict::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// Result of an accepted review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub excuse: ExcuseSubmission,
    /// The record created or upgraded by an approval. `None` on rejection.
    pub record: Option<AttendanceRecord>,
    /// True when `record` was synthesized rather than upgraded.
    pub record_created: bool,
    /// Ledger reference token for the review.
    pub reference: String,
}
