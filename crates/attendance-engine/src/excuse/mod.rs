//! Excuse workflow: submission, deadline enforcement and teacher review.
//!
//! ```text
//!   (none) ──submit──▶ pending ──review──▶ approved | rejected
//! ```
//!
//! Approval materializes an `excused` attendance record, or upgrades the
//! student's present/late record to `excused`.

pub mod engine;
pub mod types;

pub use types::{ApprovalStatus, ExcuseId, ExcuseSubmission, ReviewOutcome, ReviewVerdict};

pub use engine::{can_submit, review, review_checks, submission_checks, submit};
