//! Excuse engine: submission and review rules.

use sha2::{Digest, Sha256};

use crate::checkin::engine::record_id;
use crate::checkin::AttendanceRecord;
use crate::crypto::random::id_nonce;
use crate::identity::Address;
use crate::profile::{self, Role, UserProfile};
use crate::rejection::{Decision, Rejection};
use crate::session::Session;
use crate::status::AttendanceStatus;
use crate::window;

use super::types::*;

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Every submission rule except the reason text.
fn standing_checks(
    session: &Session,
    student: &Address,
    student_profile: Option<&UserProfile>,
    now: u64,
    existing_record: Option<&AttendanceRecord>,
    existing_excuse: Option<&ExcuseSubmission>,
) -> Vec<Rejection> {
    let mut rejections = Vec::new();

    if !student.is_well_formed() {
        rejections.push(Rejection::InvalidIdentity {
            identity: student.0.clone(),
        });
    }
    rejections.extend(profile::role_checks(student_profile, Role::Student, "submit excuses"));

    let ended = window::session_has_ended(now, session.end_time);
    if !ended {
        rejections.push(Rejection::DeadlinePassed {
            deadline_hours: session.excuse_deadline_hours,
            session_ended_at: session.end_time,
            premature: true,
        });
    }

    if existing_record.is_some_and(|r| r.status != AttendanceStatus::Absent) {
        rejections.push(Rejection::AlreadyAttended);
    }

    if existing_excuse.is_some() {
        rejections.push(Rejection::DuplicateExcuse);
    }

    if ended && !window::within_excuse_deadline(now, session.end_time, session.excuse_deadline_hours) {
        rejections.push(Rejection::DeadlinePassed {
            deadline_hours: session.excuse_deadline_hours,
            session_ended_at: session.end_time,
            premature: false,
        });
    }

    rejections
}

/// Run every submission rule against an existing session.
///
/// `existing_record` and `existing_excuse` are the ones stored for
/// (session, student), if any.
pub fn submission_checks(
    session: &Session,
    student: &Address,
    student_profile: Option<&UserProfile>,
    reason: &str,
    now: u64,
    existing_record: Option<&AttendanceRecord>,
    existing_excuse: Option<&ExcuseSubmission>,
) -> Vec<Rejection> {
    let mut rejections = standing_checks(session, student, student_profile, now, existing_record, existing_excuse);
    if reason.trim().is_empty() {
        rejections.push(Rejection::EmptyReason);
    }
    rejections
}

/// Whether a submission with a non-empty reason would be accepted now.
pub fn can_submit(
    session: &Session,
    student: &Address,
    student_profile: Option<&UserProfile>,
    now: u64,
    existing_record: Option<&AttendanceRecord>,
    existing_excuse: Option<&ExcuseSubmission>,
) -> bool {
    standing_checks(session, student, student_profile, now, existing_record, existing_excuse).is_empty()
}

/// Decide an excuse submission. The stored reason is trimmed and the
/// `reference` is left empty for the ledger token.
pub fn submit(
    session: &Session,
    student: &Address,
    student_profile: Option<&UserProfile>,
    reason: &str,
    now: u64,
    existing_record: Option<&AttendanceRecord>,
    existing_excuse: Option<&ExcuseSubmission>,
) -> Decision<ExcuseSubmission> {
    let rejections = submission_checks(session, student, student_profile, reason, now, existing_record, existing_excuse);
    Decision::from_checks(rejections, || ExcuseSubmission {
        id: excuse_id(session, student, now),
        session_id: session.id.clone(),
        student: student.clone(),
        reason: reason.trim().to_string(),
        submitted_at: now,
        approval_status: ApprovalStatus::Pending,
        reviewed_by: None,
        reviewed_at: None,
        review_notes: None,
        within_deadline: true,
        reference: String::new(),
    })
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// Only the session's creator may review, and only once.
pub fn review_checks(excuse: &ExcuseSubmission, session: &Session, reviewer: &Address) -> Vec<Rejection> {
    let mut rejections = Vec::new();
    if !excuse.is_pending() {
        rejections.push(Rejection::AlreadyReviewed {
            status: excuse.approval_status,
        });
    }
    if &session.created_by != reviewer {
        rejections.push(Rejection::NotAuthorized {
            action: "review its excuses".into(),
        });
    }
    rejections
}

/// Decide a review.
///
/// On approval the student's record is upgraded to `excused` (only its
/// status changes), or a new `excused` record is synthesized with the
/// excuse's submission time, no location and zero distance and attempts.
pub fn review(
    excuse: &ExcuseSubmission,
    session: &Session,
    reviewer: &Address,
    verdict: ReviewVerdict,
    notes: Option<&str>,
    now: u64,
    existing_record: Option<&AttendanceRecord>,
) -> Decision<ReviewOutcome> {
    let rejections = review_checks(excuse, session, reviewer);
    Decision::from_checks(rejections, || {
        let mut reviewed = excuse.clone();
        reviewed.approval_status = verdict.status();
        reviewed.reviewed_by = Some(reviewer.clone());
        reviewed.reviewed_at = Some(now);
        reviewed.review_notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let (record, record_created) = match (verdict, existing_record) {
            (ReviewVerdict::Reject, _) => (None, false),
            (ReviewVerdict::Approve, Some(existing)) => {
                let mut upgraded = existing.clone();
                if upgraded.status.can_transition_to(AttendanceStatus::Excused) {
                    upgraded.status = AttendanceStatus::Excused;
                }
                (Some(upgraded), false)
            }
            (ReviewVerdict::Approve, None) => (
                Some(AttendanceRecord {
                    id: record_id(session, &excuse.student, excuse.submitted_at),
                    session_id: session.id.clone(),
                    student: excuse.student.clone(),
                    timestamp: excuse.submitted_at,
                    status: AttendanceStatus::Excused,
                    location: None,
                    location_verified: false,
                    distance_from_class: 0,
                    check_in_attempts: 0,
                    reference: String::new(),
                }),
                true,
            ),
        };

        ReviewOutcome {
            excuse: reviewed,
            record,
            record_created,
            reference: String::new(),
        }
    })
}

fn excuse_id(session: &Session, student: &Address, now: u64) -> ExcuseId {
    let mut hasher = Sha256::new();
    hasher.update(session.id.0.as_bytes());
    hasher.update(student.0.as_bytes());
    hasher.update(now.to_be_bytes());
    hasher.update(id_nonce());
    let hash = hasher.finalize();
    ExcuseId(format!("aexc_{}", bs58::encode(&hash[..16]).into_string()))
}
