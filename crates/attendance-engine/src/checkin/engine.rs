//! Check-in engine: the veracity check and record creation.

use sha2::{Digest, Sha256};

use crate::crypto::random::id_nonce;
use crate::geo::{self, Coordinates};
use crate::identity::Address;
use crate::profile::{self, Role, UserProfile};
use crate::rejection::{Decision, Rejection};
use crate::session::Session;
use crate::window::{self, WindowPosition};

use super::types::*;

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

/// Run every check-in rule and collect the failures.
///
/// `existing` is the record already stored for (session, student), if any;
/// `student_profile` is the profile registered for `student`.
pub fn verify_check_in(
    session: &Session,
    student: &Address,
    student_profile: Option<&UserProfile>,
    observed: &Coordinates,
    now: u64,
    existing: Option<&AttendanceRecord>,
) -> CheckInVerification {
    let mut rejections = Vec::new();

    let proximity = geo::within_radius(
        observed,
        &session.coordinates(),
        session.allowed_radius_meters as f64,
    );
    let location_valid = observed.is_valid();
    if !location_valid {
        rejections.push(Rejection::InvalidLocation);
    } else if !proximity.is_valid {
        rejections.push(Rejection::OutOfRange {
            distance_meters: proximity.rounded_meters(),
            allowed_radius_meters: session.allowed_radius_meters,
        });
    }

    let position = window::window_position(now, session.start_time, session.check_in_window_minutes);
    match position {
        WindowPosition::NotOpen => rejections.push(Rejection::WindowNotOpen {
            opens_at: session.start_time,
        }),
        WindowPosition::Closed => rejections.push(Rejection::WindowClosed {
            window_minutes: session.check_in_window_minutes,
            started_at: session.start_time,
        }),
        WindowPosition::Open => {}
    }

    let duplicate = existing.is_some();
    if duplicate {
        rejections.push(Rejection::DuplicateCheckIn);
    }

    let identity_valid = student.is_well_formed();
    if !identity_valid {
        rejections.push(Rejection::InvalidIdentity {
            identity: student.0.clone(),
        });
    }

    rejections.extend(profile::role_checks(student_profile, Role::Student, "check in"));

    if !session.active {
        rejections.push(Rejection::SessionInactive);
    }

    CheckInVerification {
        location_valid,
        within_radius: location_valid && proximity.is_valid,
        distance_meters: proximity.distance_meters,
        window: position,
        duplicate,
        identity_valid,
        session_active: session.active,
        rejections,
    }
}

// ---------------------------------------------------------------------------
// Check in
// ---------------------------------------------------------------------------

/// Decide a check-in attempt.
///
/// `prior_attempts` counts earlier rejected attempts for the same key; the
/// accepted record reports `prior_attempts + 1`. The record's `reference` is
/// left empty for the caller to fill with the ledger token.
#[allow(clippy::too_many_arguments)]
pub fn check_in(
    session: &Session,
    student: &Address,
    student_profile: Option<&UserProfile>,
    observed: &Coordinates,
    now: u64,
    existing: Option<&AttendanceRecord>,
    prior_attempts: u32,
    late_threshold_minutes: u32,
) -> Decision<AttendanceRecord> {
    let verification = verify_check_in(session, student, student_profile, observed, now, existing);
    let distance = geo::round_meters(verification.distance_meters);
    let within_radius = verification.within_radius;

    Decision::from_checks(verification.rejections, || AttendanceRecord {
        id: record_id(session, student, now),
        session_id: session.id.clone(),
        student: student.clone(),
        timestamp: now,
        status: window::classify(now, session.start_time, late_threshold_minutes),
        location: Some(*observed),
        location_verified: within_radius,
        distance_from_class: distance,
        check_in_attempts: prior_attempts.saturating_add(1),
        reference: String::new(),
    })
}

/// `arec_` + base58 of SHA-256 over the session, student, time and a nonce.
pub(crate) fn record_id(session: &Session, student: &Address, now: u64) -> RecordId {
    let mut hasher = Sha256::new();
    hasher.update(session.id.0.as_bytes());
    hasher.update(student.0.as_bytes());
    hasher.update(now.to_be_bytes());
    hasher.update(id_nonce());
    let hash = hasher.finalize();
    RecordId(format!("arec_{}", bs58::encode(&hash[..16]).into_string()))
}
