//! Session engine: declaration rules and deactivation rules.
//!
//! These functions are pure. The caller supplies the clock and persists
//! whatever they return.

use sha2::{Digest, Sha256};

use crate::config::EngineConfig;
use crate::crypto::random::id_nonce;
use crate::identity::Address;
use crate::profile::{self, Role, UserProfile};
use crate::rejection::{Decision, Rejection};

use super::types::*;

// ---------------------------------------------------------------------------
// Declaration
// ---------------------------------------------------------------------------

/// Check a declaration against the session invariants.
///
/// Every violated rule contributes one rejection. `creator_profile` is the
/// profile registered for `creator`; it must carry the teacher role.
pub fn validate_declaration(
    creator: &Address,
    creator_profile: Option<&UserProfile>,
    declaration: &SessionDeclaration,
    config: &EngineConfig,
) -> Vec<Rejection> {
    let mut rejections = Vec::new();

    if !creator.is_well_formed() {
        rejections.push(Rejection::InvalidIdentity {
            identity: creator.0.clone(),
        });
    }
    rejections.extend(profile::role_checks(
        creator_profile,
        Role::Teacher,
        "declare sessions",
    ));
    if declaration.course_code.trim().is_empty() {
        rejections.push(invalid("Course code is required."));
    }
    if declaration.course_name.trim().is_empty() {
        rejections.push(invalid("Course name is required."));
    }
    if declaration.end_time <= declaration.start_time {
        rejections.push(invalid("Session must end after it starts."));
    }
    if !declaration.location.coordinates().is_valid() {
        rejections.push(invalid(
            "Session location must be a valid latitude and longitude.",
        ));
    }
    if declaration
        .allowed_radius_meters
        .unwrap_or(config.default_radius_meters)
        == 0
    {
        rejections.push(invalid("Allowed radius must be greater than zero."));
    }
    if declaration
        .check_in_window_minutes
        .unwrap_or(config.default_check_in_window_minutes)
        == 0
    {
        rejections.push(invalid("Check-in window must be greater than zero."));
    }
    if declaration
        .excuse_deadline_hours
        .unwrap_or(config.default_excuse_deadline_hours)
        == 0
    {
        rejections.push(invalid("Excuse deadline must be greater than zero."));
    }

    rejections
}

/// Build a new active session from a declaration.
///
/// The returned session carries an empty `reference`; the caller fills it
/// in with the ledger token.
pub fn declare(
    creator: &Address,
    creator_profile: Option<&UserProfile>,
    declaration: SessionDeclaration,
    config: &EngineConfig,
    now: u64,
) -> Decision<Session> {
    let rejections = validate_declaration(creator, creator_profile, &declaration, config);
    Decision::from_checks(rejections, || {
        let id = session_id(creator, &declaration.course_code, declaration.start_time);
        Session {
            id,
            course_code: declaration.course_code.trim().to_string(),
            course_name: declaration.course_name.trim().to_string(),
            description: declaration.description.trim().to_string(),
            start_time: declaration.start_time,
            end_time: declaration.end_time,
            created_by: creator.clone(),
            location: declaration.location,
            allowed_radius_meters: declaration
                .allowed_radius_meters
                .unwrap_or(config.default_radius_meters),
            check_in_window_minutes: declaration
                .check_in_window_minutes
                .unwrap_or(config.default_check_in_window_minutes),
            excuse_deadline_hours: declaration
                .excuse_deadline_hours
                .unwrap_or(config.default_excuse_deadline_hours),
            active: true,
            declared_at: now,
            attendee_count: 0,
            reference: String::new(),
        }
    })
}

// ---------------------------------------------------------------------------
// Deactivation
// ---------------------------------------------------------------------------

/// Only the creator may deactivate a session. Deactivating twice is allowed.
pub fn deactivation_checks(session: &Session, actor: &Address) -> Vec<Rejection> {
    if &session.created_by == actor {
        Vec::new()
    } else {
        vec![Rejection::NotAuthorized {
            action: "deactivate it".into(),
        }]
    }
}

fn invalid(reason: &str) -> Rejection {
    Rejection::InvalidSession {
        reason: reason.to_string(),
    }
}

fn session_id(creator: &Address, course_code: &str, start_time: u64) -> SessionId {
    let mut hasher = Sha256::new();
    hasher.update(creator.0.as_bytes());
    hasher.update(course_code.as_bytes());
    hasher.update(start_time.to_be_bytes());
    hasher.update(id_nonce());
    let hash = hasher.finalize();
    SessionId(format!("ases_{}", bs58::encode(&hash[..16]).into_string()))
}
