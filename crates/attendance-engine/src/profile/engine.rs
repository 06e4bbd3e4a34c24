//! Profile engine: registration rules and role requirements.

use sha2::{Digest, Sha256};

use crate::crypto::random::id_nonce;
use crate::identity::Address;
use crate::rejection::{Decision, Rejection};

use super::types::*;

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Canonical form of an email address used for uniqueness.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Check a registration.
///
/// `existing` is the profile already stored for `address`; `email_taken`
/// reports whether another profile uses the same normalized email.
pub fn registration_checks(
    address: &Address,
    role: Role,
    registration: &ProfileRegistration,
    existing: Option<&UserProfile>,
    email_taken: bool,
) -> Vec<Rejection> {
    let mut rejections = Vec::new();

    if !address.is_well_formed() {
        rejections.push(Rejection::InvalidIdentity {
            identity: address.0.clone(),
        });
    }
    if existing.is_some() {
        rejections.push(Rejection::ProfileExists);
    }

    if registration.name.trim().is_empty() {
        rejections.push(invalid("Full name is required."));
    }
    if registration.email.trim().is_empty() {
        rejections.push(invalid("Email is required."));
    } else if !is_valid_email(&registration.email) {
        rejections.push(invalid("Please enter a valid email address."));
    } else if email_taken {
        rejections.push(Rejection::EmailTaken);
    }
    if registration.phone.trim().is_empty() {
        rejections.push(invalid("Phone number is required."));
    }
    if registration.institution.trim().is_empty() {
        rejections.push(invalid("Institution name is required."));
    }

    match role {
        Role::Student if blank(&registration.student_id) => {
            rejections.push(invalid("Student ID is required."));
        }
        Role::Teacher if blank(&registration.employee_id) => {
            rejections.push(invalid("Employee ID is required."));
        }
        _ => {}
    }

    rejections
}

/// Decide a registration. Text fields are trimmed, the email normalized,
/// and only the identifier matching the role is kept.
pub fn register(
    address: &Address,
    role: Role,
    registration: ProfileRegistration,
    existing: Option<&UserProfile>,
    email_taken: bool,
    now: u64,
) -> Decision<UserProfile> {
    let rejections = registration_checks(address, role, &registration, existing, email_taken);
    Decision::from_checks(rejections, || UserProfile {
        id: profile_id(address, now),
        address: address.clone(),
        role,
        name: registration.name.trim().to_string(),
        email: normalize_email(&registration.email),
        phone: registration.phone.trim().to_string(),
        institution: registration.institution.trim().to_string(),
        department: trimmed(registration.department),
        student_id: match role {
            Role::Student => trimmed(registration.student_id),
            Role::Teacher => None,
        },
        employee_id: match role {
            Role::Teacher => trimmed(registration.employee_id),
            Role::Student => None,
        },
        verified: false,
        created_at: now,
    })
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Require a profile with `role` before `action` (e.g. "check in").
pub fn role_checks(profile: Option<&UserProfile>, role: Role, action: &str) -> Vec<Rejection> {
    match profile {
        None => vec![Rejection::ProfileRequired {
            action: action.to_string(),
        }],
        Some(p) if p.role != role => vec![Rejection::WrongRole {
            required: role,
            action: action.to_string(),
        }],
        Some(_) => Vec::new(),
    }
}

fn invalid(reason: &str) -> Rejection {
    Rejection::InvalidProfile {
        reason: reason.to_string(),
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn profile_id(address: &Address, now: u64) -> ProfileId {
    let mut hasher = Sha256::new();
    hasher.update(address.0.as_bytes());
    hasher.update(now.to_be_bytes());
    hasher.update(id_nonce());
    let hash = hasher.finalize();
    ProfileId(format!("aprf_{}", bs58::encode(&hash[..16]).into_string()))
}
