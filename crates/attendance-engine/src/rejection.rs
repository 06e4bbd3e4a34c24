//! Rule rejections and the accept/reject decision type.
//!
//! A [`Decision`] is the outcome of a write that passed every collaborator
//! call: either the new state, or the full list of rules it broke. Every
//! rule is evaluated, so a single check-in far from class and after the
//! window comes back with both reasons.

use serde::{Deserialize, Serialize};

use crate::excuse::ApprovalStatus;
use crate::profile::Role;
use crate::time::micros_to_clock;

/// Why a write was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Rejection {
    OutOfRange {
        distance_meters: u32,
        allowed_radius_meters: u32,
    },
    WindowNotOpen {
        opens_at: u64,
    },
    WindowClosed {
        window_minutes: u32,
        started_at: u64,
    },
    DuplicateCheckIn,
    /// Observed coordinates were not finite or out of range.
    InvalidLocation,
    InvalidIdentity {
        identity: String,
    },
    SessionInactive,
    SessionNotFound {
        session_id: String,
    },
    AlreadyAttended,
    DuplicateExcuse,
    /// `premature` is set when the session has not ended yet.
    DeadlinePassed {
        deadline_hours: u32,
        session_ended_at: u64,
        premature: bool,
    },
    EmptyReason,
    NotAuthorized {
        action: String,
    },
    AlreadyReviewed {
        status: ApprovalStatus,
    },
    ExcuseNotFound {
        excuse_id: String,
    },
    InvalidSession {
        reason: String,
    },
    ProfileRequired {
        action: String,
    },
    WrongRole {
        required: Role,
        action: String,
    },
    ProfileExists,
    EmailTaken,
    InvalidProfile {
        reason: String,
    },
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::OutOfRange { .. } => "out_of_range",
            Rejection::WindowNotOpen { .. } => "window_not_open",
            Rejection::WindowClosed { .. } => "window_closed",
            Rejection::DuplicateCheckIn => "duplicate_check_in",
            Rejection::InvalidLocation => "invalid_location",
            Rejection::InvalidIdentity { .. } => "invalid_identity",
            Rejection::SessionInactive => "session_inactive",
            Rejection::SessionNotFound { .. } => "session_not_found",
            Rejection::AlreadyAttended => "already_attended",
            Rejection::DuplicateExcuse => "duplicate_excuse",
            Rejection::DeadlinePassed { .. } => "deadline_passed",
            Rejection::EmptyReason => "empty_reason",
            Rejection::NotAuthorized { .. } => "not_authorized",
            Rejection::AlreadyReviewed { .. } => "already_reviewed",
            Rejection::ExcuseNotFound { .. } => "excuse_not_found",
            Rejection::InvalidSession { .. } => "invalid_session",
            Rejection::ProfileRequired { .. } => "profile_required",
            Rejection::WrongRole { .. } => "wrong_role",
            Rejection::ProfileExists => "profile_exists",
            Rejection::EmailTaken => "email_taken",
            Rejection::InvalidProfile { .. } => "invalid_profile",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::OutOfRange {
                distance_meters,
                allowed_radius_meters,
            } => write!(
                f,
                "You are {distance_meters}m away from class location. Maximum allowed distance is {allowed_radius_meters}m."
            ),
            Rejection::WindowNotOpen { opens_at } => write!(
                f,
                "Class hasn't started yet. Check-in opens at {}.",
                micros_to_clock(*opens_at)
            ),
            Rejection::WindowClosed {
                window_minutes,
                started_at,
            } => write!(
                f,
                "Check-in window closed. You had {window_minutes} minutes from {}.",
                micros_to_clock(*started_at)
            ),
            Rejection::DuplicateCheckIn => {
                f.write_str("You have already checked in for this session.")
            }
            Rejection::InvalidLocation => {
                f.write_str("Your reported location is not a valid latitude and longitude.")
            }
            Rejection::InvalidIdentity { .. } => f.write_str("Invalid wallet address."),
            Rejection::SessionInactive => f.write_str("This session is no longer active."),
            Rejection::SessionNotFound { .. } => f.write_str("Session not found."),
            Rejection::AlreadyAttended => f.write_str("You have already attended this session."),
            Rejection::DuplicateExcuse => {
                f.write_str("You have already submitted an excuse for this session.")
            }
            Rejection::DeadlinePassed {
                session_ended_at,
                premature: true,
                ..
            } => write!(
                f,
                "Excuses can only be submitted after the session ends at {}.",
                micros_to_clock(*session_ended_at)
            ),
            Rejection::DeadlinePassed { deadline_hours, .. } => write!(
                f,
                "Excuse submission deadline has passed. You had {deadline_hours} hours after the session ended."
            ),
            Rejection::EmptyReason => f.write_str("Please provide a reason for your absence."),
            Rejection::NotAuthorized { action } => write!(
                f,
                "Only the class checker who declared this session can {action}."
            ),
            Rejection::AlreadyReviewed { status } => {
                write!(f, "This excuse has already been {status}.")
            }
            Rejection::ExcuseNotFound { .. } => f.write_str("Excuse submission not found."),
            Rejection::InvalidSession { reason } => f.write_str(reason),
            Rejection::ProfileRequired { action } => {
                write!(f, "Set up a profile before you {action}.")
            }
            Rejection::WrongRole { required, action } => write!(f, "Only {required}s can {action}."),
            Rejection::ProfileExists => f.write_str("Profile already exists for this wallet address."),
            Rejection::EmailTaken => f.write_str("Email address is already registered."),
            Rejection::InvalidProfile { reason } => f.write_str(reason),
        }
    }
}

/// Outcome of a rule-checked write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "value", rename_all = "snake_case")]
pub enum Decision<T> {
    Accepted(T),
    Rejected(Vec<Rejection>),
}

impl<T> Decision<T> {
    /// Accept `value` if `rejections` is empty, otherwise reject with all of them.
    pub fn from_checks(rejections: Vec<Rejection>, value: impl FnOnce() -> T) -> Self {
        if rejections.is_empty() {
            Decision::Accepted(value())
        } else {
            Decision::Rejected(rejections)
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&T> {
        match self {
            Decision::Accepted(v) => Some(v),
            Decision::Rejected(_) => None,
        }
    }

    pub fn into_accepted(self) -> Option<T> {
        match self {
            Decision::Accepted(v) => Some(v),
            Decision::Rejected(_) => None,
        }
    }

    /// Rejections, empty when accepted.
    pub fn rejections(&self) -> &[Rejection] {
        match self {
            Decision::Accepted(_) => &[],
            Decision::Rejected(r) => r,
        }
    }

    /// Human-readable reasons, one per rejection.
    pub fn reasons(&self) -> Vec<String> {
        self.rejections().iter().map(|r| r.to_string()).collect()
    }

    /// True if any rejection carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.rejections().iter().any(|r| r.code() == code)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decision<U> {
        match self {
            Decision::Accepted(v) => Decision::Accepted(f(v)),
            Decision::Rejected(r) => Decision::Rejected(r),
        }
    }
}
