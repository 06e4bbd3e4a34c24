//! User profiles: one per wallet, each with a teacher or student role.
//!
//! The role gates every write: only teachers declare sessions, only
//! students check in and submit excuses.

pub mod engine;
pub mod types;

pub use types::{ProfileId, ProfileRegistration, Role, UserProfile};

pub use engine::{is_valid_email, normalize_email, register, registration_checks, role_checks};
