//! Check-in verification.
//!
//! The check-in module provides:
//! - The veracity check over location, time, duplication, identity and
//!   session activity
//! - Present/late classification of accepted check-ins
//! - The attendance record created on acceptance

pub mod engine;
pub mod types;

pub use types::{AttendanceRecord, CheckInVerification, RecordId};

pub use engine::{check_in, verify_check_in};
