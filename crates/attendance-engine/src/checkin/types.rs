//! Data structures for attendance records and check-in verification.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::identity::Address;
use crate::rejection::Rejection;
use crate::session::SessionId;
use crate::status::AttendanceStatus;
use crate::window::WindowPosition;

// ---------------------------------------------------------------------------
// Attendance record
// ---------------------------------------------------------------------------

/// Unique identifier for an attendance record (`arec_...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// Attendance of one student at one session.
///
/// At most one exists per (session, student).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub session_id: SessionId,
    pub student: Address,
    /// Check-in time, or the excuse submission time for records created
    /// by excuse approval.
    pub timestamp: u64,
    pub status: AttendanceStatus,
    pub location: Option<Coordinates>,
    pub location_verified: bool,
    /// Distance from the declared location, rounded to whole meters.
    pub distance_from_class: u32,
    pub check_in_attempts: u32,
    /// Ledger reference token.
    pub reference: String,
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Result of the veracity check for one check-in attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInVerification {
    /// Observed coordinates are finite and in range.
    pub location_valid: bool,
    pub within_radius: bool,
    /// Unrounded distance from the declared location.
    pub distance_meters: f64,
    pub window: WindowPosition,
    pub duplicate: bool,
    pub identity_valid: bool,
    pub session_active: bool,
    pub rejections: Vec<Rejection>,
}

impl CheckInVerification {
    pub fn is_valid(&self) -> bool {
        self.rejections.is_empty()
    }
}
