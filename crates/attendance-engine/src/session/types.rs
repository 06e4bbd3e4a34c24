//! Data structures for class sessions.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::identity::Address;
use crate::window;

/// Unique identifier for a session.
///
/// Format: `ases_` + base58 of the first 16 bytes of SHA-256 over the
/// creator, course code, start time and a random nonce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Declared class location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Room or building name, e.g. "Room 204, Science Building".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SessionLocation {
    pub fn new(latitude: f64, longitude: f64, label: Option<String>) -> Self {
        Self {
            latitude,
            longitude,
            label,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A class session as declared by a teacher.
///
/// Immutable after declaration except for `active` and `attendee_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub course_code: String,
    pub course_name: String,
    #[serde(default)]
    pub description: String,
    pub start_time: u64,
    pub end_time: u64,
    pub created_by: Address,
    pub location: SessionLocation,
    pub allowed_radius_meters: u32,
    pub check_in_window_minutes: u32,
    pub excuse_deadline_hours: u32,
    pub active: bool,
    pub declared_at: u64,
    /// Number of accepted check-ins. Derived, not authoritative.
    pub attendee_count: u32,
    /// Ledger reference token for the declaration.
    pub reference: String,
}

impl Session {
    pub fn coordinates(&self) -> Coordinates {
        self.location.coordinates()
    }

    pub fn check_in_closes_at(&self) -> u64 {
        window::check_in_closes_at(self.start_time, self.check_in_window_minutes)
    }

    pub fn excuse_deadline(&self) -> u64 {
        window::excuse_deadline(self.end_time, self.excuse_deadline_hours)
    }

    pub fn duration_minutes(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time) / crate::time::MICROS_PER_MINUTE
    }
}

/// Input to [`declare`](super::engine::declare). Omitted policy values fall
/// back to the configured defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDeclaration {
    pub course_code: String,
    pub course_name: String,
    #[serde(default)]
    pub description: String,
    pub start_time: u64,
    pub end_time: u64,
    pub location: SessionLocation,
    #[serde(default)]
    pub allowed_radius_meters: Option<u32>,
    #[serde(default)]
    pub check_in_window_minutes: Option<u32>,
    #[serde(default)]
    pub excuse_deadline_hours: Option<u32>,
}
