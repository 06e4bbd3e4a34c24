//! Time utilities for the attendance engine.
//!
//! All timestamps are Unix epoch microseconds (u64).

use crate::error::{AttendanceError, Result};

pub const MICROS_PER_SECOND: u64 = 1_000_000;
pub const MICROS_PER_MINUTE: u64 = 60 * MICROS_PER_SECOND;
pub const MICROS_PER_HOUR: u64 = 60 * MICROS_PER_MINUTE;

/// Return the current time as microseconds since Unix epoch.
///
/// A clock set before the epoch reads as 0.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// `n` minutes in microseconds.
pub fn minutes(n: u64) -> u64 {
    n.saturating_mul(MICROS_PER_MINUTE)
}

/// `n` hours in microseconds.
pub fn hours(n: u64) -> u64 {
    n.saturating_mul(MICROS_PER_HOUR)
}

/// Convert microseconds to an RFC 3339 string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / MICROS_PER_SECOND) as i64;
    let nsecs = ((micros % MICROS_PER_SECOND) * 1000) as u32;
    let dt = chrono::DateTime::from_timestamp(secs, nsecs).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}

fn whole_seconds(micros: u64) -> chrono::DateTime<chrono::Utc> {
    let secs = (micros / MICROS_PER_SECOND) as i64;
    chrono::DateTime::from_timestamp(secs, 0).unwrap_or(chrono::DateTime::UNIX_EPOCH)
}

/// Short `HH:MM UTC` rendering used in human-readable rejection messages.
pub fn micros_to_clock(micros: u64) -> String {
    whole_seconds(micros).format("%H:%M UTC").to_string()
}

/// `YYYY-MM-DD HH:MM:SS UTC`, for listings and detail views.
pub fn micros_to_display(micros: u64) -> String {
    whole_seconds(micros).format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Parse an RFC 3339 timestamp into microseconds since Unix epoch.
///
/// # Errors
///
/// Returns `AttendanceError::SerializationError` for malformed input or
/// instants before the epoch.
pub fn rfc3339_to_micros(s: &str) -> Result<u64> {
    let dt = chrono::DateTime::parse_from_rfc3339(s.trim())
        .map_err(|e| AttendanceError::SerializationError(format!("invalid timestamp '{s}': {e}")))?;
    let micros = dt.timestamp_micros();
    u64::try_from(micros).map_err(|_| {
        AttendanceError::SerializationError(format!("timestamp '{s}' is before the Unix epoch"))
    })
}
