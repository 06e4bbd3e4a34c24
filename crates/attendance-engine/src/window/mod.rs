//! Temporal windows: check-in window, lateness and excuse deadline.
//!
//! All inputs are microseconds since the Unix epoch; durations are given in
//! the units the session declares (minutes for the check-in window, hours
//! for the excuse deadline).

use crate::status::AttendanceStatus;
use crate::time::{hours, minutes};

/// Where `now` falls relative to a session's check-in window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Before the session start.
    NotOpen,
    /// Within `[start, start + window]`.
    Open,
    /// After `start + window`.
    Closed,
}

/// End of the check-in window.
pub fn check_in_closes_at(session_start: u64, window_minutes: u32) -> u64 {
    session_start.saturating_add(minutes(window_minutes as u64))
}

/// Locate `now` relative to the check-in window.
pub fn window_position(now: u64, session_start: u64, window_minutes: u32) -> WindowPosition {
    if now < session_start {
        WindowPosition::NotOpen
    } else if now <= check_in_closes_at(session_start, window_minutes) {
        WindowPosition::Open
    } else {
        WindowPosition::Closed
    }
}

/// True iff `session_start <= now <= session_start + window`.
pub fn in_check_in_window(now: u64, session_start: u64, window_minutes: u32) -> bool {
    window_position(now, session_start, window_minutes) == WindowPosition::Open
}

/// Classify an accepted check-in as present or late.
///
/// Present iff no more than `late_threshold_minutes` have elapsed since the
/// session start. Only called for check-ins inside the window, so the
/// result is never `Absent`.
pub fn classify(now: u64, session_start: u64, late_threshold_minutes: u32) -> AttendanceStatus {
    let elapsed = now.saturating_sub(session_start);
    if elapsed <= minutes(late_threshold_minutes as u64) {
        AttendanceStatus::Present
    } else {
        AttendanceStatus::Late
    }
}

/// Last instant at which an excuse may be submitted.
pub fn excuse_deadline(session_end: u64, deadline_hours: u32) -> u64 {
    session_end.saturating_add(hours(deadline_hours as u64))
}

/// True iff `now <= session_end + deadline_hours`.
pub fn within_excuse_deadline(now: u64, session_end: u64, deadline_hours: u32) -> bool {
    now <= excuse_deadline(session_end, deadline_hours)
}

/// Excuses open strictly after the session has ended.
pub fn session_has_ended(now: u64, session_end: u64) -> bool {
    now > session_end
}
