//! Engine policy configuration.
//!
//! Every field has a default matching the institutional policy constants,
//! so an empty or partial `config.json` is valid:
//!
//! ```json
//! { "required_percentage": 80.0, "default_radius_meters": 30 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, Result};

/// Policy knobs consumed by the check-in, excuse and eligibility engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attendance percentage required for exam eligibility.
    pub required_percentage: f64,
    /// Fraction of `required_percentage` at or above which a student who is
    /// not yet eligible is reported as at-risk instead of not-eligible.
    pub at_risk_factor: f64,
    /// Minutes after session start up to which a check-in counts as present.
    pub late_threshold_minutes: u32,
    /// Radius used when a declaration omits one.
    pub default_radius_meters: u32,
    /// Check-in window used when a declaration omits one.
    pub default_check_in_window_minutes: u32,
    /// Excuse deadline used when a declaration omits one.
    pub default_excuse_deadline_hours: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            required_percentage: 75.0,
            at_risk_factor: 0.8,
            late_threshold_minutes: 5,
            default_radius_meters: 50,
            default_check_in_window_minutes: 10,
            default_excuse_deadline_hours: 48,
        }
    }
}

impl EngineConfig {
    /// Load a config file, falling back to defaults when `path` does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AttendanceError::InvalidFileFormat` if the file exists but is
    /// not valid JSON for this struct, or `AttendanceError::Io` if it cannot
    /// be read.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let bytes = std::fs::read(path)?;
        let config: EngineConfig = serde_json::from_slice(&bytes).map_err(|e| {
            AttendanceError::InvalidFileFormat(format!(
                "failed to parse config {}: {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the policy meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.required_percentage > 0.0 && self.required_percentage <= 100.0) {
            return Err(AttendanceError::InvalidFileFormat(format!(
                "required_percentage must be in (0, 100], got {}",
                self.required_percentage
            )));
        }
        if !(self.at_risk_factor > 0.0 && self.at_risk_factor <= 1.0) {
            return Err(AttendanceError::InvalidFileFormat(format!(
                "at_risk_factor must be in (0, 1], got {}",
                self.at_risk_factor
            )));
        }
        if self.default_radius_meters == 0
            || self.default_check_in_window_minutes == 0
            || self.default_excuse_deadline_hours == 0
        {
            return Err(AttendanceError::InvalidFileFormat(
                "default radius, window and deadline must be > 0".into(),
            ));
        }
        Ok(())
    }
}
