//! Device location collaborators.

use crate::error::AttendanceError;
use crate::geo::Coordinates;

/// Why a location could not be obtained. Messages are shown to users as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationFailure {
    #[error("Location access denied by user")]
    Denied,
    #[error("Location information unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
}

impl From<LocationFailure> for AttendanceError {
    fn from(failure: LocationFailure) -> Self {
        AttendanceError::CollaboratorUnavailable(failure.to_string())
    }
}

/// Source of the device's current position.
pub trait LocationProvider {
    fn current_location(&self) -> Result<Coordinates, LocationFailure>;
}

/// Always reports the same coordinates (e.g. from `--lat/--lon`).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

impl LocationProvider for FixedLocation {
    fn current_location(&self) -> Result<Coordinates, LocationFailure> {
        Ok(self.0)
    }
}

/// Always fails with the given reason.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableLocation(pub LocationFailure);

impl LocationProvider for UnavailableLocation {
    fn current_location(&self) -> Result<Coordinates, LocationFailure> {
        Err(self.0)
    }
}
