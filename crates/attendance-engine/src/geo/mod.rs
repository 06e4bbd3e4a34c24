//! Geo proximity: great-circle distance and radius containment.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS-84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite, latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Haversine distance to `other`, in meters.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        distance_meters(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Result of a radius containment test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityCheck {
    /// True iff the distance is at most the allowed radius.
    pub is_valid: bool,
    /// Unrounded haversine distance in meters.
    pub distance_meters: f64,
}

impl ProximityCheck {
    /// Distance rounded to the nearest whole meter, as shown to students.
    pub fn rounded_meters(&self) -> u32 {
        round_meters(self.distance_meters)
    }
}

/// Great-circle distance between two points in meters.
///
/// Never panics; for finite input the result is finite and within
/// `[0, π·R]`. The `a` term is clamped to `[0, 1]` so rounding at antipodal
/// points cannot push `sqrt(1 - a)` into NaN.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Test whether `student` lies within `radius_meters` of `class` (inclusive).
pub fn within_radius(student: &Coordinates, class: &Coordinates, radius_meters: f64) -> ProximityCheck {
    let distance = student.distance_to(class);
    ProximityCheck {
        is_valid: distance <= radius_meters,
        distance_meters: distance,
    }
}

/// Round a distance to whole meters, saturating at `u32::MAX`.
pub fn round_meters(distance: f64) -> u32 {
    if distance.is_nan() || distance <= 0.0 {
        return 0;
    }
    let rounded = distance.round();
    if rounded >= u32::MAX as f64 {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// Point `meters` due north of `origin`. Used to build fixtures and demo data.
pub fn offset_north(origin: &Coordinates, meters: f64) -> Coordinates {
    let delta_deg = (meters / EARTH_RADIUS_METERS).to_degrees();
    Coordinates::new(origin.latitude + delta_deg, origin.longitude)
}
