//! Distance calculations over geographic coordinates.
//!
//! All distances in this crate are great-circle (haversine) distances in
//! meters, computed via the `geo` crate. The store itself only speaks
//! meters; [`DistanceUnit`] exists for callers whose radii are expressed in
//! miles or kilometers.

use geo::{Distance, Haversine, Point};

use crate::types::Coordinates;

/// Meters in one statute mile.
pub const METERS_PER_MILE: f64 = 1_609.344;

/// Approximate meters per degree of latitude, used for bounding-box padding.
pub const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// Units accepted for radius parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
}

impl DistanceUnit {
    /// Convert a value in this unit to meters.
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            Self::Meters => value,
            Self::Kilometers => value * 1_000.0,
            Self::Miles => value * METERS_PER_MILE,
        }
    }
}

/// Great-circle distance between two coordinates, in meters.
///
/// Symmetric, non-negative, and zero for coincident points.
///
/// # Examples
///
/// ```rust
/// use brewfinder::spatial::distance_between;
/// use brewfinder::Coordinates;
///
/// let nyc = Coordinates::new(40.7128, -74.0060);
/// let la = Coordinates::new(34.0522, -118.2437);
/// let dist = distance_between(&nyc, &la);
/// assert!(dist > 3_900_000.0); // ~3,936 km
/// ```
pub fn distance_between(a: &Coordinates, b: &Coordinates) -> f64 {
    Haversine.distance(Point::new(a.lng, a.lat), Point::new(b.lng, b.lat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_distance_nyc_to_la() {
        let nyc = Coordinates::new(40.7128, -74.0060);
        let la = Coordinates::new(34.0522, -118.2437);
        let dist = distance_between(&nyc, &la);
        assert_relative_eq!(dist, 3_936_000.0, max_relative = 0.01);
    }

    #[test]
    fn test_coincident_points_are_zero() {
        let p = Coordinates::new(37.7596, -122.4351);
        assert_eq!(distance_between(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinates::new(37.7609, -122.4350);
        let b = Coordinates::new(37.8817, -121.9141);
        assert_relative_eq!(
            distance_between(&a, &b),
            distance_between(&b, &a),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(DistanceUnit::Meters.to_meters(250.0), 250.0);
        assert_eq!(DistanceUnit::Kilometers.to_meters(1.5), 1_500.0);
        assert_relative_eq!(DistanceUnit::Miles.to_meters(1.0), 1_609.344);
    }
}
