//! Great-circle geometry on a spherical Earth.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a coordinate only if it lies in lat -90..90, lng -180..180.
    pub fn checked(lat: f64, lng: f64) -> Option<Self> {
        let c = Self::new(lat, lng);
        c.is_valid().then_some(c)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Haversine distance in meters.
///
/// Range checking is the caller's job; out-of-range input still yields a number.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat * DEG;
    let phi2 = b.lat * DEG;
    let dphi = (b.lat - a.lat) * DEG;
    let dlambda = (b.lng - a.lng) * DEG;

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    EARTH_RADIUS_M * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Format a coordinate as `12.8638° N, 77.4349° E`.
pub fn format_coords(c: Coordinate) -> String {
    let ns = if c.lat >= 0.0 { 'N' } else { 'S' };
    let ew = if c.lng >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0} {}, {:.4}\u{00B0} {}", c.lat.abs(), ns, c.lng.abs(), ew)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const MAIN_GATE: Coordinate = Coordinate::new(12.863788, 77.434897);
    const BLOCK_6: Coordinate = Coordinate::new(12.862103, 77.439809);

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(distance(MAIN_GATE, MAIN_GATE), 0.0);
        let pole = Coordinate::new(90.0, 0.0);
        assert_eq!(distance(pole, pole), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (MAIN_GATE, BLOCK_6),
            (Coordinate::new(-33.86, 151.2), Coordinate::new(51.5074, -0.1278)),
            (Coordinate::new(0.0, 179.9), Coordinate::new(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            assert_abs_diff_eq!(distance(a, b), distance(b, a), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_campus_scale_distance() {
        // Main Gate to Block 6 is roughly 560 m across campus.
        let d = distance(MAIN_GATE, BLOCK_6);
        assert!(d > 500.0 && d < 600.0, "got {}", d);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = distance(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert_abs_diff_eq!(d, EARTH_RADIUS_M * DEG, epsilon = 1e-6);
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert_abs_diff_eq!(d, EARTH_RADIUS_M * PI, epsilon = 1e-3);
    }

    #[test]
    fn test_checked_rejects_out_of_range() {
        assert!(Coordinate::checked(12.86, 77.43).is_some());
        assert!(Coordinate::checked(90.5, 0.0).is_none());
        assert!(Coordinate::checked(0.0, -180.5).is_none());
        assert!(Coordinate::checked(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_format_coords() {
        assert_eq!(format_coords(MAIN_GATE), "12.8638\u{00B0} N, 77.4349\u{00B0} E");
        assert_eq!(
            format_coords(Coordinate::new(-33.8688, -70.0)),
            "33.8688\u{00B0} S, 70.0000\u{00B0} W"
        );
    }
}
