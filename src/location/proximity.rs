//! GPS proximity estimator: nearest landmark plus a distance-decay confidence.

use serde::Serialize;

use super::catalog::Catalog;
use crate::geo::{self, Coordinate};

/// Distance at which GPS confidence reaches zero.
pub const DEFAULT_MAX_DISTANCE_M: f64 = 200.0;

/// Nearest landmark to a GPS fix.
///
/// `name` is `None` only when the catalog was empty; that result carries no
/// GPS signal and callers treat it as absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityResult {
    pub name: Option<String>,
    #[serde(rename = "distance")]
    pub distance_m: f64,
    pub confidence: f64,
    pub coordinates: Option<Coordinate>,
}

impl ProximityResult {
    fn degenerate() -> Self {
        Self {
            name: None,
            distance_m: f64::INFINITY,
            confidence: 0.0,
            coordinates: None,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.name.is_none()
    }
}

/// [`nearest_with_cutoff`] with the default 200 m cutoff.
pub fn nearest(point: Coordinate, catalog: &Catalog) -> ProximityResult {
    nearest_with_cutoff(point, catalog, DEFAULT_MAX_DISTANCE_M)
}

/// Scan the catalog for the closest landmark.
///
/// Ties go to the earlier catalog entry. Confidence decays linearly from 1 at
/// the landmark to 0 at `max_distance_m`; the landmark is still reported past
/// the cutoff, just with zero confidence.
pub fn nearest_with_cutoff(point: Coordinate, catalog: &Catalog, max_distance_m: f64) -> ProximityResult {
    let mut best: Option<(usize, f64)> = None;
    for (i, entry) in catalog.entries().iter().enumerate() {
        let d = geo::distance(point, entry.coordinate());
        if best.map_or(true, |(_, min)| d < min) {
            best = Some((i, d));
        }
    }

    let Some((idx, distance_m)) = best else {
        return ProximityResult::degenerate();
    };
    let entry = &catalog.entries()[idx];

    ProximityResult {
        name: Some(entry.name.clone()),
        distance_m,
        confidence: distance_confidence(distance_m, max_distance_m),
        coordinates: Some(entry.coordinate()),
    }
}

fn distance_confidence(distance_m: f64, max_distance_m: f64) -> f64 {
    if distance_m == 0.0 {
        return 1.0;
    }
    if !(max_distance_m.is_finite() && max_distance_m > 0.0) || distance_m.is_nan() {
        return 0.0;
    }
    (1.0 - distance_m / max_distance_m).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::catalog::builtin_catalog;
    use crate::location::types::LocationCatalogEntry;
    use approx::assert_abs_diff_eq;

    fn single(name: &str, lat: f64, lng: f64) -> Catalog {
        Catalog::new(vec![LocationCatalogEntry::new(name, lat, lng)]).unwrap()
    }

    #[test]
    fn test_scenario_a_exact_match() {
        let catalog = single("Main Gate", 12.863788, 77.434897);
        let r = nearest_with_cutoff(Coordinate::new(12.863788, 77.434897), &catalog, 200.0);
        assert_eq!(r.name.as_deref(), Some("Main Gate"));
        assert_eq!(r.distance_m, 0.0);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.coordinates, Some(Coordinate::new(12.863788, 77.434897)));
    }

    #[test]
    fn test_picks_nearest_landmark() {
        let catalog = builtin_catalog();
        // A few meters east of Block 4.
        let r = nearest(Coordinate::new(12.862211, 77.438900), &catalog);
        assert_eq!(r.name.as_deref(), Some("Block 4"));
        assert!(r.distance_m > 0.0 && r.distance_m < 10.0);
        assert!(r.confidence > 0.95 && r.confidence < 1.0);
    }

    #[test]
    fn test_linear_decay() {
        let catalog = single("Main Gate", 0.0, 0.0);
        // 0.0009 degrees of latitude is ~100 m.
        let r = nearest_with_cutoff(Coordinate::new(0.0009, 0.0), &catalog, 200.0);
        assert_abs_diff_eq!(r.confidence, 1.0 - r.distance_m / 200.0, epsilon = 1e-12);
        assert!(r.confidence > 0.45 && r.confidence < 0.55);
    }

    #[test]
    fn test_beyond_cutoff_still_reports_landmark() {
        let catalog = builtin_catalog();
        let r = nearest(Coordinate::new(12.9716, 77.5946), &catalog);
        assert!(r.name.is_some());
        assert!(r.distance_m > 200.0);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_exactly_at_cutoff_is_zero() {
        assert_eq!(distance_confidence(200.0, 200.0), 0.0);
        assert_eq!(distance_confidence(250.0, 200.0), 0.0);
    }

    #[test]
    fn test_confidence_always_in_unit_range() {
        let catalog = builtin_catalog();
        for (lat, lng) in [(12.86, 77.43), (12.8625, 77.4385), (-45.0, 10.0), (90.0, 180.0)] {
            let r = nearest(Coordinate::new(lat, lng), &catalog);
            assert!((0.0..=1.0).contains(&r.confidence));
        }
    }

    #[test]
    fn test_tie_goes_to_first_entry() {
        let catalog = Catalog::new(vec![
            LocationCatalogEntry::new("West", 0.0, -0.001),
            LocationCatalogEntry::new("East", 0.0, 0.001),
        ])
        .unwrap();
        let r = nearest(Coordinate::new(0.0, 0.0), &catalog);
        assert_eq!(r.name.as_deref(), Some("West"));
    }

    #[test]
    fn test_empty_catalog_is_degenerate() {
        let r = nearest(Coordinate::new(12.86, 77.43), &Catalog::default());
        assert!(r.is_degenerate());
        assert_eq!(r.confidence, 0.0);
        assert!(r.coordinates.is_none());
    }

    #[test]
    fn test_non_positive_cutoff() {
        assert_eq!(distance_confidence(0.0, 0.0), 1.0);
        assert_eq!(distance_confidence(5.0, 0.0), 0.0);
        assert_eq!(distance_confidence(5.0, -10.0), 0.0);
        assert_eq!(distance_confidence(5.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let catalog = single("Main Gate", 12.863788, 77.434897);
        let r = nearest(Coordinate::new(12.863788, 77.434897), &catalog);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["name"], "Main Gate");
        assert_eq!(json["distance"], 0.0);
        assert_eq!(json["confidence"], 1.0);
        assert_eq!(json["coordinates"]["lat"], 12.863788);
        assert_eq!(json["coordinates"]["lng"], 77.434897);
    }
}
