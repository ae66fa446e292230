//! Geographic utilities: great-circle distance, bearings, angular arithmetic.
//!
//! All angles are in degrees and all distances in kilometres. Public distance
//! values are rounded to two decimals; the unrounded variants are used for
//! internal accumulation (averages, range checks).
//!
//! # Example
//! ```
//! use cellsite_geometry::geo_utils::{calculate_bearing, haversine_distance};
//!
//! // One degree of latitude is ~111.19 km on a 6371 km sphere
//! assert_eq!(haversine_distance(0.0, 0.0, 1.0, 0.0), 111.19);
//! assert_eq!(calculate_bearing(0.0, 0.0, 1.0, 0.0), 0.0);
//! ```

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude on the mean-radius sphere.
const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Round to two decimal places.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Great-circle distance in kilometres, unrounded.
///
/// Identical coordinate pairs return exactly `0.0` without going through the
/// trigonometric path.
pub fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if lat1 == lat2 && lon1 == lon2 {
        return 0.0;
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance in kilometres, rounded to two decimals.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    round2(great_circle_km(lat1, lon1, lat2, lon2))
}

/// Initial great-circle bearing from point 1 to point 2, in [0, 360).
pub fn calculate_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Normalize an angle into [0, 360).
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Minimal angular difference between two directions, in [0, 180].
#[inline]
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (normalize_degrees(a) - normalize_degrees(b)).abs();
    diff.min(360.0 - diff)
}

/// Point reached by travelling `distance_km` from a start point on the given
/// initial bearing. Returns `(latitude, longitude)` with longitude in
/// [-180, 180).
pub fn destination_point(lat: f64, lon: f64, bearing: f64, distance_km: f64) -> (f64, f64) {
    let delta = distance_km / EARTH_RADIUS_KM;
    let theta = bearing.to_radians();
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let lon2 = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    (phi2.to_degrees(), lon2)
}

/// Convert a distance in kilometres to `(lat_degrees, lng_degrees)` spans
/// around a reference latitude. Used to size spatial-index envelopes.
///
/// The longitude span is taken at the poleward edge of the box, where a
/// degree of longitude is shortest. A box that reaches a pole spans all 360°.
pub fn km_to_degrees(km: f64, ref_lat: f64) -> (f64, f64) {
    let lat_deg = km / KM_PER_DEGREE;
    let edge_lat = ref_lat.abs() + lat_deg;
    if edge_lat >= 90.0 {
        return (lat_deg, 360.0);
    }
    let cos_edge = edge_lat.to_radians().cos();
    if cos_edge < 1e-9 {
        return (lat_deg, 360.0);
    }
    let lng_deg = (km / (KM_PER_DEGREE * cos_edge)).min(360.0);
    (lat_deg, lng_deg)
}

/// Check coordinates are finite and inside WGS84 ranges.
#[inline]
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_are_zero() {
        assert_eq!(great_circle_km(51.5, -0.12, 51.5, -0.12), 0.0);
        assert_eq!(haversine_distance(-33.86, 151.2, -33.86, 151.2), 0.0);
    }

    #[test]
    fn test_distance_symmetry() {
        let ab = great_circle_km(52.52, 13.405, 48.8566, 2.3522);
        let ba = great_circle_km(48.8566, 2.3522, 52.52, 13.405);
        assert!((ab - ba).abs() < 1e-9);
        // Berlin - Paris is ~878 km
        assert!((ab - 878.0).abs() < 5.0);
    }

    #[test]
    fn test_meridian_spacing() {
        // 1 km along a meridian is 1 / 111.195 degrees on a 6371 km sphere
        let step = 1.0 / (EARTH_RADIUS_KM * std::f64::consts::PI / 180.0);
        let lat0 = 10.0;
        assert!((haversine_distance(lat0, 20.0, lat0 + step, 20.0) - 1.0).abs() <= 0.01);
        assert!((haversine_distance(lat0, 20.0, lat0 + 2.0 * step, 20.0) - 2.0).abs() <= 0.01);
        assert!(
            (haversine_distance(lat0 + step, 20.0, lat0 + 2.0 * step, 20.0) - 1.0).abs() <= 0.01
        );
    }

    #[test]
    fn test_rounding_at_boundary() {
        let raw = great_circle_km(0.0, 0.0, 0.0123, 0.0);
        let rounded = haversine_distance(0.0, 0.0, 0.0123, 0.0);
        assert_eq!(rounded, round2(raw));
        assert_ne!(raw, rounded);
    }

    #[test]
    fn test_cardinal_bearings() {
        assert!((calculate_bearing(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((calculate_bearing(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((calculate_bearing(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((calculate_bearing(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_range() {
        for (lat, lon) in [(10.0, -5.0), (-10.0, 5.0), (-3.0, -3.0), (45.0, 170.0)] {
            let b = calculate_bearing(0.0, 0.0, lat, lon);
            assert!((0.0..360.0).contains(&b), "bearing {} out of range", b);
        }
    }

    #[test]
    fn test_normalize_and_difference() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
        assert_eq!(angular_difference(350.0, 10.0), 20.0);
        assert_eq!(angular_difference(0.0, 180.0), 180.0);
        assert_eq!(angular_difference(90.0, 90.0), 0.0);
    }

    #[test]
    fn test_destination_roundtrip() {
        let (lat, lon) = destination_point(40.0, -3.7, 60.0, 2.0);
        assert!((great_circle_km(40.0, -3.7, lat, lon) - 2.0).abs() < 1e-6);
        assert!((calculate_bearing(40.0, -3.7, lat, lon) - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_degree_span_uses_poleward_edge() {
        let (dlat, dlng) = km_to_degrees(5.5, 89.9);
        assert!(dlat > 0.049 && dlat < 0.05);
        // A point 20° of longitude away at 89.9° is only 3.86 km off
        assert!(dlng > 20.0);
        assert!(great_circle_km(89.9, 0.0, 89.9, 20.0) < 5.5);

        // Same span north and south
        assert_eq!(km_to_degrees(5.5, -60.0), km_to_degrees(5.5, 60.0));
        assert!(km_to_degrees(5.5, 60.0).1 > km_to_degrees(5.5, 0.0).1);
    }

    #[test]
    fn test_degree_span_covering_pole_is_full_turn() {
        assert_eq!(km_to_degrees(5.0, 89.98).1, 360.0);
        assert_eq!(km_to_degrees(5.0, -90.0).1, 360.0);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(is_valid_coordinate(51.5, -0.12));
        assert!(is_valid_coordinate(-90.0, 180.0));
        assert!(!is_valid_coordinate(90.5, 0.0));
        assert!(!is_valid_coordinate(0.0, -180.5));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
    }
}
