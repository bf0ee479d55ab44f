//! Geographic utilities: great-circle distance, bearing and bounds.

use geo::{BoundingRect, Coord, LineString};

use crate::{Bounds, GpsPoint};

/// Mean Earth radius in meters used by all distance calculations.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters (haversine formula).
///
/// # Example
/// ```
/// use route_replay::GpsPoint;
/// use route_replay::geo_utils::haversine_distance;
///
/// let a = GpsPoint::new(0.0, 0.0);
/// let b = GpsPoint::new(0.0, 0.01);
/// let d = haversine_distance(&a, &b);
/// assert!((d - 1111.95).abs() < 0.1);
/// ```
pub fn haversine_distance(a: &GpsPoint, b: &GpsPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial great-circle bearing from `a` to `b`, in degrees within `[0, 360)`.
pub fn bearing(a: &GpsPoint, b: &GpsPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    // rem_euclid can round up to exactly 360.0 for tiny negative angles
    let deg = y.atan2(x).to_degrees().rem_euclid(360.0);
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

/// Bearing between two optional endpoints; 0 when either is missing.
pub fn bearing_between(a: Option<&GpsPoint>, b: Option<&GpsPoint>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => bearing(a, b),
        _ => 0.0,
    }
}

/// Total length of a path in meters.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Convert points into a geo `LineString` (x = longitude, y = latitude).
pub fn to_line_string(points: &[GpsPoint]) -> LineString<f64> {
    points
        .iter()
        .map(|p| Coord {
            x: p.longitude,
            y: p.latitude,
        })
        .collect()
}

/// Bounding box of a path, `None` when it has no points.
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    let rect = to_line_string(points).bounding_rect()?;
    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = GpsPoint::new(17.385044, 78.486671);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let d1 = haversine_distance(&london, &paris);
        let d2 = haversine_distance(&paris, &london);
        assert!((d1 - d2).abs() < 1e-6);
        // ~344 km
        assert!(d1 > 340_000.0 && d1 < 348_000.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GpsPoint::new(0.0, 0.0);
        assert!((bearing(&origin, &GpsPoint::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(&origin, &GpsPoint::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(&origin, &GpsPoint::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(&origin, &GpsPoint::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_in_range() {
        let a = GpsPoint::new(51.5, -0.12);
        for b in [
            GpsPoint::new(51.6, -0.13),
            GpsPoint::new(51.4, 0.2),
            GpsPoint::new(51.5, -0.12),
        ] {
            let deg = bearing(&a, &b);
            assert!((0.0..360.0).contains(&deg), "bearing {} out of range", deg);
        }
    }

    #[test]
    fn test_bearing_between_missing_endpoint() {
        let a = GpsPoint::new(0.0, 0.0);
        assert_eq!(bearing_between(Some(&a), None), 0.0);
        assert_eq!(bearing_between(None, Some(&a)), 0.0);
    }

    #[test]
    fn test_polyline_length() {
        let points = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.01),
            GpsPoint::new(0.0, 0.02),
        ];
        let expected = 2.0 * haversine_distance(&points[0], &points[1]);
        assert!((polyline_length(&points) - expected).abs() < 1e-6);
        assert_eq!(polyline_length(&points[..1]), 0.0);
    }

    #[test]
    fn test_compute_bounds() {
        assert!(compute_bounds(&[]).is_none());

        let points = vec![GpsPoint::new(1.0, 5.0), GpsPoint::new(-2.0, 7.0)];
        let bounds = compute_bounds(&points).unwrap();
        assert_eq!(bounds.min_lat, -2.0);
        assert_eq!(bounds.max_lat, 1.0);
        assert_eq!(bounds.min_lng, 5.0);
        assert_eq!(bounds.max_lng, 7.0);
    }
}
