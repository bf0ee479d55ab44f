//! Segment location and linear interpolation along a route.
//!
//! Everything here is a pure function of `(Route, virtual time)`, recomputed
//! on demand rather than cached.

use serde::{Deserialize, Serialize};

use crate::geo_utils::{bearing, haversine_distance};
use crate::route::Route;
use crate::GpsPoint;

/// The segment enclosing a virtual time and the progress through it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLocation {
    /// Index of the segment's first sample
    pub index: usize,
    /// Fraction of the segment covered, not clamped
    pub alpha: f64,
}

/// Position along the route at a given virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatedPosition {
    pub segment_index: usize,
    pub alpha: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Bearing of the whole segment in degrees, constant across it
    pub bearing: f64,
    /// Segment-average speed in m/s
    pub speed_mps: f64,
    /// Meters covered from the start of the route
    pub distance_covered: f64,
}

impl InterpolatedPosition {
    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// Find the segment containing `t` (milliseconds).
///
/// Picks the largest `i <= len - 2` with `timestamps[i] <= t`, which is where a
/// forward scan advancing while the next timestamp is `<= t` would stop.
/// Below two timestamps the result is always segment 0 at alpha 0.
///
/// # Example
/// ```
/// use route_replay::interpolate::locate_segment;
///
/// let loc = locate_segment(&[0, 1000, 2000], 1500.0, 1);
/// assert_eq!(loc.index, 1);
/// assert!((loc.alpha - 0.5).abs() < 1e-12);
/// ```
pub fn locate_segment(timestamps: &[u64], t: f64, min_segment_ms: u64) -> SegmentLocation {
    if timestamps.len() < 2 {
        return SegmentLocation {
            index: 0,
            alpha: 0.0,
        };
    }

    // Candidates for a segment start beyond 0 are timestamps[1..=len-2]
    let inner = &timestamps[1..timestamps.len() - 1];
    let index = inner.partition_point(|&ts| ts as f64 <= t);

    let t0 = timestamps[index];
    let t1 = timestamps[index + 1];
    let segment_ms = t1.saturating_sub(t0).max(min_segment_ms.max(1));

    SegmentLocation {
        index,
        alpha: (t - t0 as f64) / segment_ms as f64,
    }
}

/// Interpolate the route's position at virtual time `t` (milliseconds).
///
/// Returns `None` only for the empty route. A single-point route stays on
/// that point with zero speed.
pub fn interpolate(route: &Route, t: f64) -> Option<InterpolatedPosition> {
    let timestamps = route.normalized_timestamps();
    let loc = locate_segment(timestamps, t, route.min_segment_ms);

    let a = route.point(loc.index)?;
    let next = route.point(loc.index + 1);
    let b = next.unwrap_or(a);

    let latitude = a.latitude + (b.latitude - a.latitude) * loc.alpha;
    let longitude = a.longitude + (b.longitude - a.longitude) * loc.alpha;
    let current = GpsPoint::new(latitude, longitude);

    let speed_mps = match next {
        Some(b) => {
            let dt_secs = (timestamps[loc.index + 1] - timestamps[loc.index]) as f64 / 1000.0;
            haversine_distance(a, b) / dt_secs.max(route.min_speed_window_secs)
        }
        None => 0.0,
    };

    let distance_covered =
        route.cumulative_distance()[loc.index] + haversine_distance(a, &current);

    Some(InterpolatedPosition {
        segment_index: loc.index,
        alpha: loc.alpha,
        latitude,
        longitude,
        bearing: bearing(a, b),
        speed_mps,
        distance_covered,
    })
}

/// The part of the route already driven: every sample up to the current
/// segment start, followed by the interpolated position.
pub fn traveled_route(route: &Route, t: f64) -> Vec<GpsPoint> {
    let Some(position) = interpolate(route, t) else {
        return Vec::new();
    };
    let mut traveled: Vec<GpsPoint> = route.samples()[..=position.segment_index]
        .iter()
        .map(|s| s.point)
        .collect();
    traveled.push(position.point());
    traveled
}

impl Route {
    /// Interpolated position at virtual time `t` (milliseconds).
    pub fn position_at(&self, t: f64) -> Option<InterpolatedPosition> {
        interpolate(self, t)
    }

    /// Traveled part of the route at virtual time `t` (milliseconds).
    pub fn traveled_at(&self, t: f64) -> Vec<GpsPoint> {
        traveled_route(self, t)
    }
}
