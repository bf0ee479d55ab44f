//! Route model: recorded samples plus the arrays playback runs on.
//!
//! A [`Route`] is immutable once built. Alongside the samples it carries
//! cumulative distance (meters) and normalized timestamps (milliseconds from
//! the first sample), both the same length as the route.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::PlaybackConfig;
use crate::error::{ReplayError, Result};
use crate::geo_utils::haversine_distance;
use crate::{Bounds, GpsPoint};

// ============================================================================
// Input Records
// ============================================================================

/// One record of the route file: `{ latitude, longitude, timestamp? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

/// A timestamp as found in the route file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Epoch milliseconds
    Millis(f64),
    /// ISO-8601 style date/time string
    Text(String),
}

impl RawTimestamp {
    /// Epoch milliseconds, `Ok(None)` for an empty string.
    pub fn to_epoch_millis(&self) -> Result<Option<i64>> {
        match self {
            RawTimestamp::Millis(ms) if ms.is_finite() => Ok(Some(ms.round() as i64)),
            RawTimestamp::Millis(ms) => Err(ReplayError::InvalidTimestamp(ms.to_string())),
            RawTimestamp::Text(text) => parse_timestamp_str(text),
        }
    }
}

/// Parse an ISO-8601 style timestamp. Strings without an offset are UTC.
fn parse_timestamp_str(text: &str) -> Result<Option<i64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(dt.timestamp_millis()));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(Some(naive.and_utc().timestamp_millis()));
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(midnight.and_utc().timestamp_millis()));
    }

    Err(ReplayError::InvalidTimestamp(text.to_string()))
}

// ============================================================================
// Route
// ============================================================================

/// A single recorded observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub point: GpsPoint,
    /// Absolute epoch milliseconds, if recorded
    pub timestamp: Option<i64>,
}

impl Sample {
    pub fn new(latitude: f64, longitude: f64, timestamp: Option<i64>) -> Self {
        Self {
            point: GpsPoint::new(latitude, longitude),
            timestamp,
        }
    }

    fn from_raw(raw: &RawSample, index: usize) -> Self {
        let timestamp = raw.timestamp.as_ref().and_then(|ts| match ts.to_epoch_millis() {
            Ok(ms) => ms,
            Err(e) => {
                debug!("[RouteReplay] Sample {}: {}, treating as missing", index, e);
                None
            }
        });
        let sample = Self::new(raw.latitude, raw.longitude, timestamp);
        if !sample.point.is_valid() {
            debug!(
                "[RouteReplay] Sample {}: coordinates ({}, {}) out of range",
                index, raw.latitude, raw.longitude
            );
        }
        sample
    }
}

/// Where a route's normalized timestamps came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timing {
    /// Every sample had a timestamp; offsets are relative to `start_ms`.
    Recorded { start_ms: i64 },
    /// Uniform synthetic cadence.
    Synthetic { interval_ms: u64 },
}

/// An immutable route ready for playback.
#[derive(Debug, Clone)]
pub struct Route {
    samples: Vec<Sample>,
    cumulative_distance: Vec<f64>,
    timestamps: Vec<u64>,
    timing: Timing,
    pub(crate) min_segment_ms: u64,
    pub(crate) min_speed_window_secs: f64,
}

impl Default for Route {
    fn default() -> Self {
        Self::empty(&PlaybackConfig::default())
    }
}

impl Route {
    /// A route with no samples; playback over it stays at the start.
    pub fn empty(config: &PlaybackConfig) -> Self {
        Self::from_samples(Vec::new(), config)
    }

    /// Build a route from samples, deriving distances and timing.
    pub fn from_samples(samples: Vec<Sample>, config: &PlaybackConfig) -> Self {
        let cumulative_distance = cumulative_distances(&samples);
        let (timestamps, timing) = normalize_timestamps(&samples, config.synthetic_interval_ms);

        Self {
            samples,
            cumulative_distance,
            timestamps,
            timing,
            min_segment_ms: config.min_segment_ms.max(1),
            min_speed_window_secs: config.min_speed_window_secs,
        }
    }

    /// Build a route from route-file records.
    pub fn from_raw(raw: &[RawSample], config: &PlaybackConfig) -> Self {
        let samples = raw
            .iter()
            .enumerate()
            .map(|(i, r)| Sample::from_raw(r, i))
            .collect();
        Self::from_samples(samples, config)
    }

    /// Parse a route from the JSON text of a route file.
    pub fn from_json_str(json: &str, config: &PlaybackConfig) -> Result<Self> {
        let raw: Vec<RawSample> = serde_json::from_str(json)?;
        Ok(Self::from_raw(&raw, config))
    }

    /// Parse a route from a reader producing route-file JSON.
    pub fn from_reader<R: Read>(reader: R, config: &PlaybackConfig) -> Result<Self> {
        let raw: Vec<RawSample> = serde_json::from_reader(reader)?;
        Ok(Self::from_raw(&raw, config))
    }

    /// Load a route file from disk.
    pub fn load<P: AsRef<Path>>(path: P, config: &PlaybackConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let route = Self::from_reader(BufReader::new(file), config)?;
        info!(
            "[RouteReplay] Loaded {} samples from {} ({} ms, {:?})",
            route.len(),
            path.display(),
            route.total_duration(),
            route.timing
        );
        Ok(route)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn point(&self, index: usize) -> Option<&GpsPoint> {
        self.samples.get(index).map(|s| &s.point)
    }

    pub fn points(&self) -> Vec<GpsPoint> {
        self.samples.iter().map(|s| s.point).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Cumulative distance in meters at each sample.
    pub fn cumulative_distance(&self) -> &[f64] {
        &self.cumulative_distance
    }

    /// Milliseconds from the first sample, one per sample.
    pub fn normalized_timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Epoch milliseconds of the first sample when real timing is in use.
    pub fn start_timestamp(&self) -> Option<i64> {
        match self.timing {
            Timing::Recorded { start_ms } => Some(start_ms),
            Timing::Synthetic { .. } => None,
        }
    }

    /// Playback length in milliseconds; 0 below two samples.
    pub fn total_duration(&self) -> u64 {
        if self.timestamps.len() < 2 {
            return 0;
        }
        self.timestamps.last().copied().unwrap_or(0)
    }

    /// Total path length in meters.
    pub fn total_distance(&self) -> f64 {
        self.cumulative_distance.last().copied().unwrap_or(0.0)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points())
    }
}

/// Load a route file, falling back to the empty route on failure.
///
/// The failure is logged; playback over the empty route is well defined.
pub fn load_route_or_empty<P: AsRef<Path>>(path: P, config: &PlaybackConfig) -> Route {
    Route::load(path, config).unwrap_or_else(|e| {
        warn!("[RouteReplay] {}; continuing with an empty route", e);
        Route::empty(config)
    })
}

fn cumulative_distances(samples: &[Sample]) -> Vec<f64> {
    let mut total = 0.0;
    let mut out = Vec::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        if i > 0 {
            total += haversine_distance(&samples[i - 1].point, &sample.point);
        }
        out.push(total);
    }
    out
}

/// All-or-nothing normalization: real offsets only if every sample has a
/// timestamp and they never go backwards, else a uniform synthetic cadence.
fn normalize_timestamps(samples: &[Sample], interval_ms: u64) -> (Vec<u64>, Timing) {
    let recorded: Option<Vec<i64>> = samples.iter().map(|s| s.timestamp).collect();

    if let Some(recorded) = recorded.filter(|r| !r.is_empty()) {
        let start_ms = recorded[0];
        if recorded.windows(2).all(|w| w[0] <= w[1]) {
            let normalized: Option<Vec<u64>> = recorded
                .iter()
                .map(|&ts| ts.checked_sub(start_ms).and_then(|d| u64::try_from(d).ok()))
                .collect();
            match normalized {
                Some(normalized) => return (normalized, Timing::Recorded { start_ms }),
                None => warn!("[RouteReplay] Recorded time span overflows, using synthetic timing"),
            }
        } else {
            warn!("[RouteReplay] Recorded timestamps go backwards, using synthetic timing");
        }
    } else if !samples.is_empty() {
        debug!("[RouteReplay] Route has samples without timestamps, using synthetic timing");
    }

    let synthetic: Vec<u64> = (0..samples.len() as u64).map(|k| k * interval_ms).collect();
    (synthetic, Timing::Synthetic { interval_ms })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed_route() -> Vec<Sample> {
        vec![
            Sample::new(0.0, 0.0, Some(1_000_000)),
            Sample::new(0.0, 0.01, Some(1_001_000)),
            Sample::new(0.0, 0.02, Some(1_002_000)),
        ]
    }

    #[test]
    fn test_recorded_timestamps_normalized() {
        let route = Route::from_samples(timed_route(), &PlaybackConfig::default());
        assert_eq!(route.normalized_timestamps(), &[0, 1000, 2000]);
        assert_eq!(route.total_duration(), 2000);
        assert_eq!(route.start_timestamp(), Some(1_000_000));
    }

    #[test]
    fn test_missing_timestamps_fall_back_entirely() {
        let samples = vec![
            Sample::new(0.0, 0.0, Some(10)),
            Sample::new(0.0, 0.001, None),
            Sample::new(0.0, 0.002, Some(5000)),
            Sample::new(0.0, 0.003, None),
            Sample::new(0.0, 0.004, Some(9000)),
        ];
        let route = Route::from_samples(samples, &PlaybackConfig::default());
        assert_eq!(route.normalized_timestamps(), &[0, 1000, 2000, 3000, 4000]);
        assert_eq!(route.total_duration(), 4000);
        assert_eq!(route.timing(), Timing::Synthetic { interval_ms: 1000 });
        assert_eq!(route.start_timestamp(), None);
    }

    #[test]
    fn test_backwards_timestamps_fall_back() {
        let samples = vec![
            Sample::new(0.0, 0.0, Some(5000)),
            Sample::new(0.0, 0.001, Some(4000)),
        ];
        let route = Route::from_samples(samples, &PlaybackConfig::default());
        assert_eq!(route.normalized_timestamps(), &[0, 1000]);
    }

    #[test]
    fn test_overflowing_time_span_falls_back() {
        let json = r#"[
            {"latitude": 0.0, "longitude": 0.0, "timestamp": -9e18},
            {"latitude": 0.0, "longitude": 0.001, "timestamp": 9e18}
        ]"#;
        let route = Route::from_json_str(json, &PlaybackConfig::default()).unwrap();
        assert_eq!(route.normalized_timestamps(), &[0, 1000]);
        assert_eq!(route.timing(), Timing::Synthetic { interval_ms: 1000 });
        assert_eq!(route.total_duration(), 1000);
    }

    #[test]
    fn test_out_of_range_coordinates_are_kept() {
        let json = r#"[{"latitude": 95.0, "longitude": 200.0}]"#;
        let route = Route::from_json_str(json, &PlaybackConfig::default()).unwrap();
        assert_eq!(route.len(), 1);
        assert!(!route.samples()[0].point.is_valid());
    }

    #[test]
    fn test_cumulative_distance() {
        let route = Route::from_samples(timed_route(), &PlaybackConfig::default());
        let cd = route.cumulative_distance();
        assert_eq!(cd.len(), 3);
        assert_eq!(cd[0], 0.0);
        assert!(cd.windows(2).all(|w| w[0] <= w[1]));
        assert!((cd[2] - 2.0 * cd[1]).abs() < 1e-6);
        assert_eq!(route.total_distance(), cd[2]);
    }

    #[test]
    fn test_empty_and_single_point() {
        let empty = Route::empty(&PlaybackConfig::default());
        assert!(empty.is_empty());
        assert_eq!(empty.total_duration(), 0);
        assert!(empty.cumulative_distance().is_empty());
        assert!(empty.normalized_timestamps().is_empty());
        assert!(empty.bounds().is_none());

        let single = Route::from_samples(
            vec![Sample::new(1.0, 2.0, Some(42))],
            &PlaybackConfig::default(),
        );
        assert_eq!(single.total_duration(), 0);
        assert_eq!(single.cumulative_distance(), &[0.0]);
        assert_eq!(single.normalized_timestamps(), &[0]);
    }

    #[test]
    fn test_parse_route_json() {
        let json = r#"[
            {"latitude": 17.385, "longitude": 78.4866, "timestamp": "2024-01-01T08:00:00Z"},
            {"latitude": 17.386, "longitude": 78.4870, "timestamp": "2024-01-01T08:00:05.500Z"},
            {"latitude": 17.387, "longitude": 78.4875, "timestamp": "2024-01-01T08:00:09+00:00"}
        ]"#;
        let route = Route::from_json_str(json, &PlaybackConfig::default()).unwrap();
        assert_eq!(route.len(), 3);
        assert_eq!(route.normalized_timestamps(), &[0, 5500, 9000]);
        assert_eq!(route.start_timestamp(), Some(1_704_096_000_000));
    }

    #[test]
    fn test_parse_route_json_without_timestamps() {
        let json = r#"[
            {"latitude": 17.385, "longitude": 78.4866},
            {"latitude": 17.386, "longitude": 78.4870, "timestamp": null},
            {"latitude": 17.387, "longitude": 78.4875, "timestamp": ""}
        ]"#;
        let route = Route::from_json_str(json, &PlaybackConfig::default()).unwrap();
        assert_eq!(route.normalized_timestamps(), &[0, 1000, 2000]);
    }

    #[test]
    fn test_timestamp_formats() {
        let naive = RawTimestamp::Text("2024-01-01T08:00:00".to_string());
        assert_eq!(naive.to_epoch_millis().unwrap(), Some(1_704_096_000_000));

        let spaced = RawTimestamp::Text("2024-01-01 08:00:00.250".to_string());
        assert_eq!(spaced.to_epoch_millis().unwrap(), Some(1_704_096_000_250));

        let date_only = RawTimestamp::Text("2024-01-01".to_string());
        assert_eq!(date_only.to_epoch_millis().unwrap(), Some(1_704_067_200_000));

        let millis = RawTimestamp::Millis(1_704_096_000_000.0);
        assert_eq!(millis.to_epoch_millis().unwrap(), Some(1_704_096_000_000));

        let garbage = RawTimestamp::Text("yesterday".to_string());
        assert!(matches!(
            garbage.to_epoch_millis(),
            Err(ReplayError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_unparseable_timestamp_counts_as_missing() {
        let json = r#"[
            {"latitude": 0.0, "longitude": 0.0, "timestamp": "2024-01-01T08:00:00Z"},
            {"latitude": 0.0, "longitude": 0.001, "timestamp": "not a date"}
        ]"#;
        let route = Route::from_json_str(json, &PlaybackConfig::default()).unwrap();
        assert!(route.samples()[1].timestamp.is_none());
        assert_eq!(route.timing(), Timing::Synthetic { interval_ms: 1000 });
    }

    #[test]
    fn test_malformed_json_is_error() {
        let result = Route::from_json_str(r#"[{"latitude": 1.0}]"#, &PlaybackConfig::default());
        assert!(matches!(result, Err(ReplayError::Json(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let config = PlaybackConfig::default();
        let result = Route::load("/nonexistent/route.json", &config);
        assert!(matches!(result, Err(ReplayError::Io { .. })));

        let route = load_route_or_empty("/nonexistent/route.json", &config);
        assert!(route.is_empty());
    }

    #[test]
    fn test_load_route_file() {
        let config = PlaybackConfig::default();
        let path = std::env::temp_dir().join(format!(
            "route_replay_load_{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"[
                {"latitude": 17.385, "longitude": 78.4866, "timestamp": "2024-01-01T08:00:00Z"},
                {"latitude": 17.386, "longitude": 78.4870, "timestamp": "2024-01-01T08:00:04Z"},
                {"latitude": 17.387, "longitude": 78.4875, "timestamp": "2024-01-01T08:00:10Z"}
            ]"#,
        )
        .unwrap();

        let route = Route::load(&path, &config).unwrap();
        assert_eq!(route.normalized_timestamps(), &[0, 4000, 10_000]);
        assert_eq!(route.start_timestamp(), Some(1_704_096_000_000));

        let fallback = load_route_or_empty(&path, &config);
        assert_eq!(fallback.len(), 3);
        assert_eq!(fallback.total_duration(), 10_000);

        let _ = std::fs::remove_file(&path);
    }
}
