//! Playback configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::GpsPoint;

/// Configuration for route building, playback and marker animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Cadence used when the route lacks real timestamps.
    /// Default: 1000 ms (one sample per second)
    pub synthetic_interval_ms: u64,

    /// Floor for a segment's duration when locating alpha, so duplicate
    /// timestamps never divide by zero.
    /// Default: 1 ms
    pub min_segment_ms: u64,

    /// Floor for the time window used to derive segment speed.
    /// Default: 1.0 s
    pub min_speed_window_secs: f64,

    /// Shortest marker glide.
    /// Default: 250 ms
    pub min_glide_ms: f64,

    /// Lowest speed multiplier used when scaling glide duration.
    /// Default: 0.25
    pub min_glide_speed: f64,

    /// Resolution of the scrub slider.
    /// Default: 1000 steps
    pub scrub_steps: u32,

    /// Marker position while no route is loaded.
    /// Default: Hyderabad (17.385044, 78.486671)
    pub initial_center: GpsPoint,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            synthetic_interval_ms: 1000,
            min_segment_ms: 1,
            min_speed_window_secs: 1.0,
            min_glide_ms: 250.0,
            min_glide_speed: 0.25,
            scrub_steps: 1000,
            initial_center: GpsPoint::new(17.385044, 78.486671),
        }
    }
}

impl PlaybackConfig {
    /// Parse a config from JSON; fields left out keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.synthetic_interval_ms, 1000);
        assert_eq!(config.scrub_steps, 1000);
        assert_eq!(config.min_glide_ms, 250.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PlaybackConfig::from_json_str(r#"{"minGlideMs": 100.0}"#).unwrap();
        assert_eq!(config.min_glide_ms, 100.0);
        assert_eq!(config.synthetic_interval_ms, 1000);
        assert_eq!(config.initial_center, GpsPoint::new(17.385044, 78.486671));
    }

    #[test]
    fn test_malformed_json() {
        assert!(PlaybackConfig::from_json_str("{").is_err());
    }
}
