//! # Route Replay
//!
//! Playback engine for a recorded vehicle route.
//!
//! This library provides:
//! - Route building from timestamped GPS samples (with synthetic timing when
//!   timestamps are missing)
//! - A virtual playback clock with play/pause/reset/seek/speed controls
//! - Time-based interpolation of position, bearing, speed and distance
//! - Map and status-panel payloads for a presentation layer
//!
//! ## Features
//!
//! - **`ffi`** - Enable FFI bindings for host presentation layers
//!
//! ## Quick Start
//!
//! ```rust
//! use route_replay::{PlaybackConfig, Route, RoutePlayer};
//!
//! let json = r#"[
//!     {"latitude": 0.0, "longitude": 0.0,  "timestamp": "2024-01-01T08:00:00Z"},
//!     {"latitude": 0.0, "longitude": 0.01, "timestamp": "2024-01-01T08:00:01Z"},
//!     {"latitude": 0.0, "longitude": 0.02, "timestamp": "2024-01-01T08:00:02Z"}
//! ]"#;
//!
//! let config = PlaybackConfig::default();
//! let route = Route::from_json_str(json, &config).unwrap();
//! let mut player = RoutePlayer::new(route, config);
//!
//! player.seek_to(0.25);
//! let position = player.position().unwrap();
//! assert_eq!(position.segment_index, 0);
//! assert!((position.longitude - 0.005).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{ReplayError, Result};

// Playback configuration
pub mod config;
pub use config::PlaybackConfig;

// Geographic utilities (distance, bearing, bounds)
pub mod geo_utils;

// Status panel formatting
pub mod format;

// Route model and route-file loading
pub mod route;
pub use route::{load_route_or_empty, RawSample, RawTimestamp, Route, Sample, Timing};

// Virtual playback clock
pub mod clock;
pub use clock::{
    FrameOutcome, FrameToken, ManualTime, MonotonicTime, PlaybackClock, PlaybackSpeed,
    PlaybackStatus, TimeSource,
};

// Segment location and interpolation
pub mod interpolate;
pub use interpolate::{interpolate, locate_segment, InterpolatedPosition, SegmentLocation};

// Marker glide animation
pub mod glide;
pub use glide::MarkerGlide;

// Control surface (singleton with the loaded route)
pub mod player;
pub use player::{with_player, ControlState, MapView, RoutePlayer, StatusView, PLAYER};

// FFI bindings for host presentation layers
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("RouteReplayRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use route_replay::GpsPoint;
/// let point = GpsPoint::new(17.385044, 78.486671); // Hyderabad
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        geo_utils::compute_bounds(points)
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
