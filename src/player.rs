//! # Route Player
//!
//! The control surface a presentation layer drives. Owns one [`Route`], its
//! [`PlaybackClock`] and the marker glide, and derives on demand everything
//! the map and the status panel render.
//!
//! ## Architecture
//!
//! - Transport operations go straight to the clock.
//! - Positions, labels and map payloads are recomputed from
//!   `(route, virtual time)` on every read, never cached.
//! - The glide is retargeted after each operation or advancing frame; it is
//!   read-only with respect to the clock.
//!
//! Hosts calling through thin bindings share the global [`PLAYER`].

use std::sync::{Mutex, PoisonError};

use log::info;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::clock::{FrameOutcome, FrameToken, MonotonicTime, PlaybackClock, TimeSource};
use crate::config::PlaybackConfig;
use crate::error::Result;
use crate::format::{fmt_distance, fmt_lat_lng, fmt_speed, fmt_time, fmt_timestamp};
use crate::glide::{glide_duration, MarkerGlide};
use crate::interpolate::InterpolatedPosition;
use crate::route::Route;
use crate::{Bounds, GpsPoint};

// ============================================================================
// Views
// ============================================================================

/// Payload for the map rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    /// Whole route as `[lat, lng]` pairs
    pub full_route: Vec<[f64; 2]>,
    /// Driven part of the route, ending at the marker
    pub traveled_route: Vec<[f64; 2]>,
    pub marker_position: [f64; 2],
    /// Marker rotation in degrees
    pub marker_bearing: f64,
    pub glide_duration_ms: f64,
}

/// Formatted labels for the status panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub latitude: String,
    pub longitude: String,
    pub timestamp: String,
    pub elapsed: String,
    pub speed: String,
    pub distance: String,
}

/// Snapshot of the transport controls for binding to widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ControlState {
    pub virtual_time: f64,
    pub total_duration: f64,
    pub is_playing: bool,
    pub speed_multiplier: f64,
    pub fraction_elapsed: f64,
    /// Scrub slider position in `0..=scrub_steps`
    pub scrub_step: u32,
}

fn lat_lng(p: &GpsPoint) -> [f64; 2] {
    [p.latitude, p.longitude]
}

// ============================================================================
// Route Player
// ============================================================================

pub struct RoutePlayer<T: TimeSource = MonotonicTime> {
    route: Route,
    clock: PlaybackClock<T>,
    glide: MarkerGlide,
    config: PlaybackConfig,
}

impl RoutePlayer<MonotonicTime> {
    /// Create a player over `route` driven by the wall clock.
    pub fn new(route: Route, config: PlaybackConfig) -> Self {
        Self::with_time_source(route, config, MonotonicTime::new())
    }
}

impl Default for RoutePlayer<MonotonicTime> {
    fn default() -> Self {
        let config = PlaybackConfig::default();
        Self::new(Route::empty(&config), config)
    }
}

impl<T: TimeSource> RoutePlayer<T> {
    pub fn with_time_source(route: Route, config: PlaybackConfig, time_source: T) -> Self {
        let clock = PlaybackClock::with_time_source(route.total_duration(), time_source);
        let mut player = Self {
            route,
            clock,
            glide: MarkerGlide::settled(config.initial_center),
            config,
        };
        player.glide.snap(player.marker_target());
        player
    }

    /// Swap in a new route. Playback stops and rewinds to its start.
    pub fn replace_route(&mut self, route: Route) {
        info!(
            "[RouteReplay] Route replaced: {} samples, {} ms, {:.0} m",
            route.len(),
            route.total_duration(),
            route.total_distance()
        );
        self.clock.set_total_duration(route.total_duration());
        self.route = route;
        self.glide.snap(self.marker_target());
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn clock(&self) -> &PlaybackClock<T> {
        &self.clock
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.route.bounds()
    }

    // ========================================================================
    // Transport Operations
    // ========================================================================

    pub fn play(&mut self) {
        self.clock.play();
        self.sync_glide();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
        self.sync_glide();
    }

    pub fn reset(&mut self) {
        self.clock.reset();
        self.sync_glide();
    }

    /// Seek to `fraction` of the route duration (clamped to `[0, 1]`).
    pub fn seek_to(&mut self, fraction: f64) {
        self.clock.seek_to(fraction);
        self.sync_glide();
    }

    /// Seek from the scrub slider, `step` in `0..=scrub_steps`.
    pub fn seek_to_step(&mut self, step: u32) {
        let steps = self.config.scrub_steps.max(1);
        self.seek_to(step.min(steps) as f64 / steps as f64);
    }

    pub fn set_speed(&mut self, multiplier: f64) -> Result<()> {
        self.clock.set_speed(multiplier)?;
        self.sync_glide();
        Ok(())
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.clock.pending_frame()
    }

    pub fn on_frame(&mut self, token: FrameToken) -> FrameOutcome {
        let outcome = self.clock.on_frame(token);
        if outcome != FrameOutcome::Ignored {
            self.sync_glide();
        }
        outcome
    }

    pub fn tick(&mut self) -> FrameOutcome {
        match self.clock.pending_frame() {
            Some(token) => self.on_frame(token),
            None => FrameOutcome::Ignored,
        }
    }

    // ========================================================================
    // Derived Views
    // ========================================================================

    /// Interpolated position at the current virtual time.
    pub fn position(&self) -> Option<InterpolatedPosition> {
        self.route.position_at(self.clock.virtual_time())
    }

    /// Where the marker is heading; the configured center for an empty route.
    pub fn marker_target(&self) -> GpsPoint {
        self.position()
            .map(|p| p.point())
            .unwrap_or(self.config.initial_center)
    }

    /// Where the marker is drawn right now, mid-glide.
    pub fn marker_display_position(&self) -> GpsPoint {
        self.glide.position_at(self.clock.now_ms())
    }

    /// Glide duration for the current segment at the current speed.
    pub fn glide_duration_ms(&self) -> f64 {
        let timestamps = self.route.normalized_timestamps();
        let segment_ms = self.position().and_then(|p| {
            let t1 = timestamps.get(p.segment_index + 1)?;
            Some(t1 - timestamps[p.segment_index])
        });
        glide_duration(
            segment_ms,
            self.clock.speed(),
            self.config.min_glide_ms,
            self.config.min_glide_speed,
        )
    }

    pub fn map_view(&self) -> MapView {
        let t = self.clock.virtual_time();
        let position = self.position();
        MapView {
            full_route: self.route.samples().iter().map(|s| lat_lng(&s.point)).collect(),
            traveled_route: self.route.traveled_at(t).iter().map(lat_lng).collect(),
            marker_position: lat_lng(&self.marker_target()),
            marker_bearing: position.map(|p| p.bearing).unwrap_or(0.0),
            glide_duration_ms: self.glide_duration_ms(),
        }
    }

    pub fn status_view(&self) -> StatusView {
        let t = self.clock.virtual_time();
        let position = self.position();
        let marker = self.marker_target();
        StatusView {
            latitude: fmt_lat_lng(marker.latitude),
            longitude: fmt_lat_lng(marker.longitude),
            timestamp: fmt_timestamp(self.route.start_timestamp(), t),
            elapsed: fmt_time(t),
            speed: fmt_speed(position.map(|p| p.speed_mps).unwrap_or(0.0)),
            distance: fmt_distance(position.map(|p| p.distance_covered).unwrap_or(0.0)),
        }
    }

    pub fn control_state(&self) -> ControlState {
        let fraction = self.clock.fraction_elapsed();
        ControlState {
            virtual_time: self.clock.virtual_time(),
            total_duration: self.clock.total_duration(),
            is_playing: self.clock.is_playing(),
            speed_multiplier: self.clock.speed(),
            fraction_elapsed: fraction,
            scrub_step: (fraction * self.config.scrub_steps as f64).round() as u32,
        }
    }

    fn sync_glide(&mut self) {
        let target = self.marker_target();
        let duration = self.glide_duration_ms();
        let now = self.clock.now_ms();
        self.glide.retarget(target, duration, now);
    }
}

// ============================================================================
// Global Singleton
// ============================================================================

/// Global player instance for hosts that call in through thin bindings.
pub static PLAYER: Lazy<Mutex<RoutePlayer>> = Lazy::new(|| Mutex::new(RoutePlayer::default()));

/// Run `f` with exclusive access to the global player.
pub fn with_player<F, R>(f: F) -> R
where
    F: FnOnce(&mut RoutePlayer) -> R,
{
    let mut player = PLAYER.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut player)
}
