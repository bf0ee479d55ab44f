//! # Playback Clock
//!
//! Maps wall-clock time onto a virtual elapsed time `T` in
//! `[0, total_duration]` milliseconds.
//!
//! ## Frame driving
//!
//! Advancement is cooperative: while playing, the clock holds exactly one
//! pending [`FrameToken`]. The host waits for its next display frame and
//! hands the token back through [`PlaybackClock::on_frame`], which advances
//! `T` and issues the next token. `play()` supersedes any earlier token and
//! `pause()`/`reset()` clear it, so a frame delivered after cancellation is
//! ignored instead of advancing the clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ReplayError, Result};

// ============================================================================
// Time Sources
// ============================================================================

/// Source of wall-clock time in milliseconds.
pub trait TimeSource: Send {
    fn now_ms(&self) -> f64;
}

/// Monotonic wall clock measured from its creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Externally driven time. Clones share the same instant, so a host (or a
/// test) can keep one handle and move time for the clock holding another.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    bits: Arc<AtomicU64>,
}

impl ManualTime {
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_ms.to_bits())),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.bits.store(now_ms.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.set(self.now_ms() + delta_ms);
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

// ============================================================================
// Playback Types
// ============================================================================

/// Transport state of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum PlaybackStatus {
    /// At rest; either fresh, after `reset()`, or after seeking from rest
    Stopped,
    Playing,
    /// Frozen mid-route, or at the end once playback completes
    Paused,
}

/// Handle of the single pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn id(&self) -> u64 {
        self.0
    }

    pub fn from_id(id: u64) -> Self {
        Self(id)
    }
}

/// What a delivered frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Time advanced; deliver `next` on the following frame.
    Advanced { virtual_time: f64, next: FrameToken },
    /// Playback reached the end and stopped scheduling frames.
    Completed { virtual_time: f64 },
    /// Stale or cancelled token; nothing changed.
    Ignored,
}

/// Speed selector options offered to the user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    Half,
    #[default]
    Normal,
    Double,
    Quadruple,
}

impl PlaybackSpeed {
    pub fn all() -> &'static [PlaybackSpeed] {
        &[
            PlaybackSpeed::Half,
            PlaybackSpeed::Normal,
            PlaybackSpeed::Double,
            PlaybackSpeed::Quadruple,
        ]
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaybackSpeed::Half => "0.5×",
            PlaybackSpeed::Normal => "1×",
            PlaybackSpeed::Double => "2×",
            PlaybackSpeed::Quadruple => "4×",
        }
    }

    /// The option matching a multiplier exactly, if any.
    pub fn from_multiplier(multiplier: f64) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|s| s.multiplier() == multiplier)
    }
}

// ============================================================================
// Playback Clock
// ============================================================================

/// Virtual playback clock.
///
/// While playing, `T = min(total, (now - anchor) * speed)`. Every operation
/// that changes position or rate re-anchors so `T` never jumps on its own.
#[derive(Debug)]
pub struct PlaybackClock<T: TimeSource = MonotonicTime> {
    time_source: T,
    total_duration: f64,
    virtual_time: f64,
    speed: f64,
    status: PlaybackStatus,
    /// Wall time at which `T` would have been 0 at the current speed
    anchor: f64,
    pending: Option<FrameToken>,
    next_token: u64,
}

impl PlaybackClock<MonotonicTime> {
    /// Create a clock over `total_duration` milliseconds using the wall clock.
    pub fn new(total_duration: u64) -> Self {
        Self::with_time_source(total_duration, MonotonicTime::new())
    }
}

impl<T: TimeSource> PlaybackClock<T> {
    pub fn with_time_source(total_duration: u64, time_source: T) -> Self {
        Self {
            time_source,
            total_duration: total_duration as f64,
            virtual_time: 0.0,
            speed: 1.0,
            status: PlaybackStatus::Stopped,
            anchor: 0.0,
            pending: None,
            next_token: 0,
        }
    }

    /// Switch to a route of a different length. Playback stops and rewinds;
    /// the speed multiplier carries over.
    pub fn set_total_duration(&mut self, total_duration: u64) {
        self.total_duration = total_duration as f64;
        self.reset();
    }

    // ========================================================================
    // Read Access
    // ========================================================================

    /// Virtual time in milliseconds as of the last operation or frame.
    pub fn virtual_time(&self) -> f64 {
        self.virtual_time
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Whether playback has run to the end of the route.
    pub fn is_at_end(&self) -> bool {
        self.status != PlaybackStatus::Playing && self.virtual_time >= self.total_duration
    }

    /// `T / total`, or 0 for a zero-length route.
    pub fn fraction_elapsed(&self) -> f64 {
        if self.total_duration > 0.0 {
            self.virtual_time / self.total_duration
        } else {
            0.0
        }
    }

    /// The token the next frame should deliver, if playing.
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Current wall time from the clock's time source.
    pub fn now_ms(&self) -> f64 {
        self.time_source.now_ms()
    }

    // ========================================================================
    // Transport Operations
    // ========================================================================

    /// Start or resume playback from the current virtual time.
    pub fn play(&mut self) {
        if self.is_playing() {
            return;
        }

        if self.virtual_time >= self.total_duration {
            // Nothing left to play; completes without waiting for a frame
            self.virtual_time = self.total_duration;
            self.status = PlaybackStatus::Paused;
            self.pending = None;
            debug!("[PlaybackClock] play() at end, completed immediately");
            return;
        }

        self.status = PlaybackStatus::Playing;
        self.reanchor();
        self.pending = Some(self.issue_token());
        debug!(
            "[PlaybackClock] Playing from {:.0} ms at {}x",
            self.virtual_time, self.speed
        );
    }

    /// Freeze playback at the current virtual time.
    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.virtual_time = self.live_time();
        self.status = PlaybackStatus::Paused;
        self.pending = None;
        debug!("[PlaybackClock] Paused at {:.0} ms", self.virtual_time);
    }

    /// Stop and rewind to the start.
    pub fn reset(&mut self) {
        self.pending = None;
        self.status = PlaybackStatus::Stopped;
        self.virtual_time = 0.0;
        self.anchor = self.now_ms();
        debug!("[PlaybackClock] Reset");
    }

    /// Jump to `fraction` of the route's duration, clamped to `[0, 1]`.
    pub fn seek_to(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.virtual_time = fraction * self.total_duration;
        if self.is_playing() {
            self.reanchor();
        }
    }

    /// Change the playback rate without moving the current virtual time.
    ///
    /// Rejects non-finite or non-positive multipliers, keeping the old one.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<()> {
        // Subnormal multipliers would overflow the anchor to -inf
        if !multiplier.is_finite() || multiplier < f64::MIN_POSITIVE {
            return Err(ReplayError::InvalidSpeed(multiplier));
        }
        if self.is_playing() {
            self.virtual_time = self.live_time();
            self.speed = multiplier;
            self.reanchor();
        } else {
            self.speed = multiplier;
        }
        Ok(())
    }

    // ========================================================================
    // Frame Driving
    // ========================================================================

    /// Deliver a display frame for `token`.
    pub fn on_frame(&mut self, token: FrameToken) -> FrameOutcome {
        if !self.is_playing() || self.pending != Some(token) {
            return FrameOutcome::Ignored;
        }

        self.virtual_time = self.live_time();
        if self.virtual_time >= self.total_duration {
            self.virtual_time = self.total_duration;
            self.status = PlaybackStatus::Paused;
            self.pending = None;
            debug!("[PlaybackClock] Reached end at {:.0} ms", self.virtual_time);
            return FrameOutcome::Completed {
                virtual_time: self.virtual_time,
            };
        }

        let next = self.issue_token();
        self.pending = Some(next);
        FrameOutcome::Advanced {
            virtual_time: self.virtual_time,
            next,
        }
    }

    /// Deliver a frame for whatever token is pending.
    pub fn tick(&mut self) -> FrameOutcome {
        match self.pending {
            Some(token) => self.on_frame(token),
            None => FrameOutcome::Ignored,
        }
    }

    fn live_time(&self) -> f64 {
        let elapsed = (self.now_ms() - self.anchor) * self.speed;
        elapsed.clamp(0.0, self.total_duration)
    }

    fn reanchor(&mut self) {
        self.anchor = self.now_ms() - self.virtual_time / self.speed;
    }

    fn issue_token(&mut self) -> FrameToken {
        self.next_token += 1;
        FrameToken(self.next_token)
    }
}
