//! FFI bindings for host presentation layers.
//!
//! Thin wrappers over the global [`PLAYER`](crate::PLAYER). Large payloads
//! cross the boundary as JSON strings; the host renders them as-is.
//!
//! A host drives playback with its own frame loop:
//! ask `player_pending_frame()` for a token, wait for the next display frame,
//! then hand the token to `player_on_frame()`. A token cancelled in between
//! by pause or reset is ignored.

use log::{debug, info, warn};

use crate::clock::{FrameOutcome, FrameToken};
use crate::player::{with_player, ControlState};
use crate::route::Route;
use crate::{Bounds, GpsPoint};

/// Initialize logging (call once at app startup).
#[uniffi::export]
pub fn player_init() {
    crate::init_logging();
    info!("[RouteReplay] Initialized");
}

/// Load a route from route-file JSON.
///
/// Returns the error message on failure, in which case the player continues
/// with an empty route.
#[uniffi::export]
pub fn player_load_route_json(json: String) -> Option<String> {
    with_player(|p| {
        let config = p.config().clone();
        match Route::from_json_str(&json, &config) {
            Ok(route) => {
                p.replace_route(route);
                None
            }
            Err(e) => {
                warn!("[RouteReplay] Route load failed: {}", e);
                p.replace_route(Route::empty(&config));
                Some(e.to_string())
            }
        }
    })
}

#[uniffi::export]
pub fn player_play() {
    with_player(|p| p.play());
}

#[uniffi::export]
pub fn player_pause() {
    with_player(|p| p.pause());
}

#[uniffi::export]
pub fn player_reset() {
    with_player(|p| p.reset());
}

/// Seek to a fraction of the route, clamped to [0, 1].
#[uniffi::export]
pub fn player_seek(fraction: f64) {
    with_player(|p| p.seek_to(fraction));
}

/// Seek from the scrub slider (0..=1000 by default).
#[uniffi::export]
pub fn player_seek_step(step: u32) {
    with_player(|p| p.seek_to_step(step));
}

/// Change playback speed. Returns false if the multiplier was rejected.
#[uniffi::export]
pub fn player_set_speed(multiplier: f64) -> bool {
    with_player(|p| match p.set_speed(multiplier) {
        Ok(()) => true,
        Err(e) => {
            debug!("[RouteReplay] {}", e);
            false
        }
    })
}

/// Token the next display frame should deliver, if playing.
#[uniffi::export]
pub fn player_pending_frame() -> Option<u64> {
    with_player(|p| p.pending_frame().map(|t| t.id()))
}

/// Deliver a display frame. Returns true if another frame is wanted.
#[uniffi::export]
pub fn player_on_frame(token: u64) -> bool {
    with_player(|p| {
        matches!(
            p.on_frame(FrameToken::from_id(token)),
            FrameOutcome::Advanced { .. }
        )
    })
}

#[uniffi::export]
pub fn player_control_state() -> ControlState {
    with_player(|p| p.control_state())
}

/// Bounding box of the loaded route for framing the initial map view.
/// `None` for an empty route.
#[uniffi::export]
pub fn player_bounds() -> Option<Bounds> {
    with_player(|p| p.bounds())
}

/// Where the marker is drawn right now (mid-glide).
#[uniffi::export]
pub fn player_marker_position() -> GpsPoint {
    with_player(|p| p.marker_display_position())
}

/// Map payload as JSON: {"fullRoute": [[lat, lng], ...], "traveledRoute": ...,
/// "markerPosition": [lat, lng], "markerBearing": deg, "glideDurationMs": ms}
#[uniffi::export]
pub fn player_map_view_json() -> String {
    with_player(|p| serde_json::to_string(&p.map_view()).unwrap_or_else(|_| "{}".to_string()))
}

/// Status panel labels as JSON.
#[uniffi::export]
pub fn player_status_json() -> String {
    with_player(|p| serde_json::to_string(&p.status_view()).unwrap_or_else(|_| "{}".to_string()))
}
