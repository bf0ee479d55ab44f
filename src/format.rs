//! Display formatting for the status panel.
//!
//! All helpers are total: they never fail and never panic, whatever the input.

use chrono::{DateTime, SecondsFormat};

/// Format milliseconds as `H:MM:SS` (hours unpadded).
///
/// Negative and non-finite durations render as `0:00:00`.
pub fn fmt_time(ms: f64) -> String {
    let total_secs = if ms.is_finite() && ms > 0.0 {
        (ms / 1000.0).floor() as u64
    } else {
        0
    };
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{}:{:02}:{:02}", h, m, s)
}

/// Format a latitude or longitude to 6 decimal places.
pub fn fmt_lat_lng(value: f64) -> String {
    format!("{:.6}", value)
}

/// Format a speed given in m/s as km/h with one decimal.
pub fn fmt_speed(mps: f64) -> String {
    format!("{:.1} km/h", mps * 3.6)
}

/// Format a distance in meters: whole meters below 1 km, else km with 2 decimals.
pub fn fmt_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// Timestamp label for the status panel.
///
/// With a real start timestamp this is the ISO-8601 UTC instant of
/// `start + elapsed`; with synthetic timing it is the relative `+H:MM:SS`.
pub fn fmt_timestamp(start_ms: Option<i64>, elapsed_ms: f64) -> String {
    let absolute = start_ms.and_then(|start| {
        let offset = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0).floor() as i64
        } else {
            0
        };
        DateTime::from_timestamp_millis(start.saturating_add(offset))
    });

    match absolute {
        Some(instant) => instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => format!("+{}", fmt_time(elapsed_ms)),
    }
}
