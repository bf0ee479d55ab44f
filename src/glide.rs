//! Cosmetic marker glide between two drawn positions.
//!
//! The drawn marker never snaps: each new target starts a linear glide from
//! wherever the marker currently is. The glide has its own timeline and
//! never feeds back into the playback clock.

use crate::GpsPoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerGlide {
    from: GpsPoint,
    to: GpsPoint,
    started_at: f64,
    duration_ms: f64,
}

impl MarkerGlide {
    /// A glide already settled at `position`.
    pub fn settled(position: GpsPoint) -> Self {
        Self {
            from: position,
            to: position,
            started_at: 0.0,
            duration_ms: 0.0,
        }
    }

    pub fn target(&self) -> GpsPoint {
        self.to
    }

    /// Progress through the glide at wall time `now_ms`, in `[0, 1]`.
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.started_at) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Where the marker should be drawn at wall time `now_ms`.
    pub fn position_at(&self, now_ms: f64) -> GpsPoint {
        let a = self.progress(now_ms);
        GpsPoint::new(
            self.from.latitude + (self.to.latitude - self.from.latitude) * a,
            self.from.longitude + (self.to.longitude - self.from.longitude) * a,
        )
    }

    pub fn is_settled(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }

    /// Glide towards `to` over `duration_ms`, starting from the marker's
    /// current drawn position.
    pub fn retarget(&mut self, to: GpsPoint, duration_ms: f64, now_ms: f64) {
        if to == self.to {
            return;
        }
        self.from = self.position_at(now_ms);
        self.to = to;
        self.started_at = now_ms;
        self.duration_ms = if duration_ms.is_finite() {
            duration_ms.max(0.0)
        } else {
            0.0
        };
    }

    /// Jump straight to `position` with no animation.
    pub fn snap(&mut self, position: GpsPoint) {
        *self = Self::settled(position);
    }
}

/// How long the marker takes to glide across the current segment.
///
/// Scales the segment's recorded duration by playback speed, never going
/// below `min_glide_ms`.
pub fn glide_duration(
    segment_ms: Option<u64>,
    speed: f64,
    min_glide_ms: f64,
    min_glide_speed: f64,
) -> f64 {
    match segment_ms {
        Some(ms) => (ms as f64 / speed.max(min_glide_speed)).max(min_glide_ms),
        None => min_glide_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glide_reaches_target() {
        let mut glide = MarkerGlide::settled(GpsPoint::new(0.0, 0.0));
        glide.retarget(GpsPoint::new(0.0, 1.0), 500.0, 1000.0);

        assert_eq!(glide.position_at(1000.0), GpsPoint::new(0.0, 0.0));
        assert!((glide.position_at(1250.0).longitude - 0.5).abs() < 1e-12);
        assert!(!glide.is_settled(1250.0));
        assert_eq!(glide.position_at(1500.0), GpsPoint::new(0.0, 1.0));
        assert_eq!(glide.position_at(9000.0), GpsPoint::new(0.0, 1.0));
        assert!(glide.is_settled(1500.0));
    }

    #[test]
    fn test_retarget_starts_from_drawn_position() {
        let mut glide = MarkerGlide::settled(GpsPoint::new(0.0, 0.0));
        glide.retarget(GpsPoint::new(0.0, 1.0), 1000.0, 0.0);
        glide.retarget(GpsPoint::new(0.0, 2.0), 1000.0, 500.0);

        assert!((glide.position_at(500.0).longitude - 0.5).abs() < 1e-12);
        assert!((glide.position_at(1000.0).longitude - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_same_target_keeps_glide() {
        let mut glide = MarkerGlide::settled(GpsPoint::new(0.0, 0.0));
        glide.retarget(GpsPoint::new(0.0, 1.0), 1000.0, 0.0);
        glide.retarget(GpsPoint::new(0.0, 1.0), 1000.0, 800.0);
        assert!((glide.position_at(900.0).longitude - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_snap() {
        let mut glide = MarkerGlide::settled(GpsPoint::new(0.0, 0.0));
        glide.retarget(GpsPoint::new(0.0, 1.0), 1000.0, 0.0);
        glide.snap(GpsPoint::new(5.0, 5.0));
        assert_eq!(glide.position_at(10.0), GpsPoint::new(5.0, 5.0));
    }

    #[test]
    fn test_glide_duration() {
        assert_eq!(glide_duration(Some(1000), 1.0, 250.0, 0.25), 1000.0);
        assert_eq!(glide_duration(Some(1000), 4.0, 250.0, 0.25), 250.0);
        assert_eq!(glide_duration(Some(1000), 8.0, 250.0, 0.25), 250.0);
        assert_eq!(glide_duration(Some(1000), 0.1, 250.0, 0.25), 4000.0);
        assert_eq!(glide_duration(None, 1.0, 250.0, 0.25), 250.0);
    }
}
