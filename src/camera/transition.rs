use std::f64::consts::FRAC_PI_2;

use crate::{camera::model::Camera, foundation::math::clamp01};

/// Raised-sine easing weight `sin²(π·p/2)`.
pub fn raised_sine(p: f64) -> f64 {
    let s = (FRAC_PI_2 * clamp01(p)).sin();
    s * s
}

/// An in-flight programmatic camera move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTransition {
    pub start_ms: f64,
    pub duration_ms: f64,
    pub from: Camera,
    pub to: Camera,
}

impl CameraTransition {
    pub fn new(start_ms: f64, duration_ms: f64, from: Camera, to: Camera) -> Self {
        Self {
            start_ms,
            duration_ms,
            from: from.clamped(),
            to: to.clamped(),
        }
    }

    /// Normalized progress in `[0, 1]`; non-positive durations complete immediately.
    pub fn progress(&self, now_ms: f64) -> f64 {
        if !(self.duration_ms > 0.0) {
            return 1.0;
        }
        clamp01((now_ms - self.start_ms) / self.duration_ms)
    }

    /// Camera at `now_ms`, and whether the transition has finished.
    pub fn sample(&self, now_ms: f64) -> (Camera, bool) {
        let p = self.progress(now_ms);
        if p >= 1.0 {
            return (self.to, true);
        }
        (Camera::blend(&self.from, &self.to, raised_sine(p)), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raised_sine_endpoints_and_symmetry() {
        assert_eq!(raised_sine(0.0), 0.0);
        assert!((raised_sine(1.0) - 1.0).abs() < 1e-12);
        assert!((raised_sine(0.5) - 0.5).abs() < 1e-12);
        assert!((raised_sine(0.25) + raised_sine(0.75) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sample_blends_and_terminates() {
        let tr = CameraTransition::new(
            1000.0,
            500.0,
            Camera::new(0.0, 0.0, 1.0),
            Camera::new(100.0, -50.0, 2.0),
        );
        let (start, done) = tr.sample(1000.0);
        assert!(!done);
        assert_eq!(start, Camera::new(0.0, 0.0, 1.0));

        let (mid, done) = tr.sample(1250.0);
        assert!(!done);
        assert!((mid.cx - 50.0).abs() < 1e-9);
        assert!((mid.cy + 25.0).abs() < 1e-9);
        assert!((mid.zoom - 1.5).abs() < 1e-9);

        let (end, done) = tr.sample(1600.0);
        assert!(done);
        assert_eq!(end, Camera::new(100.0, -50.0, 2.0));
    }

    #[test]
    fn zero_duration_is_instant() {
        let tr = CameraTransition::new(0.0, 0.0, Camera::default(), Camera::new(5.0, 5.0, 3.0));
        assert_eq!(tr.sample(0.0), (Camera::new(5.0, 5.0, 3.0), true));
    }

    #[test]
    fn progress_before_start_is_zero() {
        let tr = CameraTransition::new(100.0, 10.0, Camera::default(), Camera::default());
        assert_eq!(tr.progress(50.0), 0.0);
    }
}
