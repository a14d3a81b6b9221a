//! Procedural animation state: the global rotation angle, the rocket
//! launch sequence, and the fire technique's scroll clock.

use engine_core::MotionState;
use std::f32::consts::PI;

/// Global rotation rate in radians per millisecond.
pub const ROTATION_RATE: f32 = PI * 0.0005;
/// Rocket lift rate per millisecond once launched.
pub const LAUNCH_SPEED: f32 = 1.0;
/// Fire scroll-time rate per millisecond (≈0.01 per 60 Hz frame).
const SCROLL_RATE: f32 = 0.0006;
/// Scroll time wraps here to keep f32 precision for texture scrolling.
const SCROLL_WRAP: f32 = 1000.0;

/// Owns the accumulators the original kept as function-static state, so
/// they can be driven deterministically in tests.
#[derive(Debug, Default)]
pub struct AnimationDriver {
    angle: f32,
    lift: f32,
    launched: bool,
    scroll_time: f32,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance all accumulators by one frame.
    ///
    /// The launch trigger latches on the first frame the key is observed
    /// held and stays latched for the rest of the session; there is no
    /// abort or reset. `angle` and `lift` only ever grow.
    pub fn advance(&mut self, delta_ms: f32, launch_held: bool) {
        self.angle += ROTATION_RATE * delta_ms;

        if launch_held && !self.launched {
            self.launched = true;
            log::info!("rocket launch triggered");
        }
        if self.launched {
            self.lift += LAUNCH_SPEED * delta_ms;
        }

        self.scroll_time = (self.scroll_time + SCROLL_RATE * delta_ms) % SCROLL_WRAP;
    }

    /// Current inputs for transform composition.
    pub fn motion_state(&self) -> MotionState {
        MotionState {
            angle: self.angle,
            lift: self.lift,
        }
    }

    /// Elapsed scroll time for the fire technique.
    pub fn scroll_time(&self) -> f32 {
        self.scroll_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One tick of one time unit advances the angle by exactly the literal
    /// rate.
    #[test]
    fn rotation_advances_at_literal_rate() {
        let mut driver = AnimationDriver::new();
        driver.advance(1.0, false);
        assert!((driver.motion_state().angle - PI * 0.0005).abs() < 1e-7);
    }

    /// Before the trigger fires the lift stays at zero.
    #[test]
    fn lift_waits_for_trigger() {
        let mut driver = AnimationDriver::new();
        for _ in 0..100 {
            driver.advance(16.0, false);
        }
        assert_eq!(driver.motion_state().lift, 0.0);
    }

    /// The trigger latches on first observation and the lift rises
    /// monotonically afterwards, whatever the key does later.
    #[test]
    fn launch_latches_and_lift_is_monotonic() {
        let mut driver = AnimationDriver::new();
        driver.advance(16.0, true);
        let mut last = driver.motion_state().lift;
        assert!(last > 0.0);

        for held in [false, true, false, false, true] {
            driver.advance(16.0, held);
            let lift = driver.motion_state().lift;
            assert!(lift > last, "lift must keep rising once launched");
            last = lift;
        }
    }

    /// The scroll clock wraps at its period; the rotation angle never does.
    #[test]
    fn scroll_time_wraps_angle_does_not() {
        let mut driver = AnimationDriver::new();
        driver.advance(2_000_000.0, false);
        assert!((driver.scroll_time() - 200.0).abs() < 1e-2);
        assert!(driver.motion_state().angle > 1000.0);
    }
}
