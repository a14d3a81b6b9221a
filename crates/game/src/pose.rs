//! Viewer pose and free-fly movement.

use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Movement speed in units per millisecond.
const MOVE_SPEED: f32 = 0.05;
/// Vertical speed in units per millisecond.
const VERTICAL_SPEED: f32 = 0.015;
/// Keyboard turn rate in radians per millisecond.
const TURN_SPEED: f32 = 0.0015;
/// Keyboard look rate in radians per millisecond.
const LOOK_SPEED: f32 = 0.001;
/// Mouse look in radians per count, before the config multiplier.
const MOUSE_SENSITIVITY: f32 = 0.005;

/// One frame of movement input, assembled from the input snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub ascend: bool,
    pub descend: bool,
    pub look_up: bool,
    pub look_down: bool,
    pub mouse_delta: Vec2,
}

/// The viewer's position and orientation. Free-fly: no collision, no
/// bounds. Velocities are constant, so integration is linear in delta time.
#[derive(Debug, Clone)]
pub struct Pose {
    pub position: Vec3,
    /// Euler rotation: x = pitch, y = yaw, z = roll (radians).
    pub rotation: Vec3,
    sensitivity: f32,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Vec3, sensitivity: f32) -> Self {
        Self {
            position,
            rotation,
            sensitivity,
        }
    }

    /// Apply one frame of input. Turning resolves before translation, so
    /// movement follows the already-updated heading.
    pub fn update(&mut self, delta_ms: f32, intent: &MoveIntent) {
        if intent.turn_left {
            self.rotation.y -= TURN_SPEED * delta_ms;
        }
        if intent.turn_right {
            self.rotation.y += TURN_SPEED * delta_ms;
        }
        if intent.look_up {
            self.rotation.x -= LOOK_SPEED * delta_ms;
        }
        if intent.look_down {
            self.rotation.x += LOOK_SPEED * delta_ms;
        }

        self.rotation.y += intent.mouse_delta.x * MOUSE_SENSITIVITY * self.sensitivity;
        self.rotation.x += intent.mouse_delta.y * MOUSE_SENSITIVITY * self.sensitivity;

        // Keep pitch off the poles and yaw bounded.
        let max_pitch = FRAC_PI_2 - 0.01;
        self.rotation.x = self.rotation.x.clamp(-max_pitch, max_pitch);
        self.rotation.y = self.rotation.y.rem_euclid(TAU);

        let heading = Vec3::new(self.rotation.y.sin(), 0.0, self.rotation.y.cos());
        if intent.forward {
            self.position += heading * (MOVE_SPEED * delta_ms);
        }
        if intent.backward {
            self.position -= heading * (MOVE_SPEED * delta_ms);
        }
        if intent.ascend {
            self.position.y += VERTICAL_SPEED * delta_ms;
        }
        if intent.descend {
            self.position.y -= VERTICAL_SPEED * delta_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose() -> Pose {
        Pose::new(Vec3::ZERO, Vec3::ZERO, 1.0)
    }

    /// Two half-steps must land where one full step does: integration is
    /// linear in delta time.
    #[test]
    fn movement_is_frame_rate_independent() {
        let intent = MoveIntent {
            forward: true,
            ascend: true,
            ..Default::default()
        };

        let mut whole = pose();
        whole.update(16.0, &intent);

        let mut halves = pose();
        halves.update(8.0, &intent);
        halves.update(8.0, &intent);

        assert!(
            whole.position.distance(halves.position) < 1e-4,
            "{:?} vs {:?}",
            whole.position,
            halves.position
        );
    }

    /// Forward motion follows the yaw heading.
    #[test]
    fn forward_follows_heading() {
        let mut p = Pose::new(Vec3::ZERO, Vec3::new(0.0, FRAC_PI_2, 0.0), 1.0);
        p.update(
            10.0,
            &MoveIntent {
                forward: true,
                ..Default::default()
            },
        );
        assert!(p.position.x > 0.4, "yaw 90° should move +X, got {:?}", p.position);
        assert!(p.position.z.abs() < 1e-4);
    }

    /// Pitch stays clamped under arbitrarily large mouse input.
    #[test]
    fn pitch_is_clamped() {
        let mut p = pose();
        p.update(
            16.0,
            &MoveIntent {
                mouse_delta: Vec2::new(0.0, 1e6),
                ..Default::default()
            },
        );
        assert!(p.rotation.x < FRAC_PI_2);

        p.update(
            16.0,
            &MoveIntent {
                mouse_delta: Vec2::new(0.0, -1e7),
                ..Default::default()
            },
        );
        assert!(p.rotation.x > -FRAC_PI_2);
    }

    /// No input, no motion.
    #[test]
    fn idle_pose_is_stable() {
        let mut p = Pose::new(Vec3::new(0.0, -198.0, -200.0), Vec3::ZERO, 1.0);
        p.update(16.0, &MoveIntent::default());
        assert_eq!(p.position, Vec3::new(0.0, -198.0, -200.0));
        assert_eq!(p.rotation, Vec3::ZERO);
    }
}
