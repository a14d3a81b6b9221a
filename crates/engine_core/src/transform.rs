//! World-transform composition for scene objects.
//!
//! Each renderable's world matrix is described as an ordered list of
//! [`TransformOp`]s evaluated against the current [`MotionState`]. The list
//! is data, so per-object pipelines can be built, inspected, and tested
//! without touching the GPU.

use glam::{Mat4, Vec3};

/// Live animation inputs for transform evaluation.
///
/// `angle` is the global rotation accumulator driving every spin and orbit;
/// `lift` is the launch height accumulator. Both grow monotonically for the
/// lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionState {
    /// Global rotation angle in radians. Never reset; trig is periodic.
    pub angle: f32,
    /// Launch height. Zero until the launch trigger fires.
    pub lift: f32,
}

/// One step of a world-transform pipeline.
///
/// Ops apply in list order, each in the frame produced so far; matrix
/// multiplication is non-commutative, so the order is part of the contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformOp {
    /// Non-uniform scale.
    Scale(Vec3),
    /// Fixed translation.
    Translate(Vec3),
    /// Rotation about the Y axis by `rate * angle` radians.
    SpinY { rate: f32 },
    /// Rotation about an arbitrary axis by `rate * angle` radians.
    /// The axis does not need to be normalized.
    Orbit { axis: Vec3, rate: f32 },
    /// Translation that rises with launch height:
    /// `base + Y * rate * lift`.
    Ascend { base: Vec3, rate: f32 },
}

impl TransformOp {
    /// Evaluate this op to a matrix for the given motion state.
    pub fn matrix(&self, motion: &MotionState) -> Mat4 {
        match *self {
            TransformOp::Scale(s) => Mat4::from_scale(s),
            TransformOp::Translate(t) => Mat4::from_translation(t),
            TransformOp::SpinY { rate } => Mat4::from_rotation_y(rate * motion.angle),
            TransformOp::Orbit { axis, rate } => {
                Mat4::from_axis_angle(axis.normalize(), rate * motion.angle)
            }
            TransformOp::Ascend { base, rate } => {
                Mat4::from_translation(base + Vec3::Y * (rate * motion.lift))
            }
        }
    }
}

/// Compose an ordered op list into a world matrix.
///
/// Op `i + 1` is applied after op `i` (in world space), i.e. the result is
/// `M(op_n) * … * M(op_1)`. An empty list composes to identity.
pub fn compose(ops: &[TransformOp], motion: &MotionState) -> Mat4 {
    ops.iter()
        .fold(Mat4::IDENTITY, |world, op| op.matrix(motion) * world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const TOLERANCE: f32 = 1e-4;

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        for (ca, cb) in a
            .to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
        {
            assert!((ca - cb).abs() < TOLERANCE, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn empty_list_composes_to_identity() {
        let motion = MotionState { angle: 1.0, lift: 2.0 };
        assert_mat_eq(compose(&[], &motion), Mat4::IDENTITY);
    }

    /// With a zero angle every spin/orbit is identity and only the static
    /// ops remain.
    #[test]
    fn zero_angle_leaves_static_ops_only() {
        let ops = [
            TransformOp::Scale(Vec3::splat(2.0)),
            TransformOp::SpinY { rate: -0.2 },
            TransformOp::Translate(Vec3::new(5.0, 0.0, 0.0)),
            TransformOp::Orbit { axis: Vec3::Y, rate: 0.3 },
        ];
        let world = compose(&ops, &MotionState::default());
        let expected = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0))
            * Mat4::from_scale(Vec3::splat(2.0));
        assert_mat_eq(world, expected);
    }

    /// Swapping the orbital translate and orbital rotate steps must change
    /// the result for a non-zero angle.
    #[test]
    fn orbit_translate_order_is_not_commutative() {
        let motion = MotionState { angle: 0.7, lift: 0.0 };
        let translate = TransformOp::Translate(Vec3::new(100.0, 0.0, 50.0));
        let orbit = TransformOp::Orbit { axis: Vec3::Y, rate: 0.2 };

        let a = compose(&[translate, orbit], &motion);
        let b = compose(&[orbit, translate], &motion);

        let diff: f32 = a
            .to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .map(|(x, y)| (x - y).abs())
            .sum();
        assert!(diff > TOLERANCE, "swapped composition should differ");
    }

    /// The two-body orbit chain must place the body at
    /// `R_primary(angle) * (t_primary + R_secondary(angle) * t_secondary)`.
    #[test]
    fn orbit_chain_matches_closed_form() {
        let theta = 1.3_f32;
        let motion = MotionState { angle: theta, lift: 0.0 };
        let axis = Vec3::new(0.2, 1.0, 0.0);
        let ops = [
            TransformOp::Scale(Vec3::splat(0.003)),
            TransformOp::SpinY { rate: -0.2 },
            TransformOp::Translate(Vec3::new(50.0, 0.0, 0.0)),
            TransformOp::Orbit { axis, rate: 0.3 },
            TransformOp::Translate(Vec3::new(100.0, 0.0, 50.0)),
            TransformOp::Orbit { axis: Vec3::Y, rate: 0.2 },
        ];
        let world = compose(&ops, &motion);

        let inner = Mat4::from_axis_angle(axis.normalize(), 0.3 * theta)
            .transform_point3(Vec3::new(50.0, 0.0, 0.0));
        let expected = Mat4::from_rotation_y(0.2 * theta)
            .transform_point3(Vec3::new(100.0, 0.0, 50.0) + inner);

        let position = world.transform_point3(Vec3::ZERO);
        assert!(
            position.distance(expected) < TOLERANCE,
            "composed {:?} vs closed form {:?}",
            position,
            expected
        );
    }

    /// One tick of the rotation accumulator at its literal rate yields the
    /// literal self-rotation term on the satellite's spin step.
    #[test]
    fn spin_step_reflects_literal_rate() {
        let angle = PI * 0.0005;
        let motion = MotionState { angle, lift: 0.0 };
        let spin = TransformOp::SpinY { rate: -0.2 };
        assert_mat_eq(spin.matrix(&motion), Mat4::from_rotation_y(-angle * 0.2));
    }

    /// Lift only affects `Ascend`, and scales by the op's rate.
    #[test]
    fn ascend_rises_with_lift() {
        let base = Vec3::new(0.0, -200.0, 0.0);
        let op = TransformOp::Ascend { base, rate: 0.2 };

        let grounded = op.matrix(&MotionState { angle: 0.0, lift: 0.0 });
        assert_mat_eq(grounded, Mat4::from_translation(base));

        let airborne = op.matrix(&MotionState { angle: 0.0, lift: 40.0 });
        assert_mat_eq(
            airborne,
            Mat4::from_translation(Vec3::new(0.0, -200.0 + 8.0, 0.0)),
        );
    }
}
