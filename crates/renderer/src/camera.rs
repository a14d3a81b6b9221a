//! Free-fly camera for the demo scene.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Camera with position and Euler rotation (pitch/yaw/roll, radians).
///
/// The view matrix is derived on every call rather than cached; the pose
/// changes every frame, so a cache would only add a staleness hazard.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Vec3,
    /// Euler rotation: x = pitch, y = yaw, z = roll.
    pub rotation: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            fov_degrees: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    /// Update aspect ratio (call on window resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Copy position and rotation from the viewer pose. Called once per
    /// frame before rendering.
    pub fn set_pose(&mut self, position: Vec3, rotation: Vec3) {
        self.position = position;
        self.rotation = rotation;
    }

    /// Rotation as a quaternion. Yaw, then pitch, then roll; zero yaw
    /// looks down +Z.
    fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y,
            self.rotation.x,
            self.rotation.z,
        )
    }

    /// World-space forward direction.
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    /// Get the view matrix. Recomputed from the pose on every call.
    pub fn view_matrix(&self) -> Mat4 {
        let orientation = self.orientation();
        let target = self.position + orientation * Vec3::Z;
        let up = orientation * Vec3::Y;
        Mat4::look_at_rh(self.position, target, up)
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Zero rotation looks down +Z; the view transform must carry a point
    /// ahead of the camera onto the negative view-space Z axis.
    #[test]
    fn zero_rotation_looks_along_positive_z() {
        let mut camera = Camera::default();
        camera.set_pose(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO);

        let ahead = camera.view_matrix().transform_point3(Vec3::new(0.0, 0.0, 40.0));
        assert!(ahead.z < 0.0, "point ahead should be in front (view -Z), got {:?}", ahead);
        assert!(ahead.x.abs() < 1e-5 && ahead.y.abs() < 1e-5);
    }

    /// The view matrix follows the pose immediately; nothing is cached.
    #[test]
    fn view_matrix_tracks_pose() {
        let mut camera = Camera::default();
        camera.set_pose(Vec3::ZERO, Vec3::ZERO);
        let before = camera.view_matrix();
        camera.set_pose(Vec3::new(3.0, 1.0, 0.0), Vec3::new(0.2, 0.4, 0.0));
        let after = camera.view_matrix();
        assert_ne!(before, after);
    }
}
