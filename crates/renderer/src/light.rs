//! Directional light parameters for the lit techniques.

use glam::{Vec3, Vec4};

/// A single directional light, constant for the session.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub specular_power: f32,
}

impl DirectionalLight {
    pub fn new(
        direction: Vec3,
        ambient: Vec4,
        diffuse: Vec4,
        specular: Vec4,
        specular_power: f32,
    ) -> Self {
        Self {
            direction,
            ambient,
            diffuse,
            specular,
            specular_power,
        }
    }
}

