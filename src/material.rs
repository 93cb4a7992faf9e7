use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Surface parameters the geometry pass writes into the G-buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Vec3,
    pub shininess: f32,
    pub spec_intensity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            shininess: 32.0,
            spec_intensity: 0.5,
        }
    }
}

impl Material {
    /// Value of the packed specular channel: x = intensity, y = shininess.
    pub fn packed_specular(&self) -> Vec2 {
        Vec2::new(self.spec_intensity, self.shininess)
    }
}
