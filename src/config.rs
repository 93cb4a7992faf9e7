use glam::Vec4;

use crate::lights::Attenuation;
use crate::pipeline::LightingPassKind;

/// Which geometry-pass transform block the host binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformVariant {
    /// One block with model, view and projection.
    Combined,
    /// Per-frame view/projection plus per-object model/normal transforms.
    Split,
}

/// Host-side knobs resolved from the scene file and the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    pub clear_color: Vec4,
    pub directional_pass: LightingPassKind,
    pub transform_variant: TransformVariant,
    pub attenuation: Attenuation,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            directional_pass: LightingPassKind::DirectionalSpecular,
            transform_variant: TransformVariant::Split,
            attenuation: Attenuation::DEFAULT,
        }
    }
}
