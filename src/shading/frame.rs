//! Headless evaluation of a whole lighting stage for single pixels.

use glam::{Vec3, Vec4};

use super::ambient;
use crate::gbuffer::GBufferTexel;
use crate::lights::{AmbientLight, DirectionalLight, LightSource};
use crate::pipeline::{LightingPassKind, PipelinePlan};

/// Additive blend the host configures for lighting passes: rgb is summed,
/// alpha keeps the maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAccumulator {
    color: Vec4,
}

impl FrameAccumulator {
    pub fn new(clear: Vec4) -> Self {
        Self { color: clear }
    }

    pub fn add(&mut self, contribution: Vec4) {
        let rgb = self.color.truncate() + contribution.truncate();
        self.color = rgb.extend(self.color.w.max(contribution.w));
    }

    pub fn color(&self) -> Vec4 {
        self.color
    }
}

/// Lights and camera of one frame.
#[derive(Debug, Clone, Copy)]
pub struct LightingFrame<'a> {
    pub ambient: AmbientLight,
    pub directional: &'a [DirectionalLight],
    pub sources: &'a [LightSource],
    pub camera_position: Vec3,
}

impl LightingFrame<'_> {
    /// Runs the ambient pass and one lighting pass per light over `texel`,
    /// in the order the renderer records them.
    pub fn shade(&self, plan: &PipelinePlan, texel: &GBufferTexel, clear: Vec4) -> Vec4 {
        let mut accumulator = FrameAccumulator::new(clear);
        accumulator.add(ambient::shade(texel, &self.ambient));

        let directional = plan.directional_pass();
        for light in self.directional {
            let contribution = match plan.directional_kind() {
                LightingPassKind::Unified => {
                    directional.shade(texel, &LightSource::from(*light), self.camera_position)
                }
                _ => directional.shade(texel, light, self.camera_position),
            };
            accumulator.add(contribution.color);
        }

        for source in self.sources {
            let contribution = plan
                .unified_pass()
                .shade(texel, source, self.camera_position);
            accumulator.add(contribution.color);
        }

        accumulator.color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use crate::gbuffer::GBufferLayout;
    use crate::pipeline::HostBindings;
    use crate::vertex::Vertex;
    use glam::Vec2;

    fn plan(kind: LightingPassKind) -> PipelinePlan {
        let config = RendererConfig {
            directional_pass: kind,
            ..RendererConfig::default()
        };
        PipelinePlan::assemble(
            &config,
            &GBufferLayout::standard(),
            &Vertex::ATTRIBUTES,
            &HostBindings::all(),
        )
        .unwrap()
    }

    #[test]
    fn blend_sums_color_and_keeps_max_alpha() {
        let mut accumulator = FrameAccumulator::new(Vec4::ZERO);
        accumulator.add(Vec4::new(0.25, 0.5, 0.0, 1.0));
        accumulator.add(Vec4::new(0.25, 0.0, 0.125, 1.0));
        assert_eq!(accumulator.color(), Vec4::new(0.5, 0.5, 0.125, 1.0));
    }

    #[test]
    fn frame_is_ambient_plus_every_light() {
        let texel = GBufferTexel {
            color: Vec3::new(1.0, 0.5, 0.25),
            normal: Vec3::Z,
            position: Vec3::ZERO,
            specular: Vec2::new(0.0, 8.0),
        };
        let ambient = AmbientLight {
            color: Vec3::ONE,
            intensity: 0.25,
        };
        let directional = [DirectionalLight {
            color: Vec3::ONE,
            intensity: 1.0,
            position: Vec3::new(0.0, 0.0, 3.0),
        }];
        let frame = LightingFrame {
            ambient,
            directional: &directional,
            sources: &[],
            camera_position: Vec3::new(0.0, 4.0, 4.0),
        };
        let lit = frame.shade(&plan(LightingPassKind::DirectionalSimple), &texel, Vec4::ZERO);
        let expected = texel.color * 0.25 + texel.color;
        assert!((lit.truncate() - expected).length() < 1e-6);
        assert_eq!(lit.w, 1.0);
    }

    #[test]
    fn unlit_frame_is_ambient_only() {
        let texel = GBufferTexel {
            color: Vec3::ONE,
            normal: Vec3::NEG_Z,
            ..Default::default()
        };
        let directional = [DirectionalLight {
            color: Vec3::ONE,
            intensity: 1.0,
            position: Vec3::new(0.0, 0.0, 3.0),
        }];
        let frame = LightingFrame {
            ambient: AmbientLight::default(),
            directional: &directional,
            sources: &[],
            camera_position: Vec3::new(0.0, 0.0, -3.0),
        };
        let lit = frame.shade(&plan(LightingPassKind::DirectionalSimple), &texel, Vec4::ZERO);
        assert_eq!(lit, Vec4::new(0.1, 0.1, 0.1, 1.0));
    }
}
