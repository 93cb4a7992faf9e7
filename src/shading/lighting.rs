//! Parameterized light accumulation pass.
//!
//! The directional, directional+specular and unified passes share one body.
//! What differs between them is fixed when the pipeline is assembled through
//! [`Capabilities`], never branched on per pixel.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::{quantize_diffuse, reflect, CELL_LEVELS};
use crate::gbuffer::GBufferTexel;
use crate::lights::{Attenuation, DirectionalLight, LightSource};

/// Sign of the incident vector handed to `reflect`.
///
/// The directional+specular pass reflects `-light_dir`, the unified pass
/// reflects `light_dir`. Both are kept as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReflectConvention {
    NegatedLight,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecularModel {
    pub reflect: ReflectConvention,
    /// Multiply by the packed spec intensity channel.
    pub scale_by_intensity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    pub specular: Option<SpecularModel>,
    pub attenuation: bool,
    pub quantization: bool,
}

impl Capabilities {
    pub const DIRECTIONAL_SIMPLE: Capabilities = Capabilities {
        specular: None,
        attenuation: false,
        quantization: false,
    };

    pub const DIRECTIONAL_SPECULAR: Capabilities = Capabilities {
        specular: Some(SpecularModel {
            reflect: ReflectConvention::NegatedLight,
            scale_by_intensity: false,
        }),
        attenuation: false,
        quantization: false,
    };

    pub const UNIFIED: Capabilities = Capabilities {
        specular: Some(SpecularModel {
            reflect: ReflectConvention::Light,
            scale_by_intensity: true,
        }),
        attenuation: true,
        quantization: true,
    };

    pub fn has_specular(&self) -> bool {
        self.specular.is_some()
    }
}

/// Light as seen from one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incident {
    /// Unit vector from the fragment towards the light.
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Distance to the light, for lights that have a position.
    pub distance: Option<f32>,
}

/// Anything a lighting pass can be fed with.
pub trait IncidentLight {
    fn incident(&self, frag_pos: Vec3) -> Incident;
}

impl IncidentLight for DirectionalLight {
    fn incident(&self, frag_pos: Vec3) -> Incident {
        Incident {
            direction: (self.position - frag_pos).normalize(),
            color: self.color,
            intensity: self.intensity,
            distance: None,
        }
    }
}

impl IncidentLight for LightSource {
    fn incident(&self, frag_pos: Vec3) -> Incident {
        match self {
            LightSource::Directional { direction, color } => Incident {
                direction: (-*direction).normalize(),
                color: *color,
                intensity: 1.0,
                distance: None,
            },
            LightSource::Point { position, color } => Incident {
                direction: (*position - frag_pos).normalize(),
                color: *color,
                intensity: 1.0,
                distance: Some(position.distance(frag_pos)),
            },
        }
    }
}

/// Output of one lighting pass for one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightContribution {
    /// Color handed to the additive blend, alpha 1.
    pub color: Vec4,
    /// Diffuse factor after clamping and attenuation.
    pub diffuse: f32,
    pub specular: f32,
    /// Cell-shaded diffuse band. Computed when quantization is enabled, never
    /// blended into `color`.
    pub band: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingPass {
    capabilities: Capabilities,
    attenuation: Attenuation,
}

impl LightingPass {
    pub fn new(capabilities: Capabilities, attenuation: Attenuation) -> Self {
        Self {
            capabilities,
            attenuation,
        }
    }

    /// Lambertian diffuse from one light.
    pub fn directional_simple() -> Self {
        Self::new(Capabilities::DIRECTIONAL_SIMPLE, Attenuation::DEFAULT)
    }

    /// Diffuse plus a specular term reflecting the negated light direction.
    pub fn directional_specular() -> Self {
        Self::new(Capabilities::DIRECTIONAL_SPECULAR, Attenuation::DEFAULT)
    }

    /// Directional or point light with distance falloff and the cell band.
    pub fn unified() -> Self {
        Self::new(Capabilities::UNIFIED, Attenuation::DEFAULT)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn attenuation(&self) -> Attenuation {
        self.attenuation
    }

    /// Per-pixel body of the pass.
    pub fn shade(
        &self,
        texel: &GBufferTexel,
        light: &impl IncidentLight,
        camera_position: Vec3,
    ) -> LightContribution {
        let incident = light.incident(texel.position);
        let normal = texel.normal.normalize();
        let light_dir = incident.direction;

        let attenuation = match incident.distance {
            Some(distance) if self.capabilities.attenuation => self.attenuation.at(distance),
            _ => 1.0,
        };

        let diffuse = normal.dot(light_dir).max(0.0) * incident.intensity * attenuation;
        let band = self
            .capabilities
            .quantization
            .then(|| quantize_diffuse(diffuse, CELL_LEVELS));

        let specular = match self.capabilities.specular {
            Some(model) => {
                let view_dir = (-(camera_position - texel.position)).normalize();
                let reflect_dir = match model.reflect {
                    ReflectConvention::NegatedLight => reflect(-light_dir, normal),
                    ReflectConvention::Light => reflect(light_dir, normal),
                };
                let mut specular = view_dir.dot(reflect_dir).max(0.0).powf(texel.shininess());
                if model.scale_by_intensity {
                    specular *= texel.spec_intensity();
                }
                specular * attenuation
            }
            None => 0.0,
        };

        let color = (diffuse * incident.color + specular * incident.color) * texel.color;
        LightContribution {
            color: color.extend(1.0),
            diffuse,
            specular,
            band,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn white_light_at(position: Vec3) -> DirectionalLight {
        DirectionalLight {
            color: Vec3::ONE,
            intensity: 1.0,
            position,
        }
    }

    fn texel(normal: Vec3) -> GBufferTexel {
        GBufferTexel {
            color: Vec3::new(0.9, 0.4, 0.2),
            normal,
            position: Vec3::ZERO,
            specular: Vec2::new(0.5, 16.0),
        }
    }

    #[test]
    fn light_facing_normal_returns_base_color() {
        let pass = LightingPass::directional_simple();
        let surface = texel(Vec3::Z);
        let lit = pass.shade(&surface, &white_light_at(Vec3::new(0.0, 0.0, 5.0)), Vec3::ONE);
        assert_eq!(lit.diffuse, 1.0);
        assert_eq!(lit.color, surface.color.extend(1.0));
    }

    #[test]
    fn surface_facing_away_is_black() {
        let pass = LightingPass::directional_simple();
        let lit = pass.shade(
            &texel(Vec3::NEG_Z),
            &white_light_at(Vec3::new(0.0, 0.0, 5.0)),
            Vec3::ONE,
        );
        assert_eq!(lit.diffuse, 0.0);
        assert_eq!(lit.color, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn diffuse_is_never_negative() {
        let passes = [
            LightingPass::directional_simple(),
            LightingPass::directional_specular(),
            LightingPass::unified(),
        ];
        let normals = [Vec3::X, Vec3::NEG_Y, Vec3::new(-1.0, -1.0, 0.0), Vec3::Z];
        for pass in passes {
            for normal in normals {
                // light sits on the side the normal points away from
                let light = white_light_at(-normal * 4.0);
                let lit = pass.shade(&texel(normal), &light, Vec3::new(0.0, 3.0, 3.0));
                assert_eq!(lit.diffuse, 0.0);
            }
        }
    }

    #[test]
    fn unnormalized_normal_is_renormalized() {
        let pass = LightingPass::directional_simple();
        let light = white_light_at(Vec3::new(0.0, 0.0, 5.0));
        let unit = pass.shade(&texel(Vec3::Z), &light, Vec3::ONE);
        let scaled = pass.shade(&texel(Vec3::Z * 4.0), &light, Vec3::ONE);
        assert_eq!(unit.color, scaled.color);
    }

    #[test]
    fn intensity_scales_diffuse() {
        let pass = LightingPass::directional_simple();
        let light = DirectionalLight {
            intensity: 0.25,
            ..white_light_at(Vec3::new(0.0, 0.0, 5.0))
        };
        let lit = pass.shade(&texel(Vec3::Z), &light, Vec3::ONE);
        assert_eq!(lit.diffuse, 0.25);
    }

    #[test]
    fn simple_pass_has_no_specular_or_band() {
        let pass = LightingPass::directional_simple();
        let lit = pass.shade(
            &texel(Vec3::Z),
            &white_light_at(Vec3::new(0.0, 1.0, 5.0)),
            Vec3::new(0.0, 0.0, -5.0),
        );
        assert_eq!(lit.specular, 0.0);
        assert_eq!(lit.band, None);
    }

    #[test]
    fn specular_pass_uses_view_and_negated_light_reflection() {
        // light and camera on the same side: reflect(-L, n) points back up, and
        // view_dir = normalize(frag - camera) points down, so no highlight
        let pass = LightingPass::directional_specular();
        let light = white_light_at(Vec3::new(0.0, 0.0, 5.0));
        let lit = pass.shade(&texel(Vec3::Z), &light, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(lit.specular, 0.0);

        // camera behind the surface lines view_dir up with the reflection
        let behind = pass.shade(&texel(Vec3::Z), &light, Vec3::new(0.0, 0.0, -5.0));
        assert!((behind.specular - 1.0).abs() < 1e-6);
        let expected = (1.0 + behind.specular) * texel(Vec3::Z).color;
        assert!((behind.color.truncate() - expected).length() < 1e-6);
    }

    #[test]
    fn specular_pass_ignores_spec_intensity_channel() {
        let pass = LightingPass::directional_specular();
        let light = white_light_at(Vec3::new(0.0, 0.0, 5.0));
        let mut low = texel(Vec3::Z);
        low.specular.x = 0.0;
        let mut high = texel(Vec3::Z);
        high.specular.x = 1.0;
        let camera = Vec3::new(0.0, 0.5, -5.0);
        assert_eq!(
            pass.shade(&low, &light, camera).color,
            pass.shade(&high, &light, camera).color
        );
    }

    #[test]
    fn zero_shininess_saturates_specular() {
        let pass = LightingPass::directional_specular();
        let light = white_light_at(Vec3::new(0.0, 0.0, 5.0));
        let mut surface = texel(Vec3::Z);
        surface.specular.y = 0.0;
        // aligned and opposed views both give pow(x, 0) == 1
        for camera in [Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 5.0), Vec3::X * 9.0] {
            let lit = pass.shade(&surface, &light, camera);
            assert_eq!(lit.specular, 1.0);
        }
    }

    #[test]
    fn unified_point_light_attenuates_with_distance() {
        let pass = LightingPass::unified();
        let light = LightSource::Point {
            position: Vec3::new(0.0, 0.0, 10.0),
            color: Vec3::ONE,
        };
        let lit = pass.shade(&texel(Vec3::Z), &light, Vec3::new(0.0, 0.0, 20.0));
        assert!((lit.diffuse - 1.0 / 188.0).abs() < 1e-7);
    }

    #[test]
    fn unified_directional_uses_the_given_direction() {
        let pass = LightingPass::unified();
        let light = LightSource::Directional {
            direction: Vec3::new(0.0, 0.0, -3.0),
            color: Vec3::ONE,
        };
        let mut surface = texel(Vec3::Z);
        surface.position = Vec3::new(50.0, -20.0, 7.0);
        let lit = pass.shade(&surface, &light, Vec3::new(0.0, 0.0, 100.0));
        assert_eq!(lit.diffuse, 1.0);
    }

    #[test]
    fn unified_reflects_the_light_direction_unnegated() {
        let pass = LightingPass::unified();
        let light = LightSource::Directional {
            direction: Vec3::new(1.0, 0.0, -1.0),
            color: Vec3::ONE,
        };
        let surface = texel(Vec3::Z);
        let light_dir = Vec3::new(-1.0, 0.0, 1.0).normalize();
        let reflect_dir = reflect(light_dir, Vec3::Z);
        // put the camera so that view_dir == reflect_dir
        let camera = surface.position - reflect_dir * 4.0;
        let lit = pass.shade(&surface, &light, camera);
        let expected = surface.spec_intensity();
        assert!((lit.specular - expected).abs() < 1e-5);

        // the directional+specular convention misses this highlight entirely
        let other = LightingPass::directional_specular().shade(
            &surface,
            &DirectionalLight {
                color: Vec3::ONE,
                intensity: 1.0,
                position: light_dir * 4.0,
            },
            camera,
        );
        assert_eq!(other.specular, 0.0);
    }

    #[test]
    fn unified_band_is_computed_but_not_blended() {
        let pass = LightingPass::unified();
        let light = LightSource::Directional {
            direction: Vec3::new(0.0, -1.0, -1.0),
            color: Vec3::ONE,
        };
        let mut surface = texel(Vec3::Z);
        surface.specular = Vec2::new(0.0, 16.0);
        let lit = pass.shade(&surface, &light, Vec3::new(0.0, 0.0, 5.0));
        let raw = std::f32::consts::FRAC_1_SQRT_2;
        assert!((lit.diffuse - raw).abs() < 1e-6);
        assert_eq!(lit.band, Some(quantize_diffuse(lit.diffuse, CELL_LEVELS)));
        assert_eq!(lit.band, Some(12.0 / 16.0));
        let expected = lit.diffuse * surface.color;
        assert!((lit.color.truncate() - expected).length() < 1e-6);
        assert_eq!(lit.color.w, 1.0);
    }

    #[test]
    fn unified_specular_is_attenuated() {
        let pass = LightingPass::unified();
        let position = Vec3::new(0.0, 0.0, 2.0);
        let light = LightSource::Point {
            position,
            color: Vec3::ONE,
        };
        let mut surface = texel(Vec3::Z);
        surface.specular = Vec2::new(1.0, 0.0);
        let lit = pass.shade(&surface, &light, Vec3::new(0.0, 0.0, 9.0));
        let attenuation = Attenuation::DEFAULT.at(2.0);
        assert!((lit.specular - attenuation).abs() < 1e-7);
    }
}
