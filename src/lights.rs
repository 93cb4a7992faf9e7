//! Light descriptions handed to the lighting passes.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// Uniform ambient term applied to every lit pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 0.1,
        }
    }
}

/// Light used by the directional passes.
///
/// `position` is where the light is considered to be; the light direction
/// at a fragment is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
}

/// Light of the unified pass, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightSource {
    /// `direction` points from the light towards the scene.
    Directional { direction: Vec3, color: Vec3 },
    Point { position: Vec3, color: Vec3 },
}

impl LightSource {
    pub fn color(&self) -> Vec3 {
        match self {
            LightSource::Directional { color, .. } | LightSource::Point { color, .. } => *color,
        }
    }

    pub fn kind(&self) -> LightKind {
        match self {
            LightSource::Directional { .. } => LightKind::Directional,
            LightSource::Point { .. } => LightKind::Point,
        }
    }

    /// Packs into the shared block layout: xyz payload, w = 0 directional / 1 point.
    pub fn to_block(&self) -> LightSourceBlock {
        let vector = match self {
            LightSource::Directional { direction, .. } => direction.extend(0.0),
            LightSource::Point { position, .. } => position.extend(1.0),
        };
        LightSourceBlock {
            vector,
            color: self.color(),
        }
    }
}

impl From<DirectionalLight> for LightSource {
    /// The unified pass has no intensity field, so it is folded into the color.
    fn from(light: DirectionalLight) -> Self {
        LightSource::Directional {
            direction: -light.position,
            color: light.color * light.intensity,
        }
    }
}

/// Any light a frame accumulates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameLight {
    Directional(DirectionalLight),
    Source(LightSource),
}

impl From<DirectionalLight> for FrameLight {
    fn from(light: DirectionalLight) -> Self {
        FrameLight::Directional(light)
    }
}

impl From<LightSource> for FrameLight {
    fn from(light: LightSource) -> Self {
        FrameLight::Source(light)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Point,
}

/// Raw form of a unified light as it travels through a uniform buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSourceBlock {
    pub vector: Vec4,
    pub color: Vec3,
}

impl TryFrom<LightSourceBlock> for LightSource {
    type Error = ContractError;

    fn try_from(block: LightSourceBlock) -> Result<Self, Self::Error> {
        let payload = block.vector.truncate();
        if block.vector.w == 0.0 {
            Ok(LightSource::Directional {
                direction: payload,
                color: block.color,
            })
        } else if block.vector.w == 1.0 {
            Ok(LightSource::Point {
                position: payload,
                color: block.color,
            })
        } else {
            Err(ContractError::UnknownLightKind(block.vector.w))
        }
    }
}

/// Distance falloff `1 / (constant + linear * d + quadratic * d²)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub const DEFAULT: Attenuation = Attenuation {
        constant: 1.0,
        linear: 0.7,
        quadratic: 1.8,
    };

    pub fn at(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::DEFAULT
    }
}
