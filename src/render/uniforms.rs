//! Byte layouts of the uniform blocks declared in [`crate::shaders`].

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec3};

use crate::lights::{AmbientLight, DirectionalLight, LightSource};
use crate::material::Material;
use crate::transform::{FrameTransforms, ObjectTransforms, TransformBlock};

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ModelViewProjectionUniform {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub specular: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct AmbientUniform {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DirectionalLightUniform {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
    pub padding: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightSourceUniform {
    pub vector: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub position: [f32; 4],
}

impl ModelViewProjectionUniform {
    /// Flattens either transform variant into the combined block.
    pub fn from_block(block: &TransformBlock) -> Self {
        match block {
            TransformBlock::Combined {
                model,
                view,
                projection,
            } => Self {
                model: model.to_cols_array_2d(),
                view: view.to_cols_array_2d(),
                projection: projection.to_cols_array_2d(),
            },
            TransformBlock::Split { frame, object } => Self {
                model: object.model_transform.to_cols_array_2d(),
                view: frame.view.to_cols_array_2d(),
                projection: frame.projection.to_cols_array_2d(),
            },
        }
    }
}

impl From<&FrameTransforms> for FrameUniform {
    fn from(frame: &FrameTransforms) -> Self {
        Self {
            view: frame.view.to_cols_array_2d(),
            projection: frame.projection.to_cols_array_2d(),
        }
    }
}

impl From<&ObjectTransforms> for ObjectUniform {
    fn from(object: &ObjectTransforms) -> Self {
        Self {
            model: object.model_transform.to_cols_array_2d(),
            normal: mat3_to_3x4(object.normal_transform),
        }
    }
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        let packed = material.packed_specular();
        Self {
            color: material.color.extend(1.0).into(),
            specular: [packed.x, packed.y, 0.0, 0.0],
        }
    }
}

impl From<&AmbientLight> for AmbientUniform {
    fn from(light: &AmbientLight) -> Self {
        Self {
            color: light.color.into(),
            intensity: light.intensity,
        }
    }
}

impl From<&DirectionalLight> for DirectionalLightUniform {
    fn from(light: &DirectionalLight) -> Self {
        Self {
            color: light.color.into(),
            intensity: light.intensity,
            position: light.position.into(),
            padding: 0.0,
        }
    }
}

impl From<&LightSource> for LightSourceUniform {
    fn from(light: &LightSource) -> Self {
        let block = light.to_block();
        Self {
            vector: block.vector.into(),
            color: block.color.extend(1.0).into(),
        }
    }
}

impl CameraUniform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: position.extend(1.0).into(),
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use std::mem::size_of;

    #[test]
    fn block_sizes_match_wgsl_layouts() {
        assert_eq!(size_of::<ModelViewProjectionUniform>(), 192);
        assert_eq!(size_of::<FrameUniform>(), 128);
        assert_eq!(size_of::<ObjectUniform>(), 112);
        assert_eq!(size_of::<MaterialUniform>(), 32);
        assert_eq!(size_of::<AmbientUniform>(), 16);
        assert_eq!(size_of::<DirectionalLightUniform>(), 32);
        assert_eq!(size_of::<LightSourceUniform>(), 32);
        assert_eq!(size_of::<CameraUniform>(), 16);
    }

    #[test]
    fn light_source_keeps_the_discriminator() {
        let point = LightSourceUniform::from(&LightSource::Point {
            position: Vec3::new(1.0, 2.0, 3.0),
            color: Vec3::ONE,
        });
        assert_eq!(point.vector, [1.0, 2.0, 3.0, 1.0]);
        let sun = LightSourceUniform::from(&LightSource::Directional {
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
        });
        assert_eq!(sun.vector[3], 0.0);
    }

    #[test]
    fn object_uniform_pads_normal_columns() {
        let model = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));
        let object = ObjectUniform::from(&ObjectTransforms::from_model(model));
        assert_eq!(object.normal[0], [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(object.normal[1], [0.0, 3.0, 0.0, 0.0]);
        assert_eq!(object.normal[2], [0.0, 0.0, 4.0, 0.0]);
    }
}
