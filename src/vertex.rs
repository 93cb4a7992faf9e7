use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::ContractError;

/// Per-vertex input of the geometry pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    pub fn new(position: Vec3, normal: Vec3, color: Vec3) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            color: color.into(),
        }
    }

    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Checks a producer's attribute list against the order the geometry stage reads.
pub fn validate_vertex_layout(attributes: &[wgpu::VertexAttribute]) -> Result<(), ContractError> {
    for expected in Vertex::ATTRIBUTES.iter() {
        let found = attributes
            .iter()
            .find(|attribute| attribute.shader_location == expected.shader_location);
        match found {
            Some(found) if found.format == expected.format && found.offset == expected.offset => {}
            Some(found) => {
                return Err(ContractError::VertexLayoutMismatch {
                    location: expected.shader_location,
                    expected: format!("{:?}@{}", expected.format, expected.offset),
                    found: format!("{:?}@{}", found.format, found.offset),
                })
            }
            None => {
                return Err(ContractError::VertexLayoutMismatch {
                    location: expected.shader_location,
                    expected: format!("{:?}@{}", expected.format, expected.offset),
                    found: "nothing".to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Clip-space corner of the triangle that covers the whole viewport.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ScreenVertex {
    pub position: [f32; 2],
}

impl ScreenVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn cover_viewport() -> [ScreenVertex; 3] {
        [
            ScreenVertex {
                position: [-1.0, -1.0],
            },
            ScreenVertex {
                position: [3.0, -1.0],
            },
            ScreenVertex {
                position: [-1.0, 3.0],
            },
        ]
    }

    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ScreenVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Axis aligned cube of edge length 1, two triangles per face, outward normals.
pub fn unit_cube(color: Vec3) -> Vec<Vertex> {
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let mut vertices = Vec::with_capacity(36);
    for (normal, right, up) in faces {
        let center = normal * 0.5;
        let corners = [
            center - right * 0.5 - up * 0.5,
            center + right * 0.5 - up * 0.5,
            center + right * 0.5 + up * 0.5,
            center - right * 0.5 + up * 0.5,
        ];
        for index in [0, 1, 2, 0, 2, 3] {
            vertices.push(Vertex::new(corners[index], normal, color));
        }
    }
    vertices
}
