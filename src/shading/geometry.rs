use glam::{Vec3, Vec4};

use crate::gbuffer::GBufferTexel;
use crate::material::Material;
use crate::transform::TransformBlock;
use crate::vertex::Vertex;

/// Result of the geometry stage for one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryOutput {
    pub clip_position: Vec4,
    pub texel: GBufferTexel,
}

/// Per-vertex body of the geometry pass.
///
/// The normal goes through the linear part of the model transform only and is
/// left unnormalized; lighting passes renormalize it.
pub fn shade_vertex(
    vertex: &Vertex,
    transforms: &TransformBlock,
    material: &Material,
) -> GeometryOutput {
    let world_position = transforms.model() * Vec3::from(vertex.position).extend(1.0);
    let clip_position = transforms.view_projection() * world_position;
    let normal = transforms.normal_transform() * Vec3::from(vertex.normal);

    GeometryOutput {
        clip_position,
        texel: GBufferTexel {
            color: Vec3::from(vertex.color) * material.color,
            normal,
            position: world_position.truncate(),
            specular: material.packed_specular(),
        },
    }
}
