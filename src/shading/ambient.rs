use glam::Vec4;

use crate::gbuffer::GBufferTexel;
use crate::lights::AmbientLight;

/// Per-pixel body of the ambient pass. Only the color channel is read.
pub fn shade(texel: &GBufferTexel, light: &AmbientLight) -> Vec4 {
    (texel.color * light.color * light.intensity).extend(1.0)
}
