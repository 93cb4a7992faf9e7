//! CPU reference implementation of every pass.
//!
//! Each function here is the per-vertex or per-pixel body of one pass and is
//! mirrored line for line by the WGSL in [`crate::shaders`]. They are pure and
//! total: no state survives an invocation and no input makes them fail.

pub mod ambient;
pub mod frame;
pub mod geometry;
pub mod lighting;

use glam::Vec3;

/// Number of discrete levels of the cell-shaded diffuse band.
pub const CELL_LEVELS: f32 = 16.0;

/// Mirrors `incident` about `normal`: `incident - 2 * dot(normal, incident) * normal`.
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

/// Snaps a diffuse factor up to the next of `levels` equal steps.
///
/// `(k/levels, (k+1)/levels]` maps to `(k+1)/levels`; zero stays zero.
pub fn quantize_diffuse(raw: f32, levels: f32) -> f32 {
    (raw * levels).ceil() / levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_diffuse_stays_in_band_zero() {
        assert_eq!(quantize_diffuse(0.0, CELL_LEVELS), 0.0);
    }

    #[test]
    fn every_interval_maps_to_its_upper_edge() {
        for k in 0..16 {
            let lower = k as f32 / 16.0;
            let upper = (k + 1) as f32 / 16.0;
            let just_above = lower + 1e-4;
            let middle = (lower + upper) * 0.5;
            assert_eq!(quantize_diffuse(just_above, CELL_LEVELS), upper, "k={k}");
            assert_eq!(quantize_diffuse(middle, CELL_LEVELS), upper, "k={k}");
            assert_eq!(quantize_diffuse(upper, CELL_LEVELS), upper, "k={k}");
        }
    }

    #[test]
    fn reflect_mirrors_about_the_normal() {
        let reflected = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(reflected, Vec3::new(1.0, 1.0, 0.0));
    }
}
