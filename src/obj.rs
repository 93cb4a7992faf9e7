use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;

use crate::vertex::Vertex;

/// How OBJ geometry is turned into vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjOptions {
    /// Uniform vertex color.
    pub color: Vec3,
    /// Swap the second and third corner of every triangle.
    pub invert_winding: bool,
}

impl Default for ObjOptions {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            invert_winding: false,
        }
    }
}

pub fn load_obj_file(path: &Path, options: ObjOptions) -> Result<Vec<Vertex>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read OBJ file {}", path.display()))?;
    load_obj_from_str(&contents, options)
        .with_context(|| format!("failed to parse OBJ mesh {}", path.display()))
}

/// Parses an OBJ file from memory into a triangle list.
///
/// Polygons are fan-triangulated. Triangles whose corners do not all carry a
/// normal get the flat face normal.
pub fn load_obj_from_str(data: &str, options: ObjOptions) -> Result<Vec<Vertex>> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut triangles: Vec<[FaceIndex; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts, positions.len(), normals.len())
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                triangulate(&polygon, options.invert_winding, &mut triangles);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut vertices = Vec::with_capacity(triangles.len() * 3);
    for triangle in &triangles {
        let mut corners = [Vec3::ZERO; 3];
        let mut corner_normals = [None; 3];
        for (slot, index) in triangle.iter().enumerate() {
            let position = resolve_index(index.v, positions.len())
                .ok_or_else(|| anyhow!("vertex index {} out of range", index.v))?;
            corners[slot] = positions[position];
            corner_normals[slot] = resolve_index(index.vn, normals.len()).map(|i| normals[i]);
        }

        let flat = face_normal(corners);
        for (corner, normal) in corners.into_iter().zip(corner_normals) {
            vertices.push(Vertex::new(corner, normal.unwrap_or(flat), options.color));
        }
    }
    Ok(vertices)
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut component = || -> Result<f32> {
        Ok(parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()?)
    };
    let x = component()?;
    let y = component()?;
    let z = component()?;
    Ok(Vec3::new(x, y, z))
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vn: i32,
}

/// Negative indices are made absolute against the `v`/`vn` lines seen so far.
fn parse_face<'a>(
    parts: impl Iterator<Item = &'a str>,
    positions: usize,
    normals: usize,
) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let v = absolute_index(v, positions)?;
        // texture coordinates are not used
        let _ = segments.next();
        let vn = match segments.next() {
            Some(segment) if !segment.is_empty() => {
                absolute_index(segment.parse::<i32>()?, normals)?
            }
            _ => 0,
        };
        indices.push(FaceIndex { v, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn triangulate(polygon: &[FaceIndex], invert_winding: bool, out: &mut Vec<[FaceIndex; 3]>) {
    for i in 1..polygon.len().saturating_sub(1) {
        let (b, c) = if invert_winding {
            (polygon[i + 1], polygon[i])
        } else {
            (polygon[i], polygon[i + 1])
        };
        out.push([polygon[0], b, c]);
    }
}

/// Turns a relative (negative) OBJ index into its 1-based absolute form.
fn absolute_index(index: i32, declared: usize) -> Result<i32> {
    if index >= 0 {
        return Ok(index);
    }
    let back = index.unsigned_abs() as usize;
    if back > declared {
        return Err(anyhow!(
            "relative index {index} reaches before the first of {declared} declared entries"
        ));
    }
    i32::try_from(declared - back + 1).context("OBJ index does not fit in i32")
}

/// OBJ indices are 1-based; `0` marks a missing entry.
fn resolve_index(index: i32, len: usize) -> Option<usize> {
    let zero_based = usize::try_from(index).ok()?.checked_sub(1)?;
    (zero_based < len).then_some(zero_based)
}

fn face_normal([p0, p1, p2]: [Vec3; 3]) -> Vec3 {
    (p1 - p0).cross(p2 - p0).normalize_or_zero()
}
