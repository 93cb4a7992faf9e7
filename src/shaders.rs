//! WGSL for every pass, assembled from the pass configuration.
//!
//! The bodies mirror [`crate::shading`]. G-buffer attachment locations and
//! texture bindings are taken from [`GBufferChannel::index`] so producer and
//! consumers cannot drift apart.

use std::fmt::Write as _;

use crate::config::TransformVariant;
use crate::gbuffer::GBufferChannel;
use crate::lights::Attenuation;
use crate::shading::lighting::{Capabilities, ReflectConvention};
use crate::shading::CELL_LEVELS;

/// Which uniform block feeds a lighting shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightInput {
    /// `DirectionalLight` block: direction derived from a position, with intensity.
    DirectionalLight,
    /// Unified block carrying a direction.
    Directional,
    /// Unified block carrying a position.
    Point,
}

const SCREEN_VERTEX: &str = r#"
struct ScreenInput {
    @location(0) position: vec2<f32>,
}

@vertex
fn vs_main(input: ScreenInput) -> @builtin(position) vec4<f32> {
    return vec4<f32>(input.position, 0.0, 1.0);
}
"#;

const GEOMETRY_COMMON: &str = r#"
struct Material {
    color: vec4<f32>,
    specular: vec4<f32>,
}

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) frag_pos: vec3<f32>,
}
"#;

const GEOMETRY_COMBINED: &str = r#"
struct ModelViewProjection {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> transforms: ModelViewProjection;

@group(0) @binding(1)
var<uniform> material: Material;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = transforms.model * vec4<f32>(input.position, 1.0);
    let view_projection = transforms.projection * transforms.view;
    out.clip_position = view_projection * world_position;
    let linear_part = mat3x3<f32>(
        transforms.model[0].xyz,
        transforms.model[1].xyz,
        transforms.model[2].xyz
    );
    out.normal = linear_part * input.normal;
    out.frag_pos = world_position.xyz;
    out.color = input.color;
    return out;
}
"#;

const GEOMETRY_SPLIT: &str = r#"
struct FrameTransforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}

struct ObjectTransforms {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
}

@group(0) @binding(0)
var<uniform> frame: FrameTransforms;

@group(1) @binding(0)
var<uniform> object: ObjectTransforms;

@group(1) @binding(1)
var<uniform> material: Material;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    let view_projection = frame.projection * frame.view;
    out.clip_position = view_projection * world_position;
    let normal_transform = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    );
    out.normal = normal_transform * input.normal;
    out.frag_pos = world_position.xyz;
    out.color = input.color;
    return out;
}
"#;

/// Geometry pass: clip position plus the four G-buffer channels.
pub fn geometry_shader(variant: TransformVariant) -> String {
    let mut source = String::from(GEOMETRY_COMMON);
    source.push_str(match variant {
        TransformVariant::Combined => GEOMETRY_COMBINED,
        TransformVariant::Split => GEOMETRY_SPLIT,
    });

    source.push_str("\nstruct GBufferOutput {\n");
    for channel in GBufferChannel::ALL {
        let _ = writeln!(
            source,
            "    @location({}) {}: vec4<f32>,",
            channel.index(),
            channel_field(channel)
        );
    }
    source.push_str("}\n");

    source.push_str(
        r#"
@fragment
fn fs_main(input: VertexOutput) -> GBufferOutput {
    var out: GBufferOutput;
    out.color = vec4<f32>(input.color * material.color.rgb, 1.0);
    out.normal = vec4<f32>(input.normal, 0.0);
    out.position = vec4<f32>(input.frag_pos, 1.0);
    out.specular = vec4<f32>(material.specular.x, material.specular.y, 0.0, 0.0);
    return out;
}
"#,
    );
    source
}

/// Ambient pass: reads only the color channel.
pub fn ambient_shader() -> String {
    let mut source = String::from(SCREEN_VERTEX);
    push_gbuffer_bindings(&mut source, &[GBufferChannel::Color]);
    source.push_str(
        r#"
struct AmbientLight {
    color: vec3<f32>,
    intensity: f32,
}

@group(1) @binding(0)
var<uniform> ambient: AmbientLight;

@fragment
fn fs_main(@builtin(position) frag_coord: vec4<f32>) -> @location(0) vec4<f32> {
    let texel = vec2<i32>(floor(frag_coord.xy));
    let surface_color = textureLoad(gbuffer_color, texel, 0).rgb;
    return vec4<f32>(surface_color * ambient.color * ambient.intensity, 1.0);
}
"#,
    );
    source
}

/// G-buffer channels a lighting shader with these capabilities samples.
pub fn lighting_reads(capabilities: Capabilities) -> Vec<GBufferChannel> {
    let mut reads = vec![
        GBufferChannel::Color,
        GBufferChannel::Normal,
        GBufferChannel::Position,
    ];
    if capabilities.has_specular() {
        reads.push(GBufferChannel::Specular);
    }
    reads
}

/// Lighting pass specialised for one capability set and one light input.
pub fn lighting_shader(
    capabilities: Capabilities,
    input: LightInput,
    attenuation: Attenuation,
) -> String {
    let mut source = String::from(SCREEN_VERTEX);
    push_gbuffer_bindings(&mut source, &lighting_reads(capabilities));

    match input {
        LightInput::DirectionalLight => source.push_str(
            r#"
struct DirectionalLight {
    color: vec3<f32>,
    intensity: f32,
    position: vec3<f32>,
    padding: f32,
}

@group(1) @binding(0)
var<uniform> light: DirectionalLight;
"#,
        ),
        LightInput::Directional | LightInput::Point => source.push_str(
            r#"
struct LightSource {
    vector: vec4<f32>,
    color: vec4<f32>,
}

@group(1) @binding(0)
var<uniform> light: LightSource;
"#,
        ),
    }

    if capabilities.has_specular() {
        source.push_str(
            r#"
struct Camera {
    position: vec4<f32>,
}

@group(1) @binding(1)
var<uniform> camera: Camera;
"#,
        );
    }

    let point_falloff = capabilities.attenuation && input == LightInput::Point;
    if point_falloff {
        let _ = write!(
            source,
            "\nconst K_CONSTANT: f32 = {:?};\nconst K_LINEAR: f32 = {:?};\nconst K_QUADRATIC: f32 = {:?};\n",
            attenuation.constant, attenuation.linear, attenuation.quadratic
        );
    }

    source.push_str(
        r#"
@fragment
fn fs_main(@builtin(position) frag_coord: vec4<f32>) -> @location(0) vec4<f32> {
    let texel = vec2<i32>(floor(frag_coord.xy));
    let surface_color = textureLoad(gbuffer_color, texel, 0).rgb;
    let normal = normalize(textureLoad(gbuffer_normal, texel, 0).xyz);
    let frag_pos = textureLoad(gbuffer_position, texel, 0).xyz;
"#,
    );

    match input {
        LightInput::DirectionalLight => source.push_str(
            r#"    let light_dir = normalize(light.position - frag_pos);
    let light_color = light.color;
    let intensity = light.intensity;
"#,
        ),
        LightInput::Directional => source.push_str(
            r#"    let light_dir = normalize(-light.vector.xyz);
    let light_color = light.color.rgb;
    let intensity = 1.0;
"#,
        ),
        LightInput::Point => source.push_str(
            r#"    let light_dir = normalize(light.vector.xyz - frag_pos);
    let light_color = light.color.rgb;
    let intensity = 1.0;
"#,
        ),
    }

    if point_falloff {
        source.push_str(
            r#"    let light_distance = distance(light.vector.xyz, frag_pos);
    let attenuation = 1.0 / (K_CONSTANT + K_LINEAR * light_distance + K_QUADRATIC * light_distance * light_distance);
"#,
        );
    } else {
        source.push_str("    let attenuation = 1.0;\n");
    }

    source.push_str("    let diffuse = max(dot(normal, light_dir), 0.0) * intensity * attenuation;\n");

    if capabilities.quantization {
        let _ = writeln!(
            source,
            "    // cell band, not blended into the output\n    let band = ceil(diffuse * {levels:?}) / {levels:?};",
            levels = CELL_LEVELS
        );
    }

    match capabilities.specular {
        Some(model) => {
            let reflect_expr = match model.reflect {
                ReflectConvention::NegatedLight => "reflect(-light_dir, normal)",
                ReflectConvention::Light => "reflect(light_dir, normal)",
            };
            let _ = writeln!(
                source,
                r#"    let packed_specular = textureLoad(gbuffer_specular, texel, 0).xy;
    let view_dir = normalize(-(camera.position.xyz - frag_pos));
    let reflect_dir = {reflect_expr};
    let highlight = max(dot(view_dir, reflect_dir), 0.0);
    // pow(x, 0) is 1 for every x, including 0
    var specular = select(pow(highlight, packed_specular.y), 1.0, packed_specular.y == 0.0);"#
            );
            if model.scale_by_intensity {
                source.push_str("    specular = specular * packed_specular.x;\n");
            }
            source.push_str("    specular = specular * attenuation;\n");
        }
        None => source.push_str("    let specular = 0.0;\n"),
    }

    source.push_str(
        r#"    let color = (diffuse * light_color + specular * light_color) * surface_color;
    return vec4<f32>(color, 1.0);
}
"#,
    );
    source
}

fn channel_field(channel: GBufferChannel) -> &'static str {
    match channel {
        GBufferChannel::Color => "color",
        GBufferChannel::Normal => "normal",
        GBufferChannel::Position => "position",
        GBufferChannel::Specular => "specular",
    }
}

fn push_gbuffer_bindings(source: &mut String, reads: &[GBufferChannel]) {
    source.push('\n');
    for channel in reads {
        let _ = writeln!(
            source,
            "@group(0) @binding({})\nvar gbuffer_{}: texture_2d<f32>;",
            channel.index(),
            channel_field(*channel)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|err| panic!("{}\n{source}", err.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap_or_else(|err| panic!("{err:?}\n{source}"));
    }

    #[test]
    fn geometry_shaders_validate() {
        validate(&geometry_shader(TransformVariant::Combined));
        validate(&geometry_shader(TransformVariant::Split));
    }

    #[test]
    fn geometry_output_locations_follow_channel_indices() {
        let source = geometry_shader(TransformVariant::Split);
        assert!(source.contains("@location(0) color: vec4<f32>"));
        assert!(source.contains("@location(1) normal: vec4<f32>"));
        assert!(source.contains("@location(2) position: vec4<f32>"));
        assert!(source.contains("@location(3) specular: vec4<f32>"));
    }

    fn vertex_input_locations(source: &str) -> Vec<u32> {
        let module = naga::front::wgsl::parse_str(source).expect("geometry shader parses");
        let entry = module
            .entry_points
            .iter()
            .find(|entry| entry.name == "vs_main")
            .expect("vs_main entry point");
        let mut locations = Vec::new();
        for argument in &entry.function.arguments {
            match &module.types[argument.ty].inner {
                naga::TypeInner::Struct { members, .. } => {
                    for member in members {
                        if let Some(naga::Binding::Location { location, .. }) = member.binding {
                            locations.push(location);
                        }
                    }
                }
                _ => {
                    if let Some(naga::Binding::Location { location, .. }) = argument.binding {
                        locations.push(location);
                    }
                }
            }
        }
        locations.sort_unstable();
        locations
    }

    #[test]
    fn vertex_contract_covers_every_geometry_input() {
        let mut required: Vec<u32> = crate::vertex::Vertex::ATTRIBUTES
            .iter()
            .map(|attribute| attribute.shader_location)
            .collect();
        required.sort_unstable();
        for variant in [TransformVariant::Combined, TransformVariant::Split] {
            let read = vertex_input_locations(&geometry_shader(variant));
            assert_eq!(read, required, "{variant:?}");
            for location in read {
                let missing: Vec<_> = crate::vertex::Vertex::ATTRIBUTES
                    .iter()
                    .copied()
                    .filter(|attribute| attribute.shader_location != location)
                    .collect();
                assert!(
                    crate::vertex::validate_vertex_layout(&missing).is_err(),
                    "layout without location {location} must be rejected"
                );
            }
        }
    }

    #[test]
    fn ambient_shader_validates() {
        let source = ambient_shader();
        validate(&source);
        assert!(!source.contains("gbuffer_normal"));
    }

    #[test]
    fn every_lighting_variant_validates() {
        let variants = [
            (Capabilities::DIRECTIONAL_SIMPLE, LightInput::DirectionalLight),
            (Capabilities::DIRECTIONAL_SPECULAR, LightInput::DirectionalLight),
            (Capabilities::UNIFIED, LightInput::Directional),
            (Capabilities::UNIFIED, LightInput::Point),
        ];
        for (capabilities, input) in variants {
            validate(&lighting_shader(capabilities, input, Attenuation::DEFAULT));
        }
    }

    #[test]
    fn simple_pass_skips_specular_channel_and_camera() {
        let source = lighting_shader(
            Capabilities::DIRECTIONAL_SIMPLE,
            LightInput::DirectionalLight,
            Attenuation::DEFAULT,
        );
        assert!(!source.contains("gbuffer_specular"));
        assert!(!source.contains("camera"));
    }

    #[test]
    fn reflect_conventions_stay_distinct() {
        let specular = lighting_shader(
            Capabilities::DIRECTIONAL_SPECULAR,
            LightInput::DirectionalLight,
            Attenuation::DEFAULT,
        );
        assert!(specular.contains("reflect(-light_dir, normal)"));
        let unified = lighting_shader(Capabilities::UNIFIED, LightInput::Point, Attenuation::DEFAULT);
        assert!(unified.contains("reflect(light_dir, normal)"));
        assert!(!unified.contains("reflect(-light_dir"));
    }

    #[test]
    fn point_shader_bakes_attenuation_constants() {
        let source = lighting_shader(Capabilities::UNIFIED, LightInput::Point, Attenuation::DEFAULT);
        assert!(source.contains("const K_CONSTANT: f32 = 1.0;"));
        assert!(source.contains("const K_LINEAR: f32 = 0.7;"));
        assert!(source.contains("const K_QUADRATIC: f32 = 1.8;"));

        let directional =
            lighting_shader(Capabilities::UNIFIED, LightInput::Directional, Attenuation::DEFAULT);
        assert!(!directional.contains("K_CONSTANT"));
        assert!(directional.contains("let attenuation = 1.0;"));
    }

    #[test]
    fn band_is_computed_but_not_blended() {
        let source = lighting_shader(Capabilities::UNIFIED, LightInput::Point, Attenuation::DEFAULT);
        assert!(source.contains("let band = ceil(diffuse * 16.0) / 16.0;"));
        let output = source
            .lines()
            .find(|line| line.contains("let color ="))
            .unwrap();
        assert!(!output.contains("band"));
    }
}
