use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::lights::{AmbientLight, DirectionalLight, LightSource};
use crate::material::Material;
use crate::pipeline::LightingPassKind;
use crate::transform::{model_matrix, ViewProjection};

/// Objects, lights and camera of a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub ambient: AmbientLight,
    pub directional: Vec<DirectionalLight>,
    pub points: Vec<LightSource>,
    pub camera: CameraSettings,
    /// Pass requested by `<lighting pass=".."/>`, if any.
    pub lighting_pass: Option<LightingPassKind>,
}

impl Scene {
    /// Parses a `<scene>` document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let mut scene = Scene::default();

        for node in document.descendants().filter(Node::is_element) {
            match node.tag_name().name() {
                "object" => scene.objects.push(parse_object(&node)?),
                "ambient" => {
                    scene.ambient = AmbientLight {
                        color: parse_color(optional_text(&node, "color"), scene.ambient.color)?,
                        intensity: parse_f32(
                            optional_text(&node, "intensity"),
                            scene.ambient.intensity,
                        )?,
                    };
                }
                "directional" => scene.directional.push(DirectionalLight {
                    color: parse_color(optional_text(&node, "color"), Vec3::ONE)?,
                    intensity: parse_f32(optional_text(&node, "intensity"), 1.0)?,
                    position: parse_vec3(Some(required_text(&node, "position")?), Vec3::ZERO)?,
                }),
                "point" => scene.points.push(LightSource::Point {
                    position: parse_vec3(Some(required_text(&node, "position")?), Vec3::ZERO)?,
                    color: parse_color(optional_text(&node, "color"), Vec3::ONE)?,
                }),
                "camera" => scene.camera = parse_camera(&node)?,
                "lighting" => {
                    if let Some(pass) = node.attribute("pass") {
                        scene.lighting_pass = Some(
                            pass.parse()
                                .context("invalid pass attribute on <lighting>")?,
                        );
                    }
                }
                _ => {}
            }
        }

        Ok(scene)
    }

    pub fn light_count(&self) -> usize {
        self.directional.len() + self.points.len()
    }
}

/// Drawable entry of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    /// OBJ path relative to the scene file; `None` draws the built-in cube.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub material: Material,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            mesh: None,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
            material: Material::default(),
        }
    }
}

impl SceneObject {
    pub fn model_matrix(&self) -> Mat4 {
        model_matrix(self.position, self.rotation, self.scale)
    }
}

/// Where the viewer starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        let position = Vec3::splat(30.0);
        Self {
            position,
            target: default_target(position),
            fov: 90.0,
        }
    }
}

impl CameraSettings {
    pub fn view_projection(&self, aspect: f32) -> ViewProjection {
        ViewProjection::new(self.position, self.target, self.fov, aspect)
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

/// Looks along the negative diagonal.
fn default_target(position: Vec3) -> Vec3 {
    position - Vec3::ONE.normalize()
}

fn parse_object(node: &Node<'_, '_>) -> Result<SceneObject> {
    let mut object = SceneObject {
        name: required_text(node, "name")?,
        mesh: optional_text(node, "mesh"),
        ..SceneObject::default()
    };
    let name = object.name.clone();
    let context = || format!("invalid object {name}");
    object.position =
        parse_vec3(optional_text(node, "position"), object.position).with_context(context)?;
    object.rotation =
        parse_vec3(optional_text(node, "rotation"), object.rotation).with_context(context)?;
    object.scale = parse_vec3(optional_text(node, "scale"), object.scale).with_context(context)?;
    let defaults = object.material;
    object.material = Material {
        color: parse_color(optional_text(node, "color"), defaults.color).with_context(context)?,
        shininess: parse_f32(optional_text(node, "shininess"), defaults.shininess)
            .with_context(context)?,
        spec_intensity: parse_f32(optional_text(node, "specular"), defaults.spec_intensity)
            .with_context(context)?,
    };
    Ok(object)
}

fn parse_camera(node: &Node<'_, '_>) -> Result<CameraSettings> {
    let defaults = CameraSettings::default();
    let position = parse_vec3(optional_text(node, "position"), defaults.position)?;
    let target = parse_vec3(optional_text(node, "target"), default_target(position))?;
    if target == position {
        return Err(anyhow!("camera target must differ from its position"));
    }
    let fov = parse_f32(optional_text(node, "fov"), defaults.fov)?;
    if !(fov > 0.0 && fov < 180.0) {
        return Err(anyhow!("camera fov {fov} is outside (0, 180)"));
    }
    Ok(CameraSettings {
        position,
        target,
        fov,
    })
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_triple(value: &str, what: &str) -> Result<Vec3> {
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid {what} component {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!(
            "{what} needs 3 components, found {}",
            numbers.len()
        )),
    }
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => parse_triple(&value, "vector"),
        None => Ok(default),
    }
}

/// Colors are written as 0-255 triples.
fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => Ok(parse_triple(&value, "color")? / 255.0),
        None => Ok(default),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float {value:?}: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <lighting pass="unified"/>
        <camera>
            <position>0 0 10</position>
            <target>0 0 0</target>
            <fov>60</fov>
        </camera>
        <ambient>
            <color>255 255 255</color>
            <intensity>0.2</intensity>
        </ambient>
        <directional>
            <position>0 5 0</position>
            <color>255 128 0</color>
            <intensity>2.5</intensity>
        </directional>
        <point>
            <position>1 2 3</position>
        </point>
        <object>
            <name>Crate</name>
            <mesh>models/crate.obj</mesh>
            <position>1 0 0</position>
            <color>0 255 0</color>
            <shininess>0</shininess>
            <specular>1</specular>
        </object>
        <object>
            <name>Cube</name>
        </object>
    </scene>
    "#;

    #[test]
    fn parse_scene_populates_objects_and_lights() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.light_count(), 2);
        assert_eq!(scene.lighting_pass, Some(LightingPassKind::Unified));

        let crate_object = &scene.objects[0];
        assert_eq!(crate_object.mesh.as_deref(), Some("models/crate.obj"));
        assert_eq!(crate_object.material.color, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(crate_object.material.shininess, 0.0);
        assert_eq!(crate_object.material.spec_intensity, 1.0);

        let sun = scene.directional[0];
        assert_eq!(sun.position, Vec3::new(0.0, 5.0, 0.0));
        assert!((sun.intensity - 2.5).abs() < f32::EPSILON);
        assert_eq!(sun.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));

        assert_eq!(
            scene.points[0],
            LightSource::Point {
                position: Vec3::new(1.0, 2.0, 3.0),
                color: Vec3::ONE,
            }
        );
        assert_eq!(scene.camera.fov, 60.0);
        assert_eq!(scene.ambient.intensity, 0.2);
    }

    #[test]
    fn objects_default_to_builtin_cube_and_default_material() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        let cube = &scene.objects[1];
        assert!(cube.mesh.is_none());
        assert_eq!(cube.scale, Vec3::ONE);
        assert_eq!(cube.material, Material::default());
    }

    #[test]
    fn empty_scene_uses_defaults() {
        let scene = Scene::from_xml("<scene/>").unwrap();
        assert_eq!(scene.ambient, AmbientLight::default());
        assert_eq!(scene.camera, CameraSettings::default());
        assert!(scene.lighting_pass.is_none());
        let forward = (scene.camera.target - scene.camera.position).normalize();
        assert!((forward + Vec3::ONE.normalize()).length() < 1e-6);
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><object><position>0 0 0</position></object></scene>";
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn short_vector_is_an_error() {
        let bad = "<scene><object><name>A</name><position>0 0</position></object></scene>";
        let err = Scene::from_xml(bad).unwrap_err();
        assert!(format!("{err:#}").contains("3 components"));
    }

    #[test]
    fn unknown_lighting_pass_is_an_error() {
        assert!(Scene::from_xml(r#"<scene><lighting pass="toon"/></scene>"#).is_err());
    }

    #[test]
    fn camera_target_must_differ_from_position() {
        let bad = "<scene><camera><position>1 1 1</position><target>1 1 1</target></camera></scene>";
        assert!(Scene::from_xml(bad).is_err());
    }
}
