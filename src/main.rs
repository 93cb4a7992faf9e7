use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::{Vec3, Vec4};
use log::{error, info};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use deferred_lighting::vertex::unit_cube;
use deferred_lighting::{
    load_obj_file, GBufferLayout, GBufferTexel, HostBindings, LightingFrame, LightingPassKind,
    ModelHandle, ObjOptions, PipelinePlan, Renderer, RendererConfig, Scene, Vertex,
    ViewProjection,
};

const CAMERA_STEP: f32 = 0.5;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read scene {}", options.path.display()))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;

    let config = RendererConfig {
        directional_pass: options
            .light_pass
            .or(scene.lighting_pass)
            .unwrap_or(RendererConfig::default().directional_pass),
        ..RendererConfig::default()
    };
    let plan = PipelinePlan::assemble(
        &config,
        &GBufferLayout::standard(),
        &Vertex::ATTRIBUTES,
        &HostBindings::all(),
    )
    .context("deferred pipeline failed validation")?;

    println!(
        "Loaded scene with {} objects ({} lights)",
        scene.objects.len(),
        scene.light_count()
    );
    println!(
        "Lighting: directional lights via {}, point lights via {}",
        plan.directional_kind(),
        LightingPassKind::Unified
    );
    for object in &scene.objects {
        println!(
            " - {} ({})",
            object.name,
            object.mesh.as_deref().unwrap_or("cube")
        );
    }

    if options.summary_only {
        print_probes(&scene, &plan, &config);
        return Ok(());
    }

    let base_dir = options
        .path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    match run_interactive(&scene, &base_dir, config, plan.clone()) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
            );
            print_probes(&scene, &plan, &config);
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Shades a point at each object's origin, facing the camera, with every
/// light of the scene.
fn print_probes(scene: &Scene, plan: &PipelinePlan, config: &RendererConfig) {
    let frame = LightingFrame {
        ambient: scene.ambient,
        directional: &scene.directional,
        sources: &scene.points,
        camera_position: scene.camera.position,
    };
    println!("Probes:");
    for object in &scene.objects {
        let texel = GBufferTexel {
            color: object.material.color,
            normal: (scene.camera.position - object.position).normalize_or_zero(),
            position: object.position,
            specular: object.material.packed_specular(),
        };
        let lit = frame.shade(plan, &texel, config.clear_color);
        println!(" - {} lit={}", object.name, format_color(lit));
    }
}

fn format_color(color: Vec4) -> String {
    format!(
        "({:.3}, {:.3}, {:.3}, {:.3})",
        color.x, color.y, color.z, color.w
    )
}

fn run_interactive(
    scene: &Scene,
    base_dir: &Path,
    config: RendererConfig,
    plan: PipelinePlan,
) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| WindowInitError::new("event loop", err))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Deferred Lighting")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::new("window", err))?,
    );

    let mut renderer = block_on(Renderer::new(Arc::clone(&window), config, plan))?;
    let models = load_models(&mut renderer, scene, base_dir);
    let camera = scene.camera.view_projection(renderer.aspect());

    let mut app = AppState {
        renderer,
        scene,
        models,
        camera,
        last_error: None,
    };

    event_loop.run(|event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        match app.process_event(event) {
            Ok(true) => {}
            Ok(false) => elwt.exit(),
            Err(err) => {
                app.last_error = Some(err);
                elwt.exit();
            }
        }
    })?;

    match app.last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn load_models(renderer: &mut Renderer, scene: &Scene, base_dir: &Path) -> Vec<ModelHandle> {
    let cube = unit_cube(Vec3::ONE);
    let mut cube_handle = None;
    let mut handles = Vec::with_capacity(scene.objects.len());
    for object in &scene.objects {
        let loaded = object.mesh.as_deref().and_then(|mesh| {
            match load_obj_file(&base_dir.join(mesh), ObjOptions::default()) {
                Ok(vertices) => Some(renderer.load_model(mesh, &vertices)),
                Err(err) => {
                    error!("failed to load mesh {mesh}: {err:?}");
                    None
                }
            }
        });
        let handle = match loaded {
            Some(handle) => handle,
            None => *cube_handle.get_or_insert_with(|| renderer.load_model("cube", &cube)),
        };
        handles.push(handle);
    }
    info!("uploaded {} models", handles.len());
    handles
}

struct AppState<'a> {
    renderer: Renderer,
    scene: &'a Scene,
    models: Vec<ModelHandle>,
    camera: ViewProjection,
    last_error: Option<anyhow::Error>,
}

impl AppState<'_> {
    /// Returns `false` once the window asks to close.
    fn process_event(&mut self, event: Event<()>) -> Result<bool> {
        match event {
            Event::WindowEvent { event, window_id } if window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => return Ok(false),
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(size);
                        self.camera.set_aspect(self.renderer.aspect());
                    }
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(code),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    } => {
                        if code == KeyCode::Escape {
                            return Ok(false);
                        }
                        if let Some(delta) = camera_delta(code) {
                            self.camera.move_camera(delta);
                        }
                    }
                    WindowEvent::RedrawRequested => self.draw_frame()?,
                    _ => {}
                }
            }
            Event::AboutToWait => self.renderer.window().request_redraw(),
            _ => {}
        }
        Ok(true)
    }

    fn draw_frame(&mut self) -> Result<()> {
        self.renderer.begin(&self.camera).map_err(|err| match err {
            wgpu::SurfaceError::OutOfMemory => anyhow!("GPU is out of memory"),
            other => anyhow!("failed to acquire the next frame: {other}"),
        })?;
        for (object, model) in self.scene.objects.iter().zip(&self.models) {
            self.renderer
                .draw_model(*model, object.model_matrix(), &object.material);
        }
        self.renderer.ambient(&self.scene.ambient);
        for light in &self.scene.directional {
            self.renderer.add_light(*light);
        }
        for light in &self.scene.points {
            self.renderer.add_light(*light);
        }
        self.renderer.end();
        Ok(())
    }
}

fn camera_delta(code: KeyCode) -> Option<Vec3> {
    let direction = match code {
        KeyCode::ArrowLeft => Vec3::NEG_X,
        KeyCode::ArrowRight => Vec3::X,
        KeyCode::ArrowUp => Vec3::NEG_Z,
        KeyCode::ArrowDown => Vec3::Z,
        KeyCode::PageUp => Vec3::Y,
        KeyCode::PageDown => Vec3::NEG_Y,
        _ => return None,
    };
    Some(direction * CAMERA_STEP)
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn new(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

struct CliOptions {
    path: PathBuf,
    summary_only: bool,
    light_pass: Option<LightingPassKind>,
}

const USAGE: &str =
    "Usage: deferred-lighting <scene.xml> [--summary-only] [--light-pass simple|specular|unified]";

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut summary_only = false;
        let mut light_pass = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--light-pass" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--light-pass needs a value. {USAGE}"))?;
                    light_pass = Some(value.parse()?);
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(Self {
            path: PathBuf::from(path),
            summary_only,
            light_pass,
        })
    }
}
