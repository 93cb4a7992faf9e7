use std::collections::HashMap;
use std::mem::size_of;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::{bytes_of, cast_slice};
use glam::Mat4;
use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::stage::{RenderStage, StageCall, Transition};
use super::targets::{DepthBuffer, GBufferTargets};
use super::uniforms::{
    AmbientUniform, CameraUniform, DirectionalLightUniform, FrameUniform, LightSourceUniform,
    MaterialUniform, ModelViewProjectionUniform, ObjectUniform,
};
use crate::config::{RendererConfig, TransformVariant};
use crate::lights::{AmbientLight, FrameLight, LightSource};
use crate::material::Material;
use crate::pipeline::{LightingPassKind, PipelinePlan};
use crate::shaders::{self, LightInput};
use crate::transform::{FrameTransforms, TransformBlock, ViewProjection};
use crate::vertex::{ScreenVertex, Vertex};

/// Lighting passes add their output onto the frame: color sums, alpha keeps
/// the maximum.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Max,
    },
};

/// Model uploaded with [`Renderer::load_model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle(usize);

/// Deferred renderer: a geometry pass into the G-buffer followed by one
/// full-screen pass per light.
///
/// A frame is `begin`, any number of `draw_model`, `ambient`, any number of
/// `add_light`, then `end`. A call out of that order drops the frame.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    config: RendererConfig,
    plan: PipelinePlan,
    stage: RenderStage,
    frame: Option<FrameRecording>,
    gbuffer: GBufferTargets,
    depth: DepthBuffer,
    gbuffer_layout: wgpu::BindGroupLayout,
    gbuffer_bind_group: wgpu::BindGroup,
    geometry: GeometryPipeline,
    ambient_pipeline: wgpu::RenderPipeline,
    ambient_buffer: wgpu::Buffer,
    ambient_bind_group: wgpu::BindGroup,
    light_layout: wgpu::BindGroupLayout,
    lighting_pipelines: HashMap<(LightingPassKind, LightInput), wgpu::RenderPipeline>,
    camera_buffer: wgpu::Buffer,
    screen: wgpu::Buffer,
    models: Vec<MeshBuffers>,
}

struct GeometryPipeline {
    pipeline: wgpu::RenderPipeline,
    /// View and projection, bound once per frame in the split variant.
    frame: Option<(wgpu::Buffer, wgpu::BindGroup)>,
    object_layout: wgpu::BindGroupLayout,
    object_group: u32,
}

struct FrameRecording {
    output: wgpu::SurfaceTexture,
    transforms: FrameTransforms,
    draws: Vec<ModelDraw>,
    ambient: bool,
    lights: Vec<LightDraw>,
}

struct ModelDraw {
    model: ModelHandle,
    bind_group: wgpu::BindGroup,
}

struct LightDraw {
    variant: (LightingPassKind, LightInput),
    bind_group: wgpu::BindGroup,
}

impl Renderer {
    /// Initializes the GPU, the G-buffer targets and every pipeline the plan
    /// needs.
    pub async fn new(window: Arc<Window>, config: RendererConfig, plan: PipelinePlan) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        let adapter_info = adapter.get_info();
        info!(
            "using adapter {} ({:?})",
            adapter_info.name, adapter_info.backend
        );

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("deferred-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|mode| matches!(mode, wgpu::PresentMode::Mailbox))
                .unwrap_or(wgpu::PresentMode::Fifo),
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);

        let gbuffer = GBufferTargets::create(&device, plan.layout(), size.width, size.height);
        let depth = DepthBuffer::create(&device, size.width, size.height);
        let gbuffer_layout = GBufferTargets::bind_group_layout(&device, plan.layout());
        let gbuffer_bind_group = gbuffer.bind_group(&device, &gbuffer_layout);
        info!(
            "G-buffer channels: {:?}",
            gbuffer.channels().collect::<Vec<_>>()
        );

        let geometry = create_geometry_pipeline(&device, &config, &plan);

        let ambient_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ambient-bind-layout"),
            entries: &[uniform_entry(
                0,
                size_of::<AmbientUniform>(),
                wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let ambient_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ambient-uniform"),
            size: size_of::<AmbientUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let ambient_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ambient-bind-group"),
            layout: &ambient_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ambient_buffer.as_entire_binding(),
            }],
        });
        let ambient_pipeline = create_screen_pipeline(
            &device,
            "ambient-pipeline",
            &shaders::ambient_shader(),
            &[&gbuffer_layout, &ambient_layout],
            surface_format,
        );

        // both light block shapes share one size
        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("light-bind-layout"),
            entries: &[
                uniform_entry(
                    0,
                    size_of::<LightSourceUniform>().max(size_of::<DirectionalLightUniform>()),
                    wgpu::ShaderStages::FRAGMENT,
                ),
                uniform_entry(1, size_of::<CameraUniform>(), wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let attenuation = plan.unified_pass().attenuation();
        let lighting_pipelines = plan
            .lighting_variants()
            .into_iter()
            .map(|(kind, input)| {
                let source = shaders::lighting_shader(kind.capabilities(), input, attenuation);
                let label = format!("{kind}-{input:?}-pipeline");
                let pipeline = create_screen_pipeline(
                    &device,
                    &label,
                    &source,
                    &[&gbuffer_layout, &light_layout],
                    surface_format,
                );
                ((kind, input), pipeline)
            })
            .collect();

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera-uniform"),
            size: size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let screen = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen-triangle"),
            contents: cast_slice(&ScreenVertex::cover_viewport()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            surface_config,
            size,
            config,
            plan,
            stage: RenderStage::Stopped,
            frame: None,
            gbuffer,
            depth,
            gbuffer_layout,
            gbuffer_bind_group,
            geometry,
            ambient_pipeline,
            ambient_buffer,
            ambient_bind_group,
            light_layout,
            lighting_pipelines,
            camera_buffer,
            screen,
            models: Vec::new(),
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn stage(&self) -> RenderStage {
        self.stage
    }

    pub fn aspect(&self) -> f32 {
        self.size.width as f32 / self.size.height.max(1) as f32
    }

    /// Uploads a triangle list and returns the handle to draw it with.
    pub fn load_model(&mut self, label: &str, vertices: &[Vertex]) -> ModelHandle {
        let vertex = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}-vertices")),
                contents: cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.models.push(MeshBuffers {
            vertex,
            vertex_count: vertices.len() as u32,
        });
        ModelHandle(self.models.len() - 1)
    }

    /// Resizes the swap chain and every size-dependent target.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.recreate_targets();
    }

    /// Starts a frame seen through `camera`.
    ///
    /// A lost or outdated surface leaves the renderer invalid; the next call
    /// rebuilds the targets and the frame is skipped. Other surface errors
    /// are returned.
    pub fn begin(&mut self, camera: &ViewProjection) -> Result<(), wgpu::SurfaceError> {
        if !self.enter(StageCall::Begin) {
            return Ok(());
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) if output.suboptimal => {
                self.stage = RenderStage::Invalid;
                return Ok(());
            }
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.stage = RenderStage::Invalid;
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("surface timeout; retrying next frame");
                self.stage = RenderStage::Stopped;
                return Ok(());
            }
            Err(err) => {
                self.stage = RenderStage::Stopped;
                return Err(err);
            }
        };

        let transforms = camera.frame_transforms();
        if let Some((buffer, _)) = &self.geometry.frame {
            self.queue
                .write_buffer(buffer, 0, bytes_of(&FrameUniform::from(&transforms)));
        }
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytes_of(&CameraUniform::new(camera.camera_position)),
        );

        self.frame = Some(FrameRecording {
            output,
            transforms,
            draws: Vec::new(),
            ambient: false,
            lights: Vec::new(),
        });
        Ok(())
    }

    /// Writes `model` into the G-buffer.
    pub fn draw_model(&mut self, model: ModelHandle, model_matrix: Mat4, material: &Material) {
        if !self.enter(StageCall::DrawModel) {
            return;
        }
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let transforms = &frame.transforms;
        let block = match self.config.transform_variant {
            TransformVariant::Combined => {
                TransformBlock::combined(model_matrix, transforms.view, transforms.projection)
            }
            TransformVariant::Split => {
                TransformBlock::split(model_matrix, transforms.view, transforms.projection)
            }
        };
        let transform_bytes = match &block {
            TransformBlock::Combined { .. } => {
                bytes_of(&ModelViewProjectionUniform::from_block(&block)).to_vec()
            }
            TransformBlock::Split { object, .. } => bytes_of(&ObjectUniform::from(object)).to_vec(),
        };

        let transform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("object-transforms"),
                contents: &transform_bytes,
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let material_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("object-material"),
                contents: bytes_of(&MaterialUniform::from(material)),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object-bind-group"),
            layout: &self.geometry.object_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: transform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: material_buffer.as_entire_binding(),
                },
            ],
        });

        frame.draws.push(ModelDraw { model, bind_group });
    }

    /// Closes the geometry stage and records the ambient pass. Calling it
    /// again before the first light is a no-op.
    pub fn ambient(&mut self, light: &AmbientLight) {
        if !self.enter(StageCall::Ambient) {
            return;
        }
        self.queue.write_buffer(
            &self.ambient_buffer,
            0,
            bytes_of(&AmbientUniform::from(light)),
        );
        if let Some(frame) = self.frame.as_mut() {
            frame.ambient = true;
        }
    }

    /// Records one additive light pass.
    pub fn add_light(&mut self, light: impl Into<FrameLight>) {
        if !self.enter(StageCall::AddLight) {
            return;
        }
        let light = light.into();
        let variant = self.plan.route(&light);
        let contents = match (light, variant.1) {
            (FrameLight::Directional(light), LightInput::DirectionalLight) => {
                bytes_of(&DirectionalLightUniform::from(&light)).to_vec()
            }
            (FrameLight::Directional(light), _) => {
                bytes_of(&LightSourceUniform::from(&LightSource::from(light))).to_vec()
            }
            (FrameLight::Source(source), _) => bytes_of(&LightSourceUniform::from(&source)).to_vec(),
        };

        let light_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("light-uniform"),
                contents: &contents,
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("light-bind-group"),
            layout: &self.light_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.camera_buffer.as_entire_binding(),
                },
            ],
        });

        if let Some(frame) = self.frame.as_mut() {
            frame.lights.push(LightDraw {
                variant,
                bind_group,
            });
        }
    }

    /// Encodes the geometry and lighting passes, submits them and presents.
    pub fn end(&mut self) {
        if !self.enter(StageCall::End) {
            return;
        }
        let Some(frame) = self.frame.take() else {
            return;
        };

        let view = frame
            .output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("deferred-encoder"),
            });

        {
            let color_attachments = self.gbuffer.color_attachments();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("geometry-pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.geometry.pipeline);
            if let Some((_, frame_bind_group)) = &self.geometry.frame {
                pass.set_bind_group(0, frame_bind_group, &[]);
            }
            for draw in &frame.draws {
                let Some(mesh) = self.models.get(draw.model.0) else {
                    warn!("unknown model handle {:?}", draw.model);
                    continue;
                };
                pass.set_vertex_buffer(0, mesh.vertex.slice(..));
                pass.set_bind_group(self.geometry.object_group, &draw.bind_group, &[]);
                pass.draw(0..mesh.vertex_count, 0..1);
            }
        }

        {
            let clear = self.config.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lighting-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.x as f64,
                            g: clear.y as f64,
                            b: clear.z as f64,
                            a: clear.w as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_vertex_buffer(0, self.screen.slice(..));
            pass.set_bind_group(0, &self.gbuffer_bind_group, &[]);
            if frame.ambient {
                pass.set_pipeline(&self.ambient_pipeline);
                pass.set_bind_group(1, &self.ambient_bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
            for light in &frame.lights {
                let Some(pipeline) = self.lighting_pipelines.get(&light.variant) else {
                    warn!("no pipeline for lighting variant {:?}", light.variant);
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &light.bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.output.present();
        debug!(
            "frame presented: {} models, {} lights",
            frame.draws.len(),
            frame.lights.len()
        );
    }

    /// Applies a stage transition. Returns whether the call should be recorded.
    fn enter(&mut self, call: StageCall) -> bool {
        match self.stage.on(call) {
            Transition::Advance(next) => {
                if next != self.stage {
                    debug!("render stage {:?} -> {:?}", self.stage, next);
                }
                self.stage = next;
                true
            }
            Transition::Ignore => false,
            Transition::Reject => {
                self.wrong_stage(call);
                false
            }
        }
    }

    fn wrong_stage(&mut self, call: StageCall) {
        if self.stage == RenderStage::Invalid {
            debug!("surface out of date, rebuilding targets");
            self.recreate_targets();
        } else {
            warn!(
                "{call:?} is not valid during the {:?} stage; dropping frame",
                self.stage
            );
        }
        self.frame = None;
        self.stage = RenderStage::Stopped;
    }

    fn recreate_targets(&mut self) {
        let size = self.window.inner_size();
        if size.width > 0 && size.height > 0 {
            self.size = size;
        }
        self.surface_config.width = self.size.width;
        self.surface_config.height = self.size.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.gbuffer = GBufferTargets::create(
            &self.device,
            self.plan.layout(),
            self.size.width,
            self.size.height,
        );
        self.depth = DepthBuffer::create(&self.device, self.size.width, self.size.height);
        self.gbuffer_bind_group = self.gbuffer.bind_group(&self.device, &self.gbuffer_layout);
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    vertex_count: u32,
}

fn uniform_entry(
    binding: u32,
    size: usize,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size as u64),
        },
        count: None,
    }
}

fn create_geometry_pipeline(
    device: &wgpu::Device,
    config: &RendererConfig,
    plan: &PipelinePlan,
) -> GeometryPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("geometry-shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::geometry_shader(config.transform_variant).into()),
    });

    let transform_size = match config.transform_variant {
        TransformVariant::Combined => size_of::<ModelViewProjectionUniform>(),
        TransformVariant::Split => size_of::<ObjectUniform>(),
    };
    let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("object-bind-layout"),
        entries: &[
            uniform_entry(0, transform_size, wgpu::ShaderStages::VERTEX),
            uniform_entry(
                1,
                size_of::<MaterialUniform>(),
                wgpu::ShaderStages::FRAGMENT,
            ),
        ],
    });

    let (frame, object_group, pipeline_layout) = match config.transform_variant {
        TransformVariant::Combined => {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("geometry-pipeline-layout"),
                bind_group_layouts: &[&object_layout],
                push_constant_ranges: &[],
            });
            (None, 0, layout)
        }
        TransformVariant::Split => {
            let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("frame-bind-layout"),
                entries: &[uniform_entry(
                    0,
                    size_of::<FrameUniform>(),
                    wgpu::ShaderStages::VERTEX,
                )],
            });
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("frame-uniform"),
                size: size_of::<FrameUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("frame-bind-group"),
                layout: &frame_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("geometry-pipeline-layout"),
                bind_group_layouts: &[&frame_layout, &object_layout],
                push_constant_ranges: &[],
            });
            (Some((buffer, bind_group)), 1, layout)
        }
    };

    let targets = GBufferTargets::color_targets(plan.layout());
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("geometry-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Vertex::buffer_layout()],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &targets,
        }),
        multiview: None,
        cache: None,
    });

    GeometryPipeline {
        pipeline,
        frame,
        object_layout,
        object_group,
    }
}

/// Full-screen pass that blends additively onto the surface.
fn create_screen_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[ScreenVertex::buffer_layout()],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(ADDITIVE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}
