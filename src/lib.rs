//! Deferred lighting stage: a geometry pass that fills a G-buffer, followed
//! by additive full-screen passes for ambient, directional and point light.
//!
//! The [`shading`] module holds a CPU rendition of every pass; the WGSL in
//! [`shaders`] mirrors it and [`render::Renderer`] runs it on the GPU.
//! [`pipeline::PipelinePlan`] checks the contract between the passes before
//! anything is drawn.

pub mod config;
pub mod error;
pub mod gbuffer;
pub mod lights;
pub mod material;
pub mod obj;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod shaders;
pub mod shading;
pub mod transform;
pub mod vertex;

pub use config::{RendererConfig, TransformVariant};
pub use error::ContractError;
pub use gbuffer::{GBufferChannel, GBufferLayout, GBufferTexel};
pub use lights::{AmbientLight, Attenuation, DirectionalLight, FrameLight, LightSource};
pub use material::Material;
pub use obj::{load_obj_file, load_obj_from_str, ObjOptions};
pub use pipeline::{HostBindings, LightingPassKind, PipelinePlan};
pub use render::{ModelHandle, Renderer};
pub use scene::{CameraSettings, Scene, SceneObject};
pub use shading::frame::LightingFrame;
pub use shading::lighting::LightingPass;
pub use transform::ViewProjection;
pub use vertex::Vertex;
