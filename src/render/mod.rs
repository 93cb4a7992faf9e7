mod native;
mod stage;
mod targets;
pub mod uniforms;

pub use native::{ModelHandle, Renderer};
pub use stage::{RenderStage, StageCall, Transition};
