use thiserror::Error;

use crate::gbuffer::GBufferChannel;

/// Mismatch between what a pass expects and what the host pipeline provides.
///
/// These are raised while the pipeline is being assembled. Per-pixel and
/// per-vertex evaluation has no failure mode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error("{pass} reads {channel:?} from attachment {expected}, but the geometry pass writes it to {found}")]
    ChannelMismatch {
        pass: &'static str,
        channel: GBufferChannel,
        expected: u32,
        found: u32,
    },
    #[error("{pass} reads {channel:?}, which the geometry pass does not write")]
    MissingChannel {
        pass: &'static str,
        channel: GBufferChannel,
    },
    #[error("{pass} requires the `{binding}` uniform block, but the host does not bind it")]
    MissingBinding {
        pass: &'static str,
        binding: &'static str,
    },
    #[error("vertex attribute at location {location} is {found}, geometry pass expects {expected}")]
    VertexLayoutMismatch {
        location: u32,
        expected: String,
        found: String,
    },
    #[error("light block discriminator must be 0 (directional) or 1 (point), got {0}")]
    UnknownLightKind(f32),
}
