//! G-buffer channel contract shared by the geometry pass and every lighting pass.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// One attachment of the intermediate buffer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GBufferChannel {
    /// Surface color, rgb.
    Color,
    /// Transformed normal, xyz. Not unit length.
    Normal,
    /// World-space fragment position, xyz.
    Position,
    /// Packed specular: x = intensity, y = shininess exponent.
    Specular,
}

impl GBufferChannel {
    pub const ALL: [GBufferChannel; 4] = [
        GBufferChannel::Color,
        GBufferChannel::Normal,
        GBufferChannel::Position,
        GBufferChannel::Specular,
    ];

    /// Attachment index in the standard layout.
    pub const fn index(self) -> u32 {
        match self {
            GBufferChannel::Color => 0,
            GBufferChannel::Normal => 1,
            GBufferChannel::Position => 2,
            GBufferChannel::Specular => 3,
        }
    }

    pub const fn format(self) -> wgpu::TextureFormat {
        match self {
            GBufferChannel::Color => wgpu::TextureFormat::Rgb10a2Unorm,
            GBufferChannel::Normal | GBufferChannel::Position => {
                wgpu::TextureFormat::Rgba16Float
            }
            GBufferChannel::Specular => wgpu::TextureFormat::Rg16Float,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            GBufferChannel::Color => "gbuffer-color",
            GBufferChannel::Normal => "gbuffer-normal",
            GBufferChannel::Position => "gbuffer-position",
            GBufferChannel::Specular => "gbuffer-specular",
        }
    }
}

/// Attachment assignment written by a geometry pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GBufferLayout {
    slots: Vec<(GBufferChannel, u32)>,
}

impl Default for GBufferLayout {
    fn default() -> Self {
        Self::standard()
    }
}

impl GBufferLayout {
    /// The fixed channel0..channel3 assignment.
    pub fn standard() -> Self {
        Self {
            slots: GBufferChannel::ALL
                .iter()
                .map(|channel| (*channel, channel.index()))
                .collect(),
        }
    }

    /// Builds a layout from an explicit assignment, e.g. a host that packs its
    /// attachments differently.
    pub fn from_slots(slots: impl IntoIterator<Item = (GBufferChannel, u32)>) -> Self {
        Self {
            slots: slots.into_iter().collect(),
        }
    }

    pub fn index_of(&self, channel: GBufferChannel) -> Option<u32> {
        self.slots
            .iter()
            .find(|(candidate, _)| *candidate == channel)
            .map(|(_, index)| *index)
    }

    pub fn slots(&self) -> &[(GBufferChannel, u32)] {
        &self.slots
    }

    /// Checks that every channel a consumer reads lives at the index it expects.
    ///
    /// Two slots sharing an attachment index or a channel are rejected, since
    /// only one of them would survive target creation.
    pub fn validate_reads(
        &self,
        pass: &'static str,
        reads: &[GBufferChannel],
    ) -> Result<(), ContractError> {
        self.validate_unique(pass)?;
        for channel in reads {
            let found = self
                .index_of(*channel)
                .ok_or(ContractError::MissingChannel {
                    pass,
                    channel: *channel,
                })?;
            if found != channel.index() {
                return Err(ContractError::ChannelMismatch {
                    pass,
                    channel: *channel,
                    expected: channel.index(),
                    found,
                });
            }
        }
        Ok(())
    }

    fn validate_unique(&self, pass: &'static str) -> Result<(), ContractError> {
        for (position, &(channel, index)) in self.slots.iter().enumerate() {
            let clash = self.slots[..position]
                .iter()
                .find(|(other_channel, other_index)| {
                    *other_index == index || *other_channel == channel
                });
            if let Some(&(other_channel, other_index)) = clash {
                let (channel, found) = if index != channel.index() {
                    (channel, index)
                } else {
                    (other_channel, other_index)
                };
                return Err(ContractError::ChannelMismatch {
                    pass,
                    channel,
                    expected: channel.index(),
                    found,
                });
            }
        }
        Ok(())
    }
}

/// Everything the geometry pass stores for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GBufferTexel {
    pub color: Vec3,
    pub normal: Vec3,
    pub position: Vec3,
    pub specular: Vec2,
}

impl GBufferTexel {
    pub fn spec_intensity(&self) -> f32 {
        self.specular.x
    }

    pub fn shininess(&self) -> f32 {
        self.specular.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_accepts_every_consumer() {
        let layout = GBufferLayout::standard();
        assert!(layout
            .validate_reads("unified", &GBufferChannel::ALL)
            .is_ok());
    }

    #[test]
    fn swapped_attachments_are_rejected() {
        let layout = GBufferLayout::from_slots([
            (GBufferChannel::Color, 0),
            (GBufferChannel::Normal, 2),
            (GBufferChannel::Position, 1),
            (GBufferChannel::Specular, 3),
        ]);
        let err = layout
            .validate_reads("directional", &[GBufferChannel::Color, GBufferChannel::Normal])
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::ChannelMismatch {
                pass: "directional",
                channel: GBufferChannel::Normal,
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn shared_attachment_index_is_rejected() {
        let layout = GBufferLayout::from_slots([
            (GBufferChannel::Color, 0),
            (GBufferChannel::Normal, 0),
        ]);
        let err = layout
            .validate_reads("ambient", &[GBufferChannel::Color])
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::ChannelMismatch {
                pass: "ambient",
                channel: GBufferChannel::Normal,
                expected: 1,
                found: 0,
            }
        );
    }

    #[test]
    fn repeated_channel_is_rejected() {
        let layout = GBufferLayout::from_slots([
            (GBufferChannel::Color, 0),
            (GBufferChannel::Normal, 1),
            (GBufferChannel::Color, 3),
        ]);
        assert!(matches!(
            layout.validate_reads("ambient", &[GBufferChannel::Color]),
            Err(ContractError::ChannelMismatch {
                channel: GBufferChannel::Color,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn missing_channel_is_reported() {
        let layout = GBufferLayout::from_slots([(GBufferChannel::Color, 0)]);
        assert!(layout
            .validate_reads("ambient", &[GBufferChannel::Color])
            .is_ok());
        assert!(matches!(
            layout.validate_reads("specular", &[GBufferChannel::Specular]),
            Err(ContractError::MissingChannel { .. })
        ));
    }
}
