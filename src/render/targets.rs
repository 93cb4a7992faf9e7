use crate::gbuffer::{GBufferChannel, GBufferLayout};

/// One texture per G-buffer channel, written by the geometry pass and read
/// by every lighting pass.
pub(crate) struct GBufferTargets {
    slots: Vec<Option<ChannelTarget>>,
}

struct ChannelTarget {
    channel: GBufferChannel,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl GBufferTargets {
    pub(crate) fn create(
        device: &wgpu::Device,
        layout: &GBufferLayout,
        width: u32,
        height: u32,
    ) -> Self {
        let mut slots: Vec<Option<ChannelTarget>> = Vec::new();
        for (channel, index) in layout.slots() {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(channel.label()),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: channel.format(),
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let index = *index as usize;
            if slots.len() <= index {
                slots.resize_with(index + 1, || None);
            }
            slots[index] = Some(ChannelTarget {
                channel: *channel,
                _texture: texture,
                view,
            });
        }
        Self { slots }
    }

    /// Color target states in attachment order, for the geometry pipeline.
    pub(crate) fn color_targets(layout: &GBufferLayout) -> Vec<Option<wgpu::ColorTargetState>> {
        let count = layout
            .slots()
            .iter()
            .map(|(_, index)| *index as usize + 1)
            .max()
            .unwrap_or(0);
        let mut targets = vec![None; count];
        for (channel, index) in layout.slots() {
            targets[*index as usize] = Some(wgpu::ColorTargetState {
                format: channel.format(),
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            });
        }
        targets
    }

    /// Attachments cleared to zero at the start of the geometry pass.
    pub(crate) fn color_attachments(&self) -> Vec<Option<wgpu::RenderPassColorAttachment<'_>>> {
        self.slots
            .iter()
            .map(|slot| {
                slot.as_ref().map(|target| wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect()
    }

    /// Texture bindings of group 0 in every lighting pass. A channel is bound
    /// at its attachment index.
    pub(crate) fn bind_group_layout(
        device: &wgpu::Device,
        layout: &GBufferLayout,
    ) -> wgpu::BindGroupLayout {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = layout
            .slots()
            .iter()
            .map(|(_, index)| wgpu::BindGroupLayoutEntry {
                binding: *index,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gbuffer-bind-layout"),
            entries: &entries,
        })
    }

    pub(crate) fn bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        let entries: Vec<wgpu::BindGroupEntry> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref().map(|target| wgpu::BindGroupEntry {
                    binding: index as u32,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                })
            })
            .collect();
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gbuffer-bind-group"),
            layout,
            entries: &entries,
        })
    }

    pub(crate) fn channels(&self) -> impl Iterator<Item = GBufferChannel> + '_ {
        self.slots.iter().flatten().map(|target| target.channel)
    }
}

pub(crate) struct DepthBuffer {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl DepthBuffer {
    pub(crate) const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    pub(crate) fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gbuffer-depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}
