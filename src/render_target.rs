//! Off-screen render targets owned by scene hosts.

use crate::gpu::GpuContext;

/// An off-screen colour buffer a scene host draws into.
///
/// Render targets are GPU textures that can be both rendered to (as a colour
/// attachment) and sampled from (as a texture binding). A host renders into
/// its target earlier in a frame and the transition blend samples it later in
/// the same frame.
///
/// Dimensions are fixed for the lifetime of the texture. A size change drops
/// the old texture and allocates a new one; there is no in-place resize.
pub struct RenderTarget {
    /// The underlying GPU texture that stores pixel data.
    pub texture: wgpu::Texture,
    /// A view into the texture, used for render pass attachments and shader sampling.
    pub view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    filter: wgpu::FilterMode,
    label: String,
}

impl RenderTarget {
    /// Allocates a target of the given size, format and filter mode.
    ///
    /// The texture is created with `RENDER_ATTACHMENT` usage for writing and
    /// `TEXTURE_BINDING` usage for sampling. Zero dimensions are bumped to 1.
    pub fn allocate(
        gpu: &GpuContext,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        filter: wgpu::FilterMode,
        label: &str,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler_label = format!("{} Sampler", label);
        let sampler = gpu.device.create_sampler(&sampler_descriptor(&sampler_label, filter));

        log::debug!("allocated render target '{}' {}x{} {:?}", label, width, height, format);

        Self {
            texture,
            view,
            sampler,
            width,
            height,
            format,
            filter,
            label: label.to_string(),
        }
    }

    /// Reallocates the target when the requested size differs.
    ///
    /// Returns `true` when a new texture was allocated.
    pub fn ensure_size(&mut self, gpu: &GpuContext, width: u32, height: u32) -> bool {
        if !needs_realloc((self.width, self.height), (width, height)) {
            return false;
        }
        *self = Self::allocate(gpu, width, height, self.format, self.filter, &self.label);
        true
    }

    /// Begins a render pass that writes into this target, cleared to `clear`.
    pub fn begin_write<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        clear: wgpu::Color,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    /// The target as a read-only texture for sampling.
    pub fn as_texture(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn filter(&self) -> wgpu::FilterMode {
        self.filter
    }
}

/// Sampler settings for reading a target back: edges clamped, `filter` both ways.
fn sampler_descriptor(label: &str, filter: wgpu::FilterMode) -> wgpu::SamplerDescriptor<'_> {
    wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    }
}

/// Whether a target of size `current` must be reallocated to serve `requested`.
///
/// Zero requests are compared after the same clamp `allocate` applies.
pub(crate) fn needs_realloc(current: (u32, u32), requested: (u32, u32)) -> bool {
    current != (requested.0.max(1), requested.1.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_follows_target_filter() {
        let nearest = sampler_descriptor("a", wgpu::FilterMode::Nearest);
        assert_eq!(nearest.mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(nearest.min_filter, wgpu::FilterMode::Nearest);

        let linear = sampler_descriptor("b", wgpu::FilterMode::Linear);
        assert_eq!(linear.mag_filter, wgpu::FilterMode::Linear);
        assert_eq!(linear.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert_eq!(linear.label, Some("b"));
    }

    #[test]
    fn same_size_is_kept() {
        assert!(!needs_realloc((1280, 720), (1280, 720)));
    }

    #[test]
    fn any_dimension_change_reallocates() {
        assert!(needs_realloc((1280, 720), (1281, 720)));
        assert!(needs_realloc((1280, 720), (1280, 719)));
    }

    #[test]
    fn zero_request_matches_minimum_target() {
        assert!(!needs_realloc((1, 1), (0, 0)));
        assert!(needs_realloc((2, 1), (0, 1)));
    }
}
