use crate::gpu::GpuContext;

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    ///
    /// Sampling is linear and clamped to the edge, which is what both scene
    /// content and wipe masks want.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Create a mask texture from raw RGBA data.
    ///
    /// Masks are stored in a linear format so the red channel reaches the
    /// blend shader exactly as authored.
    pub fn mask_from_rgba(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Upload an already decoded image.
    pub fn from_image(gpu: &GpuContext, img: &image::RgbaImage, label: &str) -> Self {
        let (width, height) = img.dimensions();
        Self::from_rgba(gpu, img, width, height, label)
    }

    /// Width / height of the source image.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Generate a procedural wipe mask.
    ///
    /// Produces smooth value noise in the red channel (copied to green and
    /// blue for debugging views). `cell` is the noise cell size in pixels.
    pub fn noise_mask(gpu: &GpuContext, size: u32, cell: u32, seed: u32) -> Self {
        let data = noise_mask_pixels(size, cell, seed);
        Self::mask_from_rgba(gpu, &data, size, size, "Noise Mask Texture")
    }

    /// Generate a two-colour vertical gradient, used as placeholder scene
    /// content when no image is supplied.
    pub fn gradient(gpu: &GpuContext, width: u32, height: u32, top: [u8; 3], bottom: [u8; 3]) -> Self {
        let mut data = vec![0u8; (width * height * 4) as usize];
        for y in 0..height {
            let t = y as f32 / (height.max(2) - 1) as f32;
            let row = [
                lerp_u8(top[0], bottom[0], t),
                lerp_u8(top[1], bottom[1], t),
                lerp_u8(top[2], bottom[2], t),
            ];
            for x in 0..width {
                let idx = ((y * width + x) * 4) as usize;
                data[idx..idx + 3].copy_from_slice(&row);
                data[idx + 3] = 255;
            }
        }
        Self::from_rgba(gpu, &data, width, height, "Gradient Texture")
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

/// RGBA pixels of a square value-noise mask.
pub(crate) fn noise_mask_pixels(size: u32, cell: u32, seed: u32) -> Vec<u8> {
    let cell = cell.max(1);
    let mut data = vec![0u8; (size * size * 4) as usize];

    for y in 0..size {
        for x in 0..size {
            let cx = x / cell;
            let cy = y / cell;
            let fx = smoothstep((x % cell) as f32 / cell as f32);
            let fy = smoothstep((y % cell) as f32 / cell as f32);

            let corner = |i: u32, j: u32| (hash(cx + i, cy + j, seed) & 0xff) as f32;
            let top = corner(0, 0) + (corner(1, 0) - corner(0, 0)) * fx;
            let bottom = corner(0, 1) + (corner(1, 1) - corner(0, 1)) * fx;
            let value = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;

            let idx = ((y * size + x) * 4) as usize;
            data[idx] = value;
            data[idx + 1] = value;
            data[idx + 2] = value;
            data[idx + 3] = 255;
        }
    }

    data
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Simple hash function for procedural generation.
fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_mask_is_opaque_grayscale() {
        let data = noise_mask_pixels(16, 4, 7);
        assert_eq!(data.len(), 16 * 16 * 4);
        for px in data.chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[0], px[2]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn noise_mask_is_deterministic_per_seed() {
        assert_eq!(noise_mask_pixels(8, 2, 1), noise_mask_pixels(8, 2, 1));
        assert_ne!(noise_mask_pixels(8, 2, 1), noise_mask_pixels(8, 2, 2));
    }

    #[test]
    fn noise_mask_spreads_over_value_range() {
        let data = noise_mask_pixels(64, 8, 3);
        let min = data.chunks_exact(4).map(|p| p[0]).min().unwrap_or(0);
        let max = data.chunks_exact(4).map(|p| p[0]).max().unwrap_or(0);
        assert!(max - min > 64);
    }
}
