//! GPU pass that draws the transition blend to the output surface.
//!
//! One full-screen draw samples both scene targets and the mask, and writes
//! the blended result. The per-pixel math mirrors [`super::blend`].

use super::blend::BlendParams;
use crate::gpu::GpuContext;
use crate::render_target::RenderTarget;

/// Uniforms for the blend shader.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct BlendUniforms {
    /// Output resolution in pixels.
    resolution: [f32; 2],
    mix_ratio: f32,
    threshold: f32,
    /// 1 for the mask wipe, 0 for the plain crossfade.
    use_mask: u32,
    _pad: [f32; 3],
}

impl BlendUniforms {
    fn new(resolution: [f32; 2], params: &BlendParams) -> Self {
        Self {
            resolution,
            mix_ratio: params.mix_ratio,
            threshold: params.threshold,
            use_mask: params.use_mask as u32,
            _pad: [0.0; 3],
        }
    }
}

/// GPU resources for the full-screen transition blend.
pub struct BlendPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    mask_sampler: wgpu::Sampler,
}

impl BlendPass {
    /// Create the blend pipeline for the surface format.
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Transition Blend Shader"),
            source: wgpu::ShaderSource::Wgsl(BLEND_SHADER.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Transition Blend Uniforms"),
            size: std::mem::size_of::<BlendUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mask_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Transition Mask Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        // Uniforms, then scene A / scene B / mask textures, then one sampler each
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Transition Blend Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                sampler_entry(4),
                sampler_entry(5),
                sampler_entry(6),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Transition Blend Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Transition Blend Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group_layout,
            mask_sampler,
        }
    }

    /// Record the blend draw into `encoder`.
    ///
    /// # Arguments
    ///
    /// * `target` - Output view, cleared before drawing
    /// * `scene_a` - Target of scene A, rendered earlier this frame
    /// * `scene_b` - Target of scene B, rendered earlier this frame
    /// * `mask` - Wipe mask, read on its red channel
    /// * `params` - Mix ratio, threshold and blend mode
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene_a: &RenderTarget,
        scene_b: &RenderTarget,
        mask: &wgpu::TextureView,
        params: &BlendParams,
    ) {
        let uniforms = BlendUniforms::new([gpu.width() as f32, gpu.height() as f32], params);
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transition Blend Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(scene_a.as_texture()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(scene_b.as_texture()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(mask),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(scene_a.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(scene_b.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::Sampler(&self.mask_sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Transition Blend Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// Mask wipe / crossfade shader.
const BLEND_SHADER: &str = r#"
struct Uniforms {
    resolution: vec2f,
    mix_ratio: f32,
    threshold: f32,
    use_mask: u32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var texture_a: texture_2d<f32>;
@group(0) @binding(2) var texture_b: texture_2d<f32>;
@group(0) @binding(3) var mask_texture: texture_2d<f32>;
@group(0) @binding(4) var sampler_a: sampler;
@group(0) @binding(5) var sampler_b: sampler;
@group(0) @binding(6) var mask_sampler: sampler;

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> @builtin(position) vec4f {
    // Fullscreen triangle covering the whole viewport
    let corner = vec2f(f32((vi << 1u) & 2u), f32(vi & 2u));
    return vec4f(corner * 2.0 - 1.0, 0.0, 1.0);
}

@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let texel1 = textureSample(texture_a, sampler_a, uv);
    let texel2 = textureSample(texture_b, sampler_b, uv);
    let transition_texel = textureSample(mask_texture, mask_sampler, uv);

    if (u.use_mask == 1u) {
        let r = u.mix_ratio * (1.0 + u.threshold * 2.0) - u.threshold;
        let mixf = clamp((transition_texel.r - r) * (1.0 / u.threshold), 0.0, 1.0);
        return mix(texel1, texel2, mixf);
    }

    return mix(texel2, texel1, u.mix_ratio);
}
"#;
