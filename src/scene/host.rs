//! Scene hosts: a camera, some content and an off-screen target.

use glam::{Vec2, Vec3};
use hecs::Entity;

use super::compositor::Destination;
use super::content::ContentRoot;
use crate::assets::{AssetLoad, AssetPoll, ImageSource, TextureBank};
use crate::camera::Camera;
use crate::ecs::{Quad, ShadowCaps, Transform};
use crate::gpu::GpuContext;
use crate::render_target::RenderTarget;
use crate::texture::Texture;

/// What a scene host draws.
#[derive(Clone, Debug, Default)]
pub enum ContentSource {
    /// Nothing; the host renders its clear colour.
    #[default]
    Empty,
    /// A still image, decoded in the background.
    Image(ImageSource),
    /// A generated vertical gradient between two colours.
    Gradient { top: [u8; 3], bottom: [u8; 3] },
}

/// Configuration for one scene host.
///
/// # Example
///
/// ```ignore
/// let scene = SceneConfig::new("city")
///     .clear_color(wgpu::Color::BLACK)
///     .camera(Camera::new().at([0.0, 0.0, 900.0]).looking_at([0.0, 0.0, 0.0]))
///     .content(ContentSource::Image(ImageSource::File("city.jpg".into())));
/// ```
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub name: String,
    /// Fixed target size. `None` follows the surface.
    pub size: Option<(u32, u32)>,
    pub clear_color: wgpu::Color,
    pub camera: Camera,
    pub content: ContentSource,
    /// World-space size of the backdrop quad.
    pub quad_size: Vec2,
    pub placement: Transform,
    pub shadows: ShadowCaps,
}

impl SceneConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            clear_color: wgpu::Color::BLACK,
            camera: Camera::new().looking_at(Vec3::ZERO),
            content: ContentSource::Empty,
            quad_size: Vec2::new(1280.0, 720.0),
            placement: Transform::new(),
            shadows: ShadowCaps::NONE,
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn content(mut self, content: ContentSource) -> Self {
        self.content = content;
        self
    }

    pub fn quad(mut self, size: Vec2, placement: Transform) -> Self {
        self.quad_size = size;
        self.placement = placement;
        self
    }

    pub fn shadows(mut self, shadows: ShadowCaps) -> Self {
        self.shadows = shadows;
        self
    }
}

enum ContentState {
    Empty,
    Loading(AssetLoad<image::RgbaImage>),
    Ready(ContentRoot),
    Failed,
}

impl ContentState {
    fn root(&self) -> Option<&ContentRoot> {
        match self {
            ContentState::Ready(root) => Some(root),
            _ => None,
        }
    }

    /// Move a background load along without blocking.
    ///
    /// Returns decoded pixels and their label once they are ready to upload.
    /// A failed load is logged once and settles into `Failed`.
    fn advance(&mut self, scene: &str) -> Option<(image::RgbaImage, String)> {
        let ContentState::Loading(load) = self else {
            return None;
        };

        let label = load.label().to_string();
        match load.poll() {
            AssetPoll::Pending => None,
            AssetPoll::Ready(img) => Some((img, label)),
            AssetPoll::Failed(reason) => {
                log::warn!("scene '{}' content {} failed to load: {}", scene, label, reason);
                *self = ContentState::Failed;
                None
            }
            AssetPoll::Settled => {
                *self = ContentState::Failed;
                None
            }
        }
    }
}

/// Per-quad GPU state, attached to a node the first time it is drawn.
struct QuadBinding {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Uniforms for one content quad.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadUniforms {
    mvp: [[f32; 4]; 4],
    size: [f32; 2],
    viewport_aspect: f32,
    texture_aspect: f32,
}

/// Everything a host needs from the session to draw one frame.
pub struct HostFrame<'a> {
    pub gpu: &'a GpuContext,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// The output surface view, used for direct rendering.
    pub screen: &'a wgpu::TextureView,
    pub pipeline: &'a ContentPipeline,
    pub textures: &'a TextureBank,
}

/// A camera, a content root and an exclusively owned render target.
pub struct SceneHost {
    name: String,
    pub camera: Camera,
    content: ContentState,
    target: RenderTarget,
    fixed_size: Option<(u32, u32)>,
    clear_color: wgpu::Color,
    quad_size: Vec2,
    placement: Transform,
    shadows: ShadowCaps,
}

impl SceneHost {
    /// Create a host and start loading its content.
    ///
    /// `surface_size` is used when the config does not fix a size.
    pub fn new(gpu: &GpuContext, bank: &mut TextureBank, config: SceneConfig, surface_size: (u32, u32)) -> Self {
        let (width, height) = config.size.unwrap_or(surface_size);
        let target = RenderTarget::allocate(
            gpu,
            width,
            height,
            gpu.format(),
            wgpu::FilterMode::Linear,
            &format!("{} Target", config.name),
        );

        let mut camera = config.camera;
        camera.set_viewport(target.width(), target.height());

        let mut host = Self {
            name: config.name,
            camera,
            content: ContentState::Empty,
            target,
            fixed_size: config.size,
            clear_color: config.clear_color,
            quad_size: config.quad_size,
            placement: config.placement,
            shadows: config.shadows,
        };

        match config.content {
            ContentSource::Empty => {}
            ContentSource::Image(source) => host.content = ContentState::Loading(source.load()),
            ContentSource::Gradient { top, bottom } => {
                let texture = Texture::gradient(gpu, 256, 256, top, bottom);
                host.install(bank, texture);
            }
        }

        host
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.target.width()
    }

    pub fn height(&self) -> u32 {
        self.target.height()
    }

    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// True once content is available to draw.
    pub fn is_ready(&self) -> bool {
        self.content.root().is_some()
    }

    /// True while content is still decoding.
    pub fn is_loading(&self) -> bool {
        matches!(self.content, ContentState::Loading(_))
    }

    pub fn content(&self) -> Option<&ContentRoot> {
        self.content.root()
    }

    pub fn content_mut(&mut self) -> Option<&mut ContentRoot> {
        match &mut self.content {
            ContentState::Ready(root) => Some(root),
            _ => None,
        }
    }

    /// Replace the content with a prepared root.
    pub fn set_content(&mut self, mut root: ContentRoot) {
        root.apply_shadow_caps(self.shadows);
        self.content = ContentState::Ready(root);
    }

    fn install(&mut self, bank: &mut TextureBank, texture: Texture) {
        let aspect = texture.aspect();
        let id = bank.add(texture);
        self.set_content(ContentRoot::backdrop(id, aspect, self.quad_size, self.placement));
        log::info!("scene '{}' content ready", self.name);
    }

    /// Promote finished background loads. Never blocks.
    ///
    /// A failed load is logged once; the host keeps rendering its clear
    /// colour from then on.
    pub fn poll_content(&mut self, gpu: &GpuContext, bank: &mut TextureBank) {
        if let Some((img, label)) = self.content.advance(&self.name) {
            let texture = Texture::from_image(gpu, &img, &label);
            self.install(bank, texture);
        }
    }

    /// Follow a surface resize.
    ///
    /// Updates the camera's aspect and projection and reallocates the target.
    /// Hosts with a fixed size keep it.
    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        let (width, height) = follow_surface(&mut self.camera, self.fixed_size, width, height);
        self.target.ensure_size(gpu, width, height);
    }

    /// The host's target for sampling.
    ///
    /// Only holds this frame's image after `render(.., Destination::Offscreen)`
    /// ran earlier in the same frame.
    pub fn output_texture(&self) -> &wgpu::TextureView {
        self.target.as_texture()
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Render the host's content with its camera.
    ///
    /// The destination is always cleared first. Absent content draws nothing.
    pub fn render(&mut self, frame: &mut HostFrame<'_>, destination: Destination) {
        if let ContentState::Ready(root) = &mut self.content {
            bind_new_quads(root, frame);
        }

        let mut pass = match destination {
            Destination::Offscreen => self.target.begin_write(frame.encoder, self.clear_color),
            Destination::Screen => frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&self.name),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.screen,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            }),
        };

        let Some(root) = self.content.root() else {
            return;
        };

        let view_proj = self.camera.view_projection();
        let viewport_aspect = destination_aspect(
            destination,
            (self.target.width(), self.target.height()),
            (frame.gpu.width(), frame.gpu.height()),
        );
        pass.set_pipeline(&frame.pipeline.pipeline);

        let mut query = root.world().query::<(&Transform, &Quad, &QuadBinding)>();
        for (_, (transform, quad, binding)) in query.iter() {
            let uniforms = QuadUniforms {
                mvp: (view_proj * transform.matrix()).to_cols_array_2d(),
                size: quad.size.to_array(),
                viewport_aspect,
                texture_aspect: quad.texture_aspect,
            };
            frame
                .gpu
                .queue
                .write_buffer(&binding.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

            pass.set_bind_group(0, &binding.bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
    }
}

/// Point `camera` at a resized surface and return the size the host's target
/// takes. A fixed size wins over the surface.
pub(crate) fn follow_surface(camera: &mut Camera, fixed_size: Option<(u32, u32)>, width: u32, height: u32) -> (u32, u32) {
    let (width, height) = fixed_size.unwrap_or((width, height));
    camera.set_viewport(width, height);
    (width, height)
}

/// Aspect ratio of whatever `destination` resolves to this frame.
fn destination_aspect(destination: Destination, target: (u32, u32), screen: (u32, u32)) -> f32 {
    let (width, height) = match destination {
        Destination::Offscreen => target,
        Destination::Screen => screen,
    };
    width.max(1) as f32 / height.max(1) as f32
}

/// Attach GPU state to quads drawn for the first time.
fn bind_new_quads(root: &mut ContentRoot, frame: &HostFrame<'_>) {
    let unbound: Vec<(Entity, Quad)> = root
        .world()
        .query::<(&Quad, Option<&QuadBinding>)>()
        .iter()
        .filter(|(_, (_, binding))| binding.is_none())
        .map(|(entity, (quad, _))| (entity, *quad))
        .collect();

    for (entity, quad) in unbound {
        let Some(texture) = frame.textures.get(quad.texture) else {
            log::warn!("quad references unknown texture {:?}", quad.texture);
            continue;
        };
        let binding = frame.pipeline.bind(frame.gpu, texture);
        if root.world_mut().insert_one(entity, binding).is_err() {
            log::warn!("quad node {:?} vanished before binding", entity);
        }
    }
}

/// Scale applied to texture coordinates so a texture covers the viewport.
///
/// A texture wider than the viewport is cropped horizontally. A texture
/// taller than the viewport is left unscaled.
pub fn cover_multiplier(viewport_aspect: f32, texture_aspect: f32) -> Vec2 {
    if texture_aspect > viewport_aspect {
        Vec2::new(viewport_aspect / texture_aspect, 1.0)
    } else {
        Vec2::ONE
    }
}

/// Remap `uv` around the centre by a cover multiplier.
pub fn cover_uv(uv: Vec2, multiplier: Vec2) -> Vec2 {
    (uv - 0.5) * multiplier + 0.5
}

/// Pipeline shared by every host for drawing content quads.
pub struct ContentPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl ContentPipeline {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Content Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(CONTENT_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Content Quad Bind Group Layout"),
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
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Content Quad Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Content Quad Pipeline"),
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
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Quads are visible from both sides
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    fn bind(&self, gpu: &GpuContext, texture: &Texture) -> QuadBinding {
        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Content Quad Uniforms"),
            size: std::mem::size_of::<QuadUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Content Quad Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        QuadBinding {
            uniform_buffer,
            bind_group,
        }
    }
}

const CONTENT_SHADER: &str = r#"
struct Uniforms {
    mvp: mat4x4f,
    size: vec2f,
    viewport_aspect: f32,
    texture_aspect: f32,
}

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var content_texture: texture_2d<f32>;
@group(0) @binding(2) var content_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4f,
    @location(0) uv: vec2f,
}

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> VertexOutput {
    var corners = array<vec2f, 6>(
        vec2f(0.0, 0.0), vec2f(1.0, 0.0), vec2f(1.0, 1.0),
        vec2f(0.0, 0.0), vec2f(1.0, 1.0), vec2f(0.0, 1.0),
    );
    let corner = corners[vi];
    let local = (corner - 0.5) * u.size;

    var out: VertexOutput;
    out.position = u.mvp * vec4f(local, 0.0, 1.0);
    out.uv = vec2f(corner.x, 1.0 - corner.y);
    return out;
}

@fragment
fn fs(in: VertexOutput) -> @location(0) vec4f {
    var multiplier = vec2f(1.0, 1.0);
    if (u.texture_aspect > u.viewport_aspect) {
        multiplier = vec2f(u.viewport_aspect / u.texture_aspect, 1.0);
    }
    let uv = (in.uv - 0.5) * multiplier + 0.5;
    return textureSample(content_texture, content_sampler, uv);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wider_texture_is_cropped_horizontally() {
        let m = cover_multiplier(16.0 / 9.0, 32.0 / 9.0);
        assert_eq!(m, Vec2::new(0.5, 1.0));
        assert_eq!(cover_uv(Vec2::new(0.0, 0.0), m), Vec2::new(0.25, 0.0));
        assert_eq!(cover_uv(Vec2::new(1.0, 1.0), m), Vec2::new(0.75, 1.0));
    }

    #[test]
    fn matching_or_taller_texture_is_unscaled() {
        assert_eq!(cover_multiplier(16.0 / 9.0, 16.0 / 9.0), Vec2::ONE);
        assert_eq!(cover_multiplier(16.0 / 9.0, 9.0 / 16.0), Vec2::ONE);
    }

    #[test]
    fn centre_is_fixed_under_any_multiplier() {
        let centre = Vec2::splat(0.5);
        assert_eq!(cover_uv(centre, Vec2::new(0.3, 1.0)), centre);
    }

    #[test]
    fn failed_load_settles_into_failed() {
        let mut content = ContentState::Loading(AssetLoad::failed("city.jpg", "no such file"));

        assert!(content.advance("city").is_none());
        assert!(matches!(content, ContentState::Failed));
        assert!(content.root().is_none());

        // Later polls stay quiet and never recover
        assert!(content.advance("city").is_none());
        assert!(matches!(content, ContentState::Failed));
    }

    #[test]
    fn drained_load_counts_as_failed() {
        let mut load = AssetLoad::ready("city.jpg", image::RgbaImage::new(1, 1));
        assert!(matches!(load.poll(), AssetPoll::Ready(_)));

        let mut content = ContentState::Loading(load);
        assert!(content.advance("city").is_none());
        assert!(matches!(content, ContentState::Failed));
    }

    #[test]
    fn ready_load_hands_over_pixels() {
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([9, 9, 9, 255]));
        let mut content = ContentState::Loading(AssetLoad::ready("forest.png", img.clone()));

        let (pixels, label) = content.advance("forest").expect("pixels ready");
        assert_eq!(pixels, img);
        assert_eq!(label, "forest.png");
        // Nothing to draw until the upload installs a root
        assert!(content.root().is_none());
    }

    #[test]
    fn pending_load_keeps_loading() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let load = AssetLoad::spawn("slow.png", move || {
            let _ = rx.recv();
            Err::<image::RgbaImage, _>("cancelled")
        });
        let mut content = ContentState::Loading(load);

        assert!(content.advance("slow").is_none());
        assert!(matches!(content, ContentState::Loading(_)));
        assert!(content.root().is_none());
        drop(tx);
    }

    #[test]
    fn absent_content_has_nothing_to_draw() {
        assert!(ContentState::Empty.root().is_none());
        assert!(ContentState::Failed.root().is_none());
    }

    #[test]
    fn screen_draws_use_the_screen_aspect() {
        assert_eq!(destination_aspect(Destination::Offscreen, (800, 800), (1600, 900)), 1.0);
        assert_eq!(destination_aspect(Destination::Screen, (800, 800), (1600, 900)), 16.0 / 9.0);
        assert_eq!(destination_aspect(Destination::Screen, (800, 800), (0, 0)), 1.0);
    }

    #[test]
    fn fixed_size_survives_surface_resize() {
        let mut camera = Camera::new();
        assert_eq!(follow_surface(&mut camera, Some((640, 640)), 1920, 1080), (640, 640));
        assert_eq!(camera.aspect(), 1.0);

        assert_eq!(follow_surface(&mut camera, None, 1920, 1080), (1920, 1080));
        assert_eq!(camera.aspect(), 16.0 / 9.0);
    }

    #[test]
    fn scene_config_builder_sets_fields() {
        let config = SceneConfig::new("a")
            .size(640, 480)
            .clear_color(wgpu::Color::WHITE)
            .shadows(ShadowCaps::ALL)
            .content(ContentSource::Gradient {
                top: [0, 0, 0],
                bottom: [255, 255, 255],
            });
        assert_eq!(config.name, "a");
        assert_eq!(config.size, Some((640, 480)));
        assert_eq!(config.clear_color, wgpu::Color::WHITE);
        assert_eq!(config.shadows, ShadowCaps::ALL);
        assert!(matches!(config.content, ContentSource::Gradient { .. }));
    }
}
