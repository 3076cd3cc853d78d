//! A running two-scene transition session.
//!
//! [`Session`] is the context object that owns every GPU resource the
//! transition needs: both scene hosts, the texture bank, the content and
//! blend pipelines, and the [`Director`] that decides what each frame draws.
//! Nothing is global; the window shell creates one session and drives it with
//! [`Session::frame`].

use glam::Vec3;

use crate::assets::{ImageSource, TextureBank};
use crate::ecs::TextureId;
use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::scene::{
    BlendParams, BlendPass, ContentPipeline, Destination, Director, DriverMode, FramePlan, FrameSink, HostFrame,
    MaskSwap, SceneConfig, SceneHost, Side, TransitionCompositor, TransitionDriver, check_threshold,
};
use crate::texture::Texture;

/// Where a wipe mask comes from.
#[derive(Clone, Debug)]
pub enum MaskSource {
    /// An image, sampled on its red channel.
    Image(ImageSource),
    /// Procedural value noise.
    Noise { size: u32, cell: u32, seed: u32 },
}

impl Default for MaskSource {
    fn default() -> Self {
        MaskSource::Noise {
            size: 512,
            cell: 32,
            seed: 1,
        }
    }
}

/// Everything needed to start a [`Session`].
///
/// # Example
///
/// ```ignore
/// let config = SessionConfig::new(SceneConfig::new("a"), SceneConfig::new("b"))
///     .threshold(0.1)
///     .mask(MaskSource::Image(ImageSource::File("wipe.png".into())))
///     .mode(DriverMode::Oscillating { period: 4.0 });
/// ```
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub scene_a: SceneConfig,
    pub scene_b: SceneConfig,
    /// Masks available to the compositor. The first is active at start.
    /// Empty means a single default noise mask.
    pub masks: Vec<MaskSource>,
    pub threshold: f32,
    pub use_mask: bool,
    pub mode: DriverMode,
    /// World-space point watched by scene A's camera. Losing sight of it
    /// starts a one-shot transition.
    pub subject: Option<Vec3>,
}

impl SessionConfig {
    pub fn new(scene_a: SceneConfig, scene_b: SceneConfig) -> Self {
        Self {
            scene_a,
            scene_b,
            masks: Vec::new(),
            threshold: 0.1,
            use_mask: true,
            mode: DriverMode::default(),
            subject: None,
        }
    }

    pub fn mask(mut self, mask: MaskSource) -> Self {
        self.masks.push(mask);
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn use_mask(mut self, use_mask: bool) -> Self {
        self.use_mask = use_mask;
        self
    }

    pub fn mode(mut self, mode: DriverMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn subject(mut self, subject: Vec3) -> Self {
        self.subject = Some(subject);
        self
    }
}

/// Two scene hosts, their masks and the director that composites them.
pub struct Session {
    hosts: [SceneHost; 2],
    textures: TextureBank,
    masks: Vec<TextureId>,
    mask_cursor: usize,
    content_pipeline: ContentPipeline,
    blend_pass: BlendPass,
    director: Director,
    subject: Option<Vec3>,
}

impl Session {
    /// Build every GPU resource and start loading scene content.
    ///
    /// Masks are decoded here, before the first frame can need them. Scene
    /// content loads in the background and shows up when ready.
    pub fn init(gpu: &GpuContext, config: SessionConfig) -> Result<Self> {
        let threshold = check_threshold(config.threshold)?;

        let mut textures = TextureBank::new();
        let mut mask_sources = config.masks;
        if mask_sources.is_empty() {
            mask_sources.push(MaskSource::default());
        }
        let masks = mask_sources
            .into_iter()
            .map(|source| load_mask(gpu, source).map(|mask| textures.add(mask)))
            .collect::<Result<Vec<_>>>()?;

        let surface_size = (gpu.width(), gpu.height());
        let hosts = [
            SceneHost::new(gpu, &mut textures, config.scene_a, surface_size),
            SceneHost::new(gpu, &mut textures, config.scene_b, surface_size),
        ];

        let mut compositor = TransitionCompositor::new(masks[0], threshold)?;
        compositor.set_use_mask(config.use_mask);
        let director = Director::new(compositor, TransitionDriver::new(config.mode));

        log::info!(
            "session ready: '{}' -> '{}', {} mask(s), {:?}",
            hosts[0].name(),
            hosts[1].name(),
            masks.len(),
            config.mode
        );

        Ok(Self {
            hosts,
            textures,
            masks,
            mask_cursor: 0,
            content_pipeline: ContentPipeline::new(gpu),
            blend_pass: BlendPass::new(gpu),
            director,
            subject: config.subject,
        })
    }

    /// Promote any scene content that finished loading.
    pub fn poll_assets(&mut self, gpu: &GpuContext) {
        for host in &mut self.hosts {
            host.poll_content(gpu, &mut self.textures);
        }
    }

    /// Advance the transition by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(subject) = self.subject {
            let visible = self.hosts[Side::A.index()].camera.contains_point(subject);
            self.director.observe_subject_visible(visible);
        }
        self.director.update(dt);
    }

    /// Follow a surface resize.
    ///
    /// Cameras and targets change; the mix ratio, driver progress and
    /// resolution state do not.
    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        for host in &mut self.hosts {
            host.resize(gpu, width, height);
        }
    }

    /// Draw one frame to the surface.
    ///
    /// Returns `Ok(None)` when the surface had no frame to give and was
    /// reconfigured; the frame is skipped.
    pub fn render(&mut self, gpu: &GpuContext) -> Result<Option<FramePlan>> {
        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("surface {}; reconfiguring", err);
                gpu.reconfigure();
                return Ok(None);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface timeout; frame skipped");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Session Frame Encoder"),
        });

        let plan = {
            let mut sink = GpuFrame {
                hosts: &mut self.hosts,
                frame: HostFrame {
                    gpu,
                    encoder: &mut encoder,
                    screen: &view,
                    pipeline: &self.content_pipeline,
                    textures: &self.textures,
                },
                blend_pass: &self.blend_pass,
            };
            self.director.render(&mut sink)
        };

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        log::trace!("frame {:?} at mix {:.3}", plan, self.director.compositor().mix_ratio());
        Ok(Some(plan))
    }

    /// Poll assets, update, then render.
    pub fn frame(&mut self, gpu: &GpuContext, dt: f32) -> Result<Option<FramePlan>> {
        self.poll_assets(gpu);
        self.update(dt);
        self.render(gpu)
    }

    /// Ask for a registered mask. Mid transition the swap waits for the next
    /// boundary.
    pub fn request_mask(&mut self, mask: TextureId) -> Result<MaskSwap> {
        let Some(position) = self.masks.iter().position(|&m| m == mask) else {
            return Err(Error::UnknownMask(mask));
        };
        self.mask_cursor = position;
        Ok(self.director.compositor_mut().request_mask(mask))
    }

    /// Request the mask after the last requested one, wrapping around.
    pub fn next_mask(&mut self) -> MaskSwap {
        self.mask_cursor = next_index(self.mask_cursor, self.masks.len());
        let mask = self.masks[self.mask_cursor];
        self.director.compositor_mut().request_mask(mask)
    }

    /// Registered masks, in order.
    pub fn masks(&self) -> &[TextureId] {
        &self.masks
    }

    pub fn set_threshold(&mut self, threshold: f32) -> Result<()> {
        self.director.compositor_mut().set_threshold(threshold)
    }

    pub fn set_use_mask(&mut self, use_mask: bool) {
        self.director.compositor_mut().set_use_mask(use_mask);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.director.driver_mut().set_paused(paused);
    }

    /// Start a one-shot transition.
    pub fn trigger(&mut self) -> bool {
        self.director.trigger()
    }

    pub fn host(&self, side: Side) -> &SceneHost {
        &self.hosts[side.index()]
    }

    pub fn host_mut(&mut self, side: Side) -> &mut SceneHost {
        &mut self.hosts[side.index()]
    }

    pub fn director(&self) -> &Director {
        &self.director
    }

    pub fn textures(&self) -> &TextureBank {
        &self.textures
    }
}

fn load_mask(gpu: &GpuContext, source: MaskSource) -> Result<Texture> {
    match source {
        MaskSource::Image(image) => {
            let label = image.label();
            let pixels = image.decode()?;
            log::debug!("mask {} decoded ({}x{})", label, pixels.width(), pixels.height());
            Ok(Texture::mask_from_rgba(
                gpu,
                &pixels,
                pixels.width(),
                pixels.height(),
                &label,
            ))
        }
        MaskSource::Noise { size, cell, seed } => Ok(Texture::noise_mask(gpu, size.max(1), cell, seed)),
    }
}

fn next_index(current: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (current + 1) % len }
}

/// Executes a frame's draws against the GPU.
struct GpuFrame<'a> {
    hosts: &'a mut [SceneHost; 2],
    frame: HostFrame<'a>,
    blend_pass: &'a BlendPass,
}

impl FrameSink for GpuFrame<'_> {
    fn render_scene(&mut self, side: Side, destination: Destination) {
        self.hosts[side.index()].render(&mut self.frame, destination);
    }

    fn blend(&mut self, params: &BlendParams) {
        let Some(mask) = self.frame.textures.get(params.mask) else {
            log::warn!("blend skipped: mask {:?} not in bank", params.mask);
            return;
        };
        self.blend_pass.render(
            self.frame.gpu,
            self.frame.encoder,
            self.frame.screen,
            self.hosts[Side::A.index()].target(),
            self.hosts[Side::B.index()].target(),
            &mask.view,
            params,
        );
    }
}
