//! # Crossmask
//!
//! **Mask-driven transitions between two live scenes.**
//!
//! Two scene hosts each render their own camera and content into an
//! off-screen target. A transition compositor blends the two targets with a
//! greyscale mask: a single scalar, the mix ratio, sweeps a soft wipe edge
//! across the mask's red channel. At rest (mix ratio exactly 0 or 1) only the
//! visible scene renders, straight to the screen.
//!
//! ## Quick Start
//!
//! ```no_run
//! use crossmask::*;
//!
//! fn main() -> crossmask::Result<()> {
//!     let a = SceneConfig::new("city")
//!         .content(ContentSource::Image(ImageSource::File("city.jpg".into())));
//!     let b = SceneConfig::new("forest")
//!         .content(ContentSource::Image(ImageSource::File("forest.jpg".into())));
//!
//!     run(
//!         AppConfig::new().title("Wipe").size(1280, 720),
//!         SessionConfig::new(a, b)
//!             .mask(MaskSource::Image(ImageSource::File("clouds.png".into())))
//!             .threshold(0.1)
//!             .mode(DriverMode::Oscillating { period: 4.0 }),
//!     )
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`RenderTarget`]: an off-screen colour buffer, written then sampled.
//! - [`SceneHost`]: camera + content root + target.
//! - [`TransitionCompositor`]: decides per frame what renders and blends.
//! - [`TransitionDriver`]: moves the mix ratio over time.
//! - [`Session`]: owns all of the above for one window.

mod app;
mod assets;
mod camera;
mod ecs;
mod error;
mod gpu;
mod render_target;
pub mod scene;
mod session;
mod texture;

pub use app::{AppConfig, FrameHook, run, run_with_hook};
pub use assets::{AssetLoad, AssetPoll, ImageSource, TextureBank};
pub use camera::{Camera, Projection};
pub use ecs::{Quad, ShadowCaps, TextureId, Transform};
pub use error::{Error, Result};
pub use gpu::GpuContext;
pub use render_target::RenderTarget;
pub use scene::{
    BlendParams, ContentRoot, ContentSource, Destination, Director, DriverMode, Easing, FramePlan, FrameSink,
    MaskSwap, Phase, Route, SceneConfig, SceneHost, Side, TransitionCompositor, TransitionDriver,
};
pub use session::{MaskSource, Session, SessionConfig};
pub use texture::Texture;

// Re-export dependencies for advanced usage
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs;
pub use wgpu;
pub use winit;
