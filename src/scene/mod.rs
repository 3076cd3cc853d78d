//! Two scenes, one output: hosts, the transition compositor and its driver.
//!
//! # Overview
//!
//! Each [`SceneHost`] owns a camera, a content root and an off-screen
//! target. Per frame the [`Director`] advances the [`TransitionDriver`],
//! hands its value to the [`TransitionCompositor`] as the mix ratio, and the
//! compositor decides which hosts render and whether the mask blend runs.
//!
//! ```text
//! driver.tick(dt) -> mix ratio -> compositor -> 0..2 host renders -> 0..1 blend
//! ```
//!
//! # Example
//!
//! ```ignore
//! use crossmask::scene::*;
//!
//! let compositor = TransitionCompositor::new(mask, 0.1)?;
//! let mut director = Director::new(compositor, TransitionDriver::oscillating(4.0));
//!
//! director.update(dt);
//! director.render(&mut sink);
//! ```

mod blend;
mod blend_pass;
mod compositor;
mod content;
mod director;
mod driver;
mod host;

pub use blend::{BlendParams, blend_texel, mask_blend_factor, wipe_edge};
pub use blend_pass::BlendPass;
pub use compositor::{
    Destination, FramePlan, FrameSink, MaskSwap, Side, TransitionCompositor, check_threshold,
};
pub use content::{ContentRoot, NodeVisitor, ShadowCasting};
pub use director::Director;
pub use driver::{DriverMode, Easing, Phase, Route, TransitionDriver};
pub use host::{
    ContentPipeline, ContentSource, HostFrame, SceneConfig, SceneHost, cover_multiplier, cover_uv,
};
#[cfg(test)]
pub(crate) use host::follow_surface;
