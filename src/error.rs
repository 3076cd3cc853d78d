//! Crate-wide error type.

use crate::ecs::TextureId;

/// Shorthand result used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while setting up or driving a session.
///
/// Per-frame rendering never produces these for missing content: a scene
/// whose asset is absent simply renders a cleared target.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No adapter compatible with the window surface was found.
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to create a logical device.
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The window surface could not be created.
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// The surface could not hand out a frame and reconfiguring will not help.
    #[error("surface frame unavailable: {0}")]
    Frame(#[from] wgpu::SurfaceError),

    /// An image could not be decoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The wipe threshold must be finite and strictly positive.
    #[error("invalid mask threshold {0}: must be finite and > 0")]
    InvalidThreshold(f32),

    /// A mask handle that was never registered with the session.
    #[error("unknown mask texture {0:?}")]
    UnknownMask(TextureId),

    /// Window or event loop failure from winit.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Window creation failure from winit.
    #[error("window error: {0}")]
    Window(#[from] winit::error::OsError),
}
