//! Texture storage and background asset loading.
//!
//! Decoding happens off the frame loop: an [`AssetLoad`] runs its loader on a
//! worker thread and the frame loop polls it once per frame without ever
//! blocking. The result is delivered exactly once, after which the handle
//! reports itself as settled.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use crate::ecs::TextureId;
use crate::texture::Texture;

/// Owns every GPU texture in a session and hands out [`TextureId`]s.
#[derive(Default)]
pub struct TextureBank {
    textures: Vec<Texture>,
}

impl TextureBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a texture and return its handle.
    pub fn add(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0)
    }

    pub fn contains(&self, id: TextureId) -> bool {
        id.0 < self.textures.len()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Where a scene's or mask's image comes from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Decode a file from disk.
    File(PathBuf),
    /// Decode an in-memory encoded image (PNG, JPEG, ...).
    Bytes(Vec<u8>),
    /// Already decoded pixels.
    Rgba(image::RgbaImage),
}

impl ImageSource {
    pub fn label(&self) -> String {
        match self {
            ImageSource::File(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} encoded bytes>", bytes.len()),
            ImageSource::Rgba(img) => format!("<{}x{} pixels>", img.width(), img.height()),
        }
    }

    /// Decode the source into RGBA pixels. Blocking; call from a loader.
    pub fn decode(self) -> Result<image::RgbaImage, image::ImageError> {
        match self {
            ImageSource::File(path) => Ok(image::open(path)?.to_rgba8()),
            ImageSource::Bytes(bytes) => Ok(image::load_from_memory(&bytes)?.to_rgba8()),
            ImageSource::Rgba(img) => Ok(img),
        }
    }

    /// Start decoding on a worker thread.
    pub fn load(self) -> AssetLoad<image::RgbaImage> {
        let label = self.label();
        AssetLoad::spawn(label, move || self.decode())
    }
}

/// Outcome of polling an [`AssetLoad`].
#[derive(Debug)]
pub enum AssetPoll<T> {
    /// Still decoding.
    Pending,
    /// Decoded; delivered once.
    Ready(T),
    /// Decoding failed; delivered once.
    Failed(String),
    /// The outcome was already delivered by an earlier poll.
    Settled,
}

enum LoadState<T> {
    Loading(Receiver<Result<T, String>>),
    Immediate(Result<T, String>),
    Settled,
}

/// A value being produced on a worker thread.
pub struct AssetLoad<T> {
    label: String,
    state: LoadState<T>,
}

impl<T: Send + 'static> AssetLoad<T> {
    /// Run `loader` on a new thread.
    pub fn spawn<F, E>(label: impl Into<String>, loader: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        E: std::fmt::Display,
    {
        let label = label.into();
        let (tx, rx) = mpsc::channel();
        let thread_label = label.clone();

        std::thread::spawn(move || {
            log::debug!("decoding asset {}", thread_label);
            let result = loader().map_err(|e| e.to_string());
            // The receiver is gone if the session was dropped mid-load.
            let _ = tx.send(result);
        });

        Self {
            label,
            state: LoadState::Loading(rx),
        }
    }
}

impl<T> AssetLoad<T> {
    /// A load that is already complete.
    pub fn ready(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            state: LoadState::Immediate(Ok(value)),
        }
    }

    /// A load that already failed.
    pub fn failed(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: LoadState::Immediate(Err(reason.into())),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True until the outcome has been delivered.
    pub fn is_pending(&self) -> bool {
        !matches!(self.state, LoadState::Settled)
    }

    /// Check for completion without blocking.
    pub fn poll(&mut self) -> AssetPoll<T> {
        let outcome = match std::mem::replace(&mut self.state, LoadState::Settled) {
            LoadState::Settled => return AssetPoll::Settled,
            LoadState::Immediate(result) => result,
            LoadState::Loading(rx) => match rx.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => {
                    self.state = LoadState::Loading(rx);
                    return AssetPoll::Pending;
                }
                Err(TryRecvError::Disconnected) => Err("loader thread exited".to_string()),
            },
        };

        match outcome {
            Ok(value) => AssetPoll::Ready(value),
            Err(reason) => AssetPoll::Failed(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn poll_until_settled<T>(load: &mut AssetLoad<T>) -> AssetPoll<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match load.poll() {
                AssetPoll::Pending if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(1))
                }
                other => return other,
            }
        }
    }

    #[test]
    fn ready_value_is_delivered_once() {
        let mut load = AssetLoad::ready("value", 5);
        assert!(load.is_pending());
        assert!(matches!(load.poll(), AssetPoll::Ready(5)));
        assert!(matches!(load.poll(), AssetPoll::Settled));
        assert!(!load.is_pending());
    }

    #[test]
    fn spawned_loader_reports_value() {
        let mut load = AssetLoad::spawn("sum", || Ok::<_, String>(2 + 2));
        assert!(matches!(poll_until_settled(&mut load), AssetPoll::Ready(4)));
    }

    #[test]
    fn spawned_loader_reports_failure() {
        let mut load: AssetLoad<u32> = AssetLoad::spawn("broken", || Err("no such file"));
        match poll_until_settled(&mut load) {
            AssetPoll::Failed(reason) => assert_eq!(reason, "no such file"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn missing_image_file_fails_to_decode() {
        let mut load = ImageSource::File(PathBuf::from("/nonexistent/scene.png")).load();
        assert!(matches!(poll_until_settled(&mut load), AssetPoll::Failed(_)));
    }

    #[test]
    fn decoded_pixels_pass_through() {
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([1, 2, 3, 4]));
        let decoded = ImageSource::Rgba(img.clone()).decode().unwrap();
        assert_eq!(decoded, img);
    }
}
