use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::session::{Session, SessionConfig};

/// Configuration for the app window.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Crossmask".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Per-frame hook, called after assets are polled and before the session updates.
///
/// Receives the session and the frame's delta time in seconds.
pub type FrameHook = Box<dyn FnMut(&mut Session, f32)>;

/// Open a window and run a transition session in it until closed.
///
/// Keys: `Space` triggers a one-shot transition, `M` cycles masks, `P`
/// pauses, `C` toggles between the mask wipe and a plain crossfade.
///
/// # Example
/// ```ignore
/// crossmask::run(
///     AppConfig::new().title("Wipe").size(1280, 720),
///     SessionConfig::new(SceneConfig::new("a"), SceneConfig::new("b")),
/// )?;
/// ```
pub fn run(config: AppConfig, session: SessionConfig) -> Result<()> {
    run_with_hook(config, session, Box::new(|_, _| {}))
}

/// Like [`run`], with a hook that can move cameras or poke the session
/// every frame.
pub fn run_with_hook(config: AppConfig, session: SessionConfig, hook: FrameHook) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = CrossmaskApp::Pending {
        config,
        session: Some(session),
        hook: Some(hook),
    };

    event_loop.run_app(&mut app)?;

    match app {
        CrossmaskApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

enum CrossmaskApp {
    Pending {
        config: AppConfig,
        session: Option<SessionConfig>,
        hook: Option<FrameHook>,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        session: Session,
        hook: FrameHook,
        paused: bool,
        use_mask: bool,
        last_frame: Instant,
    },
    Failed(Error),
}

impl CrossmaskApp {
    fn start(event_loop: &ActiveEventLoop, config: &AppConfig, session: SessionConfig) -> Result<(Arc<Window>, GpuContext, Session)> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let session = Session::init(&gpu, session)?;
        Ok((window, gpu, session))
    }
}

impl ApplicationHandler for CrossmaskApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let CrossmaskApp::Pending { config, session, hook } = self else {
            return;
        };
        let (Some(session_config), Some(hook)) = (session.take(), hook.take()) else {
            return;
        };
        let use_mask = session_config.use_mask;

        *self = match Self::start(event_loop, config, session_config) {
            Ok((window, gpu, session)) => {
                window.request_redraw();
                CrossmaskApp::Running {
                    window,
                    gpu,
                    session,
                    hook,
                    paused: false,
                    use_mask,
                    last_frame: Instant::now(),
                }
            }
            Err(err) => {
                log::error!("startup failed: {}", err);
                event_loop.exit();
                CrossmaskApp::Failed(err)
            }
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let CrossmaskApp::Running {
            window,
            gpu,
            session,
            hook,
            paused,
            use_mask,
            last_frame,
        } = self
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
                session.resize(gpu, gpu.width(), gpu.height());
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Space => {
                    if !session.trigger() {
                        log::debug!("trigger ignored");
                    }
                }
                KeyCode::KeyM => {
                    log::info!("next mask: {:?}", session.next_mask());
                }
                KeyCode::KeyP => {
                    *paused = !*paused;
                    session.set_paused(*paused);
                }
                KeyCode::KeyC => {
                    *use_mask = !*use_mask;
                    session.set_use_mask(*use_mask);
                }
                KeyCode::Escape => event_loop.exit(),
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                session.poll_assets(gpu);
                hook(session, dt);
                session.update(dt);

                if let Err(err) = session.render(gpu) {
                    log::error!("render failed: {}", err);
                    *self = CrossmaskApp::Failed(err);
                    event_loop.exit();
                    return;
                }

                window.request_redraw();
            }
            _ => {}
        }
    }
}
