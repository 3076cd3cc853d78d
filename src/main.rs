use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use glam::{Vec2, Vec3};

use crossmask::{
    AppConfig, Camera, ContentSource, DriverMode, Easing, ImageSource, MaskSource, SceneConfig, SessionConfig, Side,
};

/// Mask-driven wipe between two scenes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image shown by scene A (a gradient when omitted)
    #[arg(long = "scene-a", value_name = "FILE")]
    scene_a: Option<PathBuf>,

    /// Image shown by scene B (a gradient when omitted)
    #[arg(long = "scene-b", value_name = "FILE")]
    scene_b: Option<PathBuf>,

    /// Wipe mask image, read on its red channel (repeatable; noise when omitted)
    #[arg(short = 'm', long = "mask", value_name = "FILE")]
    masks: Vec<PathBuf>,

    /// How the transition is driven
    #[arg(long, value_enum, default_value_t = Mode::Oscillate)]
    mode: Mode,

    /// Seconds per leg when oscillating
    #[arg(long, default_value_t = 3.2)]
    period: f32,

    /// Seconds of the one-shot ramp
    #[arg(long, default_value_t = 2.0)]
    duration: f32,

    /// Easing of the one-shot ramp
    #[arg(long, value_enum, default_value_t = Curve::InOut)]
    easing: Curve,

    /// Softness of the wipe edge; must be > 0
    #[arg(short = 't', long, default_value_t = 0.1)]
    threshold: f32,

    /// Plain crossfade instead of the mask wipe
    #[arg(long = "no-mask")]
    no_mask: bool,

    /// One-shot: pan scene A's camera at this speed (units/s) until the
    /// subject at the origin leaves the view
    #[arg(long, value_name = "SPEED")]
    drift: Option<f32>,

    /// Window size
    #[arg(long, value_names = ["W", "H"], num_args = 2, default_values_t = [1280, 720])]
    size: Vec<u32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Oscillate,
    OneShot,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Curve {
    Linear,
    In,
    Out,
    InOut,
}

impl From<Curve> for Easing {
    fn from(curve: Curve) -> Self {
        match curve {
            Curve::Linear => Easing::Linear,
            Curve::In => Easing::EaseIn,
            Curve::Out => Easing::EaseOut,
            Curve::InOut => Easing::EaseInOut,
        }
    }
}

const CAMERA_DISTANCE: f32 = 1000.0;
const FOV_DEGREES: f32 = 45.0;

fn scene(name: &str, image: Option<PathBuf>, fallback: ([u8; 3], [u8; 3]), aspect: f32) -> SceneConfig {
    let content = match image {
        Some(path) => ContentSource::Image(ImageSource::File(path)),
        None => ContentSource::Gradient {
            top: fallback.0,
            bottom: fallback.1,
        },
    };

    // Backdrop sized to exactly fill the view at the camera distance
    let height = 2.0 * CAMERA_DISTANCE * (FOV_DEGREES.to_radians() * 0.5).tan();

    SceneConfig::new(name)
        .camera(
            Camera::new()
                .at([0.0, 0.0, CAMERA_DISTANCE])
                .looking_at([0.0, 0.0, 0.0])
                .with_fov(FOV_DEGREES),
        )
        .content(content)
        .quad(Vec2::new(height * aspect, height), Default::default())
}

fn main() -> crossmask::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let (width, height) = match args.size[..] {
        [w, h] => (w.max(1), h.max(1)),
        _ => (1280, 720),
    };
    let aspect = width as f32 / height as f32;

    let mode = match args.mode {
        Mode::Oscillate => DriverMode::Oscillating { period: args.period },
        Mode::OneShot => DriverMode::OneShot {
            duration: args.duration,
            easing: args.easing.into(),
        },
    };

    let mut config = SessionConfig::new(
        scene("scene-a", args.scene_a, ([20, 40, 90], [200, 120, 60]), aspect),
        scene("scene-b", args.scene_b, ([10, 80, 40], [230, 230, 200]), aspect),
    )
    .threshold(args.threshold)
    .use_mask(!args.no_mask)
    .mode(mode);

    for path in args.masks {
        config = config.mask(MaskSource::Image(ImageSource::File(path)));
    }

    let app = AppConfig::new().title("Crossmask").size(width, height);

    match (args.mode, args.drift) {
        (Mode::OneShot, Some(speed)) => {
            config = config.subject(Vec3::ZERO);
            crossmask::run_with_hook(
                app,
                config,
                Box::new(move |session, dt| {
                    let camera = &mut session.host_mut(Side::A).camera;
                    if !panned_far_enough(camera) {
                        camera.position.x += speed * dt;
                    }
                }),
            )
        }
        _ => crossmask::run(app, config),
    }
}

/// Stop panning once the camera is well clear of the subject.
fn panned_far_enough(camera: &Camera) -> bool {
    camera.position.x.abs() > CAMERA_DISTANCE * 4.0
}
