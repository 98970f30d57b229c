use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use nannou::prelude::*;
use tracing::{debug, error, info};

use neural_field::audio::{AudioFeatureExtractor, SourcePipe};
use neural_field::engine::{FrameLoop, ParticleEngine};
use neural_field::render::{
    Backdrop, DebugOverlay, EngineStats, NannouSurface, Notification, Resolution, SPECTRUM_BARS,
};
use neural_field::ui::{apply_to_engine, parse_key, Action};
use neural_field::utils::{logging, Config};
use neural_field::video::{ImageSequence, SpatialColorSampler};
use neural_field_api::Viewport;

#[derive(Parser, Debug)]
#[command(version, about = "Audio-reactive particle field over video")]
struct Args {
    /// Image sequence directory or single image used as the backdrop
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Run in a window instead of fullscreen
    #[arg(short, long)]
    windowed: bool,

    /// Override the configured particle count
    #[arg(short, long)]
    particles: Option<usize>,

    /// Config file (default: ~/.neural-field.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the audio device table and exit
    #[arg(long)]
    list_devices: bool,

    /// Start with the debug overlay visible
    #[arg(short, long)]
    debug: bool,
}

/// Everything resolved before the window opens
struct Startup {
    args: Args,
    config: Config,
    frames: Option<ImageSequence>,
}

/// nannou's model function only receives the `App`, so startup state is
/// handed over through here
static STARTUP: Mutex<Option<Startup>> = Mutex::new(None);

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(tracing::level_filters::LevelFilter::INFO);

    if args.list_devices {
        SourcePipe::list_devices();
        return Ok(());
    }

    let config = Config::load(args.config.as_deref());

    let frames = args
        .frames
        .as_deref()
        .map(|path| {
            ImageSequence::open(path, config.frames_fps())
                .with_context(|| format!("Failed to open frames at {:?}", path))
        })
        .transpose()?;
    if let Some(frames) = frames.as_ref() {
        info!("Loaded {} frames", frames.len());
    }

    *STARTUP
        .lock()
        .map_err(|_| anyhow::anyhow!("startup state poisoned"))? = Some(Startup {
        args,
        config,
        frames,
    });

    nannou::app(model).update(update).run();
    Ok(())
}

struct Model {
    extractor: AudioFeatureExtractor,
    /// `None` without `--frames`: particles keep their colors
    sampler: Option<SpatialColorSampler>,
    engine: ParticleEngine,
    frame_loop: FrameLoop,
    backdrop: Backdrop,
    debug: DebugOverlay,
    notification: Notification,
    paused: bool,
}

fn model(app: &App) -> Model {
    let Startup {
        args,
        config,
        frames,
    } = STARTUP
        .lock()
        .ok()
        .and_then(|mut startup| startup.take())
        .unwrap_or_else(|| Startup {
            args: Args::parse(),
            config: Config::default(),
            frames: None,
        });

    let resolution = Resolution::current(args.windowed);
    app.set_exit_on_escape(false);

    let mut win = app
        .new_window()
        .view(view)
        .key_pressed(key_pressed)
        .resized(resized)
        .size(resolution.width, resolution.height)
        .min_size(320, 240);

    if resolution.fullscreen {
        win = win.fullscreen();
    }

    match win.build() {
        Ok(id) => {
            if resolution.fullscreen {
                if let Some(window) = app.window(id) {
                    window.set_cursor_visible(false);
                }
            }
        }
        Err(e) => {
            error!("Failed to open window: {:?}", e);
            std::process::exit(1);
        }
    }

    let bounds = app.window_rect();
    info!(
        "Window size: {}x{} (requested: {}x{})",
        bounds.w(),
        bounds.h(),
        resolution.width,
        resolution.height
    );

    let pipe = SourcePipe::new(config.audio_device(), config.device_timeout());
    let mut extractor = AudioFeatureExtractor::new(Box::new(pipe), config.extractor());
    extractor.initialize();

    let mut engine_config = config.engine();
    if let Some(count) = args.particles {
        engine_config.particle_count = count;
    }
    let engine = ParticleEngine::new(engine_config, Viewport::new(bounds.w(), bounds.h()));

    let sampler =
        frames.map(|frames| SpatialColorSampler::new(Box::new(frames), config.sample_scale()));

    Model {
        extractor,
        sampler,
        engine,
        frame_loop: FrameLoop::new(),
        backdrop: Backdrop::new(),
        debug: DebugOverlay::new(args.debug),
        notification: Notification::new(),
        paused: false,
    }
}

fn update(app: &App, model: &mut Model, _update: Update) {
    if !model
        .frame_loop
        .tick(&mut model.extractor, &mut model.sampler, &mut model.engine)
    {
        return;
    }

    if let Some(sampler) = model.sampler.as_mut() {
        if let Err(e) = model.backdrop.refresh(app, sampler.source_mut()) {
            debug!("Backdrop not refreshed: {}", e);
        }
    }

    let spectrum = model.extractor.spectrum(SPECTRUM_BARS);
    model.debug.update(&model.frame_loop.last_music(), &spectrum);
    model.notification.tick();
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let bounds = app.window_rect();

    let mut surface = NannouSurface::new(&draw, bounds).with_backdrop(model.backdrop.texture());
    model
        .engine
        .draw(&mut surface, &model.frame_loop.last_music());

    let config = model.engine.config();
    let stats = EngineStats {
        particles: model.engine.particle_count(),
        edges: model.engine.graph().edges().len(),
        connection_distance: config.connection_distance,
        max_connections: config.max_connections,
        color_policy: config.color_policy.name(),
    };
    model.debug.draw(&draw, bounds, &stats);
    model.notification.draw(&draw, bounds);

    if let Err(e) = draw.to_frame(app, &frame) {
        error!("Failed to render frame: {:?}", e);
    }
}

fn resized(_app: &App, model: &mut Model, size: Vec2) {
    model.engine.resize(Viewport::new(size.x, size.y));
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    let Some(action) = parse_key(key) else {
        return;
    };

    match action {
        Action::Quit => {
            model.frame_loop.stop();
            model.extractor.shutdown();
            app.quit();
        }
        Action::TogglePause => {
            model.paused = !model.paused;
            if let Some(sampler) = model.sampler.as_mut() {
                let source = sampler.source_mut();
                if model.paused {
                    source.pause();
                } else {
                    source.play();
                }
            }
            // Resuming also wakes up audio capture
            if !model.paused {
                model.extractor.resume();
            }
            let status = if model.paused { "Paused" } else { "Playing" };
            model.notification.show(status);
        }
        Action::ToggleDebug => model.debug.toggle(),
        _ => {
            if let Some(msg) = apply_to_engine(action, &mut model.engine) {
                info!("{}", msg);
                model.notification.show(msg);
            }
        }
    }
}
