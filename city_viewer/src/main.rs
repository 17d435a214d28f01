//! Night city demo
//!
//! Builds a small stand-in for the city model, binds the neon and fly-by
//! effects to it and runs a fixed-rate frame loop against the headless
//! renderer. With the `audio` feature the radio plays through rodio.
//!
//! ```text
//! city_viewer [scene.toml|scene.ron] [seconds]
//! ```

use neon_engine::audio::AudioBackend;
use neon_engine::config::{Config, ConfigError, SceneConfig};
use neon_engine::foundation::logging;
use neon_engine::foundation::math::Vec3;
use neon_engine::foundation::time::SystemClock;
use neon_engine::render::HeadlessRenderer;
use neon_engine::scene::SceneGraph;
use neon_engine::{Engine, EngineError};
use std::time::{Duration, Instant};
use thiserror::Error;

const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);
const DEFAULT_RUN_SECONDS: u64 = 30;

#[derive(Error, Debug)]
enum ViewerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

struct Options {
    config: SceneConfig,
    run_for: Duration,
}

fn parse_args() -> Result<Options, ViewerError> {
    let mut config = SceneConfig::default();
    let mut run_for = Duration::from_secs(DEFAULT_RUN_SECONDS);

    for arg in std::env::args().skip(1) {
        if let Ok(seconds) = arg.parse::<u64>() {
            run_for = Duration::from_secs(seconds);
        } else if arg.ends_with(".toml") || arg.ends_with(".ron") {
            log::info!("Loading scene config from {}", arg);
            config = SceneConfig::load_from_file(&arg)?;
        } else {
            return Err(ViewerError::InvalidArgument(arg));
        }
    }

    Ok(Options { config, run_for })
}

/// Stand-in for the city model: three signs, a row of street lamps, the
/// car and some buildings
fn build_demo_city() -> SceneGraph {
    let mut graph = SceneGraph::new();
    let sign = Vec3::new(1.5, 0.6, 0.1);
    let lamp = Vec3::new(0.2, 0.2, 0.2);

    graph.add_mesh("ground", Vec3::new(0.0, -0.1, 0.0), "Asphalt", Vec3::new(60.0, 0.1, 60.0));
    graph.add_mesh("building_chin_chen", Vec3::new(-18.0, 8.0, -12.0), "Brick", Vec3::new(6.0, 8.0, 6.0));
    graph.add_mesh("building_bar", Vec3::new(16.0, 5.0, -10.0), "Brick", Vec3::new(5.0, 5.0, 5.0));
    graph.add_mesh("building_hotel", Vec3::new(0.0, 14.0, -25.0), "Concrete", Vec3::new(8.0, 14.0, 6.0));

    graph.add_mesh("sign_chin_chen", Vec3::new(-18.0, 10.0, -5.9), "ChinChenNeon", sign);
    graph.add_mesh("sign_bar", Vec3::new(16.0, 6.0, -4.9), "BarNeon", sign);
    graph.add_mesh("sign_hotel", Vec3::new(0.0, 24.0, -18.9), "HotelNeon", sign);

    for i in 0..6u8 {
        let z = -30.0 + 12.0 * f32::from(i);
        let material = if i % 2 == 0 { "neon_lamp" } else { "neon_lamp.001" };
        graph.add_mesh(format!("street_lamp_{i}"), Vec3::new(-6.0, 5.0, z), material, lamp);
    }
    graph.add_mesh("porch_lamp", Vec3::new(16.0, 3.0, -4.8), "lamp_neon", lamp);

    graph.add_node("delorean_fly", Vec3::new(0.0, 12.0, 0.0));
    graph
}

fn run<A: AudioBackend + 'static>(options: Options, audio: A) -> Result<(), ViewerError> {
    let graph = build_demo_city();
    let renderer = HeadlessRenderer::from_scene(&graph);
    let mut engine = Engine::new(options.config, renderer, audio, Box::new(SystemClock::new()))?;

    if let Err(e) = engine.load_audio() {
        log::warn!("Radio unavailable: {}", e);
    }
    engine.on_scene_loaded(&graph)?;
    // Launching the viewer is the user's gesture
    engine.on_user_gesture();

    let started = Instant::now();
    let mut next_report = Duration::from_secs(1);
    while started.elapsed() < options.run_for {
        let frame_start = Instant::now();
        engine.frame();

        if started.elapsed() >= next_report {
            next_report += Duration::from_secs(1);
            let timer = engine.frame_timer();
            match engine.animator() {
                Some(animator) => log::info!(
                    "{} frames, {:.1} fps | fly-by {:?} at {:.1}, volume {:.2} | {} timers",
                    timer.frame_count(),
                    timer.average_fps(),
                    animator.state(),
                    animator.position(),
                    animator.volume(),
                    engine.pending_timers()
                ),
                None => log::info!(
                    "{} frames, {:.1} fps | {} timers",
                    timer.frame_count(),
                    timer.average_fps(),
                    engine.pending_timers()
                ),
            }
        }

        if let Some(rest) = FRAME_INTERVAL.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    log::info!(
        "Session finished: {} frames rendered, {} emissive writes",
        engine.renderer().frame_count(),
        engine.renderer().emissive_writes()
    );
    Ok(())
}

#[cfg(feature = "audio")]
fn audio_backend() -> Box<dyn AudioBackend> {
    use neon_engine::audio::backend::{create_backend, AudioBackendConfig};

    match create_backend(&AudioBackendConfig::default()) {
        Ok(backend) => backend,
        Err(e) => {
            log::warn!("Falling back to silent audio: {}", e);
            Box::new(neon_engine::audio::HeadlessAudio::new())
        }
    }
}

#[cfg(not(feature = "audio"))]
fn audio_backend() -> Box<dyn AudioBackend> {
    Box::new(neon_engine::audio::HeadlessAudio::new())
}

fn main() {
    logging::init_with_level(log::LevelFilter::Info);
    log::info!("Starting night city viewer");

    let result = parse_args().and_then(|options| run(options, audio_backend()));
    if let Err(e) = result {
        log::error!("Viewer error: {}", e);
        std::process::exit(1);
    }
}
