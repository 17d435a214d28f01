//! # Neon Engine
//!
//! Scene effects for a night city viewer, written against abstract render
//! and audio backends.
//!
//! ## Features
//!
//! - **Neon flicker**: signs and street lamps black out and stutter at random
//! - **Fly-by loop**: an actor crosses the city with a radio that fades in
//!   and out, then respawns after a delay
//! - **Scene binding**: camera framing and point lights at emissive meshes
//! - **Virtual-time scheduling**: every timer runs on an injectable clock
//! - **Headless backends**: in-memory renderer and audio for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neon_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut graph = SceneGraph::new();
//!     graph.add_mesh("bar_sign", Vec3::new(4.0, 3.0, 0.0), "BarNeon", Vec3::repeat(0.5));
//!     graph.add_node("delorean_fly", Vec3::new(0.0, 6.0, 0.0));
//!
//!     let renderer = HeadlessRenderer::from_scene(&graph);
//!     let mut engine = Engine::new(
//!         SceneConfig::default(),
//!         renderer,
//!         HeadlessAudio::new(),
//!         Box::new(SystemClock::new()),
//!     )?;
//!     engine.on_scene_loaded(&graph)?;
//!
//!     loop {
//!         engine.frame();
//!         std::thread::sleep(std::time::Duration::from_millis(16));
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod scheduler;
pub mod render;
pub mod audio;
pub mod scene;
pub mod fx;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Engine, EngineError,
        audio::{AudioBackend, AudioError, HeadlessAudio, SoundHandle},
        config::{Config, ConfigError, SceneConfig},
        foundation::{
            math::{Axis, Color, Vec3},
            time::{Clock, ManualClock, SystemClock},
        },
        fx::{FlickerProfile, LoopState},
        render::{HeadlessRenderer, RenderBackend},
        scene::SceneGraph,
        scheduler::{Scheduler, TimerQueue},
    };
}
