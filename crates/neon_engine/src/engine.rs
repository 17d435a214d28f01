//! Core engine implementation
//!
//! An [`Engine`] is one viewing session of the night city. The host owns the
//! window and the model loader; it hands the engine its backends, reports the
//! loaded scene through [`Engine::on_scene_loaded`] and calls
//! [`Engine::frame`] once per display refresh. Everything else (flicker
//! cycles, the fly-by fade and respawn) runs on the engine's timer queue.

use crate::audio::{AudioBackend, AudioBackendConfig, AudioError, SoundHandle};
use crate::config::{ConfigError, SceneConfig};
use crate::foundation::math::{Color, Vec3};
use crate::foundation::random::{rng_from_seed, RandomSource};
use crate::foundation::time::{Clock, FrameTimer};
use crate::fx::flicker::{schedule_flicker, FlickerHost};
use crate::fx::fly_by::{AudioChannel, FadeProgress, LoopAnimator, LoopEvent, LoopedActor};
use crate::render::{MaterialRef, RenderBackend};
use crate::scene::{
    ambient_light, bind_flicker_targets, find_actor, frame_scene, moon_light, place_point_lights, SceneGraph,
};
use crate::scheduler::{Scheduler, TaskControl, TimerQueue};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// State the timers act on
///
/// Timer tasks receive the stage, never the engine, so they can touch the
/// backends and the animator while the engine is busy running its queue.
struct Stage<R, A> {
    renderer: R,
    audio: A,
    random: Box<dyn RandomSource>,
    animator: Option<LoopAnimator>,
    radio: Option<SoundHandle>,
}

impl<R: RenderBackend, A: AudioBackend> Stage<R, A> {
    fn tick_animator(&mut self) -> Option<LoopEvent> {
        let animator = self.animator.as_mut()?;
        animator.tick(&mut self.renderer, &mut self.audio)
    }

    fn fade_tick(&mut self) -> TaskControl {
        let Some(animator) = self.animator.as_mut() else {
            return TaskControl::Stop;
        };
        match animator.fade_tick(&mut self.renderer, &mut self.audio) {
            FadeProgress::Fading => TaskControl::Continue,
            FadeProgress::Finished => TaskControl::Stop,
        }
    }

    fn respawn(&mut self) {
        if let Some(animator) = self.animator.as_mut() {
            animator.respawn(&mut self.renderer);
        }
    }
}

impl<R: RenderBackend, A> FlickerHost for Stage<R, A> {
    fn write_emissive(&mut self, material: MaterialRef, intensity: f32) {
        self.renderer.set_emissive_intensity(material, intensity);
    }

    fn random_unit(&mut self) -> f32 {
        self.random.next_unit()
    }
}

/// Main engine struct
///
/// Generic over the render and audio backends so tests can drive it with
/// the headless ones and inspect them afterwards.
pub struct Engine<R: RenderBackend + 'static, A: AudioBackend + 'static> {
    stage: Stage<R, A>,
    timers: TimerQueue<Stage<R, A>>,
    clock: Box<dyn Clock>,
    frame_timer: FrameTimer,
    config: SceneConfig,
    scene_bound: bool,
    radio_ready: bool,
}

impl<R: RenderBackend + 'static, A: AudioBackend + 'static> Engine<R, A> {
    /// Create a new engine instance
    ///
    /// The configuration is validated here. An audio backend that fails to
    /// initialize leaves the session silent instead of failing it.
    pub fn new(config: SceneConfig, renderer: R, mut audio: A, clock: Box<dyn Clock>) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate()?;

        if !audio.is_initialized() {
            if let Err(e) = audio.initialize(&AudioBackendConfig::default()) {
                log::warn!("Audio unavailable, continuing without sound: {}", e);
            }
        }

        let random = Box::new(rng_from_seed(config.seed));
        Ok(Self {
            stage: Stage {
                renderer,
                audio,
                random,
                animator: None,
                radio: None,
            },
            timers: TimerQueue::new(),
            clock,
            frame_timer: FrameTimer::new(),
            config,
            scene_bound: false,
            radio_ready: false,
        })
    }

    /// Replace the random source (before the scene is bound)
    #[must_use]
    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.stage.random = Box::new(random);
        self
    }

    /// Request the radio track
    ///
    /// The track plays once the backend reports it ready and the fly-by is
    /// flying. Requesting it again silences the previous track, so only one
    /// radio is ever audible. Callers usually log the error and carry on
    /// without sound.
    pub fn load_audio(&mut self) -> Result<SoundHandle, EngineError> {
        let path = self.config.fly_by.radio.path.clone();
        let radio = self.stage.audio.load_sound(Path::new(&path), true)?;
        log::info!("Radio track requested: {}", path);

        if let Some(previous) = self.stage.radio.replace(radio) {
            if let Err(e) = self.stage.audio.stop(previous) {
                log::warn!("Previous radio track failed to stop: {}", e);
            }
            let _ = self.stage.audio.set_volume(previous, 0.0);
            log::debug!("Previous radio track silenced");
        }
        self.radio_ready = false;
        if let Some(animator) = self.stage.animator.as_mut() {
            animator.attach_sound(radio);
        }
        Ok(radio)
    }

    /// Bind the effects to the loaded model
    ///
    /// Frames the model, sets up the night environment (background,
    /// ambient light, moon, mesh shadows), adds point lights, finds the
    /// fly-by actor and starts one flicker cycle per target. Missing nodes and materials
    /// leave their effect inert. A scene can only be bound once per session.
    pub fn on_scene_loaded(&mut self, graph: &SceneGraph) -> Result<(), EngineError> {
        if self.scene_bound {
            return Err(EngineError::InitializationFailed("scene already bound".to_string()));
        }

        // Schedule relative to the current session time
        self.timers.advance(self.clock.now(), &mut self.stage);

        let offset = match graph.bounds() {
            Some(bounds) => {
                let framing = frame_scene(&bounds, &self.config.camera);
                self.stage.renderer.set_scene_offset(framing.offset);
                self.stage.renderer.set_camera(framing.camera);
                framing.offset
            }
            None => {
                log::warn!("Scene has no geometry; camera left in place");
                Vec3::zeros()
            }
        };

        let environment = &self.config.environment;
        self.stage.renderer.set_background(Color::from_hex(environment.background));
        self.stage.renderer.set_ambient_light(ambient_light(&environment.ambient));
        if let Some(moon) = moon_light(&environment.moon) {
            self.stage.renderer.add_directional_light(moon);
        }
        for (node, _) in graph.meshes() {
            self.stage
                .renderer
                .set_mesh_shadows(node.object, environment.cast_shadows, environment.receive_shadows);
        }

        for light in place_point_lights(graph, &self.config.lights, offset) {
            self.stage.renderer.add_point_light(light);
        }

        let fly_by = &self.config.fly_by;
        self.stage.animator = find_actor(graph, &fly_by.actor).map(|node| {
            let actor = LoopedActor::new(node.object, node.position, fly_by);
            let animator = LoopAnimator::new(actor, AudioChannel::new(&fly_by.radio, self.stage.radio));
            animator.place(&mut self.stage.renderer);
            animator
        });

        let targets = bind_flicker_targets(graph, &self.config.flicker);
        log::info!("Scene bound: {} flicker target(s)", targets.len());
        for bound in targets {
            schedule_flicker(&mut self.timers, bound.target, bound.interval, bound.jitter);
        }

        self.scene_bound = true;
        Ok(())
    }

    /// The user interacted with the viewer; retry blocked playback
    pub fn on_user_gesture(&mut self) {
        self.stage.audio.grant_user_gesture();
        if let Some(animator) = self.stage.animator.as_mut() {
            animator.resume_audio();
        }
    }

    /// Run one display frame
    ///
    /// Fires due timers, advances the fly-by and renders. Render failures
    /// are logged and the session keeps going.
    pub fn frame(&mut self) {
        let now = self.clock.now();
        self.frame_timer.tick(now);
        self.timers.advance(now, &mut self.stage);

        self.stage.audio.update();
        self.note_radio_ready();

        if let Some(LoopEvent::PassEnded {
            fade_period,
            respawn_delay,
        }) = self.stage.tick_animator()
        {
            self.timers.every(
                fade_period,
                Box::new(|stage: &mut Stage<R, A>, _: &mut dyn Scheduler<Stage<R, A>>| stage.fade_tick()),
            );
            self.timers.after(
                respawn_delay,
                Box::new(|stage: &mut Stage<R, A>, _: &mut dyn Scheduler<Stage<R, A>>| stage.respawn()),
            );
        }

        if let Err(e) = self.stage.renderer.render() {
            log::warn!("Render failed: {}", e);
        }
    }

    fn note_radio_ready(&mut self) {
        if let Some(radio) = self.stage.radio {
            if !self.radio_ready && self.stage.audio.is_ready(radio) {
                self.radio_ready = true;
                log::info!("Radio track ready");
            }
        }
    }

    /// Session time of the last fired timers
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Timers waiting to fire
    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// The fly-by, if the scene has its actor
    pub fn animator(&self) -> Option<&LoopAnimator> {
        self.stage.animator.as_ref()
    }

    /// The radio track, once requested
    pub fn radio(&self) -> Option<SoundHandle> {
        self.stage.radio
    }

    /// Get the render backend
    pub fn renderer(&self) -> &R {
        &self.stage.renderer
    }

    /// Get mutable access to the render backend
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.stage.renderer
    }

    /// Get the audio backend
    pub fn audio(&self) -> &A {
        &self.stage.audio
    }

    /// Get mutable access to the audio backend
    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.stage.audio
    }

    /// Frame timing statistics
    pub fn frame_timer(&self) -> &FrameTimer {
        &self.frame_timer
    }

    /// Session configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Audio backend error
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Session setup failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
}
