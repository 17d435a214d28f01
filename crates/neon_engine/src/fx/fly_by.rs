//! Looping fly-by with a radio that fades in and out
//!
//! One actor travels along an axis from `start` to `end`, one step per
//! render tick. While it flies, its radio starts as soon as the track is
//! ready and its volume ramps up to a ceiling. At the end boundary the actor
//! disappears and the radio fades out on a separate ticker; after the
//! respawn delay everything starts over.
//!
//! ```text
//!            position >= end            volume <= floor
//!  Flying ──────────────────► FadingOut ───────────────► Waiting
//!    ▲                                                     │
//!    └──────────────────────── respawn ────────────────────┘
//! ```
//!
//! The animator owns no timers. [`LoopAnimator::tick`] reports the end of a
//! pass and whoever drives it schedules [`LoopAnimator::fade_tick`] and
//! [`LoopAnimator::respawn`]. A respawn arriving before the fade finished is
//! held and applied when it does.

use crate::audio::{AudioBackend, AudioError, SoundHandle};
use crate::config::{FlyByConfig, RadioConfig};
use crate::foundation::math::{Axis, Vec3};
use crate::render::{ObjectBackend, ObjectRef};
use std::time::Duration;

/// Volumes closer than this are treated as equal
const VOLUME_EPSILON: f32 = 1e-4;

/// Where the fly-by is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Moving towards the end boundary
    Flying,
    /// Hidden, radio fading out
    FadingOut,
    /// Hidden and silent until respawn
    Waiting,
}

/// Reported by [`LoopAnimator::tick`] when the actor reaches the end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// The pass is over; the fade and the respawn need scheduling
    PassEnded {
        /// Period of the fade ticker
        fade_period: Duration,
        /// Delay before the next pass
        respawn_delay: Duration,
    },
}

/// Result of one fade step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeProgress {
    /// Keep ticking
    Fading,
    /// Radio stopped; cancel the ticker
    Finished,
}

/// The moving node
#[derive(Debug, Clone)]
pub struct LoopedActor {
    object: ObjectRef,
    axis: Axis,
    origin: Vec3,
    position: f32,
    visible: bool,
    speed: f32,
    start: f32,
    end: f32,
    respawn_delay: Duration,
}

impl LoopedActor {
    /// Actor for `object`, placed at the start boundary
    ///
    /// `origin` supplies the two coordinates the loop does not move.
    pub fn new(object: ObjectRef, origin: Vec3, config: &FlyByConfig) -> Self {
        Self {
            object,
            axis: config.axis,
            origin,
            position: config.start,
            visible: true,
            speed: config.speed,
            start: config.start,
            end: config.end,
            respawn_delay: Duration::from_millis(config.respawn_delay_ms),
        }
    }

    fn write(&self, objects: &mut dyn ObjectBackend) {
        objects.set_position(self.object, self.axis.with_component(self.origin, self.position));
        objects.set_visible(self.object, self.visible);
    }
}

/// The radio playing while the actor flies
#[derive(Debug, Clone)]
pub struct AudioChannel {
    sound: Option<SoundHandle>,
    volume: f32,
    fading_out: bool,
    playback_rate: f32,
    ceiling: f32,
    ramp_step: f32,
    fade_step: f32,
    fade_floor: f32,
    fade_period: Duration,
    reference_speed: Option<f32>,
    play_blocked: bool,
}

impl AudioChannel {
    /// Silent channel; the track may be attached later
    pub fn new(config: &RadioConfig, sound: Option<SoundHandle>) -> Self {
        Self {
            sound,
            volume: 0.0,
            fading_out: false,
            playback_rate: 1.0,
            ceiling: config.ceiling,
            ramp_step: config.ramp_step,
            fade_step: config.fade_step,
            fade_floor: config.fade_floor,
            fade_period: Duration::from_millis(config.fade_period_ms),
            reference_speed: config.reference_speed,
            play_blocked: false,
        }
    }

    fn ensure_playing(&mut self, audio: &mut dyn AudioBackend) {
        let Some(sound) = self.sound else { return };
        if self.play_blocked || !audio.is_ready(sound) || audio.is_playing(sound) {
            return;
        }

        match audio.play(sound) {
            Ok(()) => {
                let _ = audio.set_volume(sound, self.volume);
                log::debug!("Radio started at volume {:.2}", self.volume);
            }
            Err(AudioError::AutoplayRejected) => {
                log::warn!("Radio autoplay rejected; waiting for a user gesture");
                self.play_blocked = true;
            }
            Err(AudioError::NotReady) => {}
            Err(e) => {
                log::warn!("Radio failed to start: {}", e);
                self.play_blocked = true;
            }
        }
    }

    fn sync_rate(&mut self, audio: &mut dyn AudioBackend, speed: f32) {
        let (Some(sound), Some(reference)) = (self.sound, self.reference_speed) else {
            return;
        };
        let rate = speed / reference;
        if (rate - self.playback_rate).abs() > f32::EPSILON {
            self.playback_rate = rate;
            let _ = audio.set_playback_rate(sound, rate);
        }
    }

    fn ramp_up(&mut self, audio: &mut dyn AudioBackend) {
        if self.fading_out || self.volume >= self.ceiling - VOLUME_EPSILON {
            return;
        }
        let next = self.volume + self.ramp_step;
        self.volume = if next >= self.ceiling - VOLUME_EPSILON { self.ceiling } else { next };
        if let Some(sound) = self.sound {
            let _ = audio.set_volume(sound, self.volume);
        }
    }

    /// One fade step; true once the floor is reached and playback stopped
    fn fade_down(&mut self, audio: &mut dyn AudioBackend) -> bool {
        if self.volume > self.fade_floor + VOLUME_EPSILON {
            self.volume = (self.volume - self.fade_step).max(0.0);
            if let Some(sound) = self.sound {
                let _ = audio.set_volume(sound, self.volume);
            }
            return false;
        }

        self.volume = 0.0;
        self.fading_out = false;
        if let Some(sound) = self.sound {
            if let Err(e) = audio.stop(sound) {
                log::warn!("Radio failed to stop: {}", e);
            }
            let _ = audio.set_volume(sound, 0.0);
        }
        true
    }
}

/// Drives one [`LoopedActor`] and its [`AudioChannel`] through the loop
#[derive(Debug, Clone)]
pub struct LoopAnimator {
    actor: LoopedActor,
    radio: AudioChannel,
    state: LoopState,
    respawn_pending: bool,
    passes: u64,
}

impl LoopAnimator {
    /// Animator in `Flying` at the start boundary, radio silent
    pub fn new(actor: LoopedActor, radio: AudioChannel) -> Self {
        Self {
            actor,
            radio,
            state: LoopState::Flying,
            respawn_pending: false,
            passes: 0,
        }
    }

    /// Write the initial position and visibility
    pub fn place(&self, objects: &mut dyn ObjectBackend) {
        self.actor.write(objects);
    }

    /// Attach the radio track once it has been requested
    pub fn attach_sound(&mut self, sound: SoundHandle) {
        self.radio.sound = Some(sound);
    }

    /// Allow play attempts again after autoplay was rejected
    pub fn resume_audio(&mut self) {
        if self.radio.play_blocked {
            log::debug!("Radio playback unblocked");
        }
        self.radio.play_blocked = false;
    }

    /// Advance one render tick
    ///
    /// Only does anything while `Flying`. Returns the end-of-pass event on
    /// the tick that crosses the end boundary.
    pub fn tick(&mut self, objects: &mut dyn ObjectBackend, audio: &mut dyn AudioBackend) -> Option<LoopEvent> {
        if self.state != LoopState::Flying {
            return None;
        }

        self.actor.position += self.actor.speed;
        objects.set_position(
            self.actor.object,
            self.actor.axis.with_component(self.actor.origin, self.actor.position),
        );

        self.radio.ensure_playing(audio);
        self.radio.sync_rate(audio, self.actor.speed);
        self.radio.ramp_up(audio);

        if self.actor.position < self.actor.end {
            return None;
        }

        self.actor.visible = false;
        objects.set_visible(self.actor.object, false);
        self.radio.fading_out = true;
        self.state = LoopState::FadingOut;
        self.passes += 1;
        log::debug!("Fly-by pass {} ended at {:.1}, fading out", self.passes, self.actor.position);

        Some(LoopEvent::PassEnded {
            fade_period: self.radio.fade_period,
            respawn_delay: self.actor.respawn_delay,
        })
    }

    /// One step of the fade ticker
    ///
    /// Returns `Finished` when the radio reached the floor (and on a stale
    /// ticker outside `FadingOut`), after which the ticker must stop.
    pub fn fade_tick(&mut self, objects: &mut dyn ObjectBackend, audio: &mut dyn AudioBackend) -> FadeProgress {
        if self.state != LoopState::FadingOut {
            return FadeProgress::Finished;
        }
        if !self.radio.fade_down(audio) {
            return FadeProgress::Fading;
        }

        self.state = LoopState::Waiting;
        log::debug!("Fly-by radio faded out, waiting");
        if std::mem::take(&mut self.respawn_pending) {
            self.respawn(objects);
        }
        FadeProgress::Finished
    }

    /// Start the next pass
    ///
    /// From `Waiting` the actor is reset to the start boundary and shown.
    /// During `FadingOut` the respawn is held until the fade finishes.
    /// Returns whether the actor respawned now.
    pub fn respawn(&mut self, objects: &mut dyn ObjectBackend) -> bool {
        match self.state {
            LoopState::Waiting => {
                self.actor.position = self.actor.start;
                self.actor.visible = true;
                self.actor.write(objects);
                self.state = LoopState::Flying;
                log::info!("Fly-by respawned at {:.1}", self.actor.start);
                true
            }
            LoopState::FadingOut => {
                log::debug!("Respawn held until the fade finishes");
                self.respawn_pending = true;
                false
            }
            LoopState::Flying => false,
        }
    }

    /// Current loop state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Actor coordinate along the loop axis
    pub fn position(&self) -> f32 {
        self.actor.position
    }

    /// Whether the actor is shown
    pub fn is_visible(&self) -> bool {
        self.actor.visible
    }

    /// Radio volume as last written
    pub fn volume(&self) -> f32 {
        self.radio.volume
    }

    /// Completed passes
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioBackendConfig, HeadlessAudio};
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::path::Path;

    #[derive(Default)]
    struct TestObjects {
        positions: HashMap<ObjectRef, Vec3>,
        visible: HashMap<ObjectRef, bool>,
    }

    impl ObjectBackend for TestObjects {
        fn position(&self, object: ObjectRef) -> Option<Vec3> {
            self.positions.get(&object).copied()
        }

        fn set_position(&mut self, object: ObjectRef, position: Vec3) {
            self.positions.insert(object, position);
        }

        fn set_visible(&mut self, object: ObjectRef, visible: bool) {
            self.visible.insert(object, visible);
        }
    }

    const CAR: ObjectRef = ObjectRef(7);

    fn fly_by(ceiling: f32) -> FlyByConfig {
        let mut config = FlyByConfig::default();
        config.radio.ceiling = ceiling;
        config
    }

    fn setup(config: &FlyByConfig, audio: HeadlessAudio) -> (LoopAnimator, TestObjects, HeadlessAudio, SoundHandle) {
        let mut audio = audio;
        audio.initialize(&AudioBackendConfig::default()).unwrap();
        let radio = audio.load_sound(Path::new(&config.radio.path), true).unwrap();

        let actor = LoopedActor::new(CAR, Vec3::new(2.0, 0.5, 0.0), config);
        let animator = LoopAnimator::new(actor, AudioChannel::new(&config.radio, Some(radio)));
        let mut objects = TestObjects::default();
        animator.place(&mut objects);
        (animator, objects, audio, radio)
    }

    #[test]
    fn test_reaches_end_after_eighty_ticks() {
        let config = fly_by(0.1);
        let (mut animator, mut objects, mut audio, _) = setup(&config, HeadlessAudio::new());

        for tick in 1..80 {
            assert_eq!(animator.tick(&mut objects, &mut audio), None, "tick {tick}");
            assert_eq!(animator.state(), LoopState::Flying);
        }

        let event = animator.tick(&mut objects, &mut audio);
        assert_eq!(
            event,
            Some(LoopEvent::PassEnded {
                fade_period: Duration::from_millis(100),
                respawn_delay: Duration::from_millis(8000),
            })
        );
        assert_eq!(animator.state(), LoopState::FadingOut);
        assert_eq!(objects.visible.get(&CAR), Some(&false));
        assert_eq!(objects.position(CAR), Some(Vec3::new(2.0, 0.5, 40.0)));
    }

    #[test]
    fn test_position_non_decreasing_while_flying() {
        let config = fly_by(0.1);
        let (mut animator, mut objects, mut audio, _) = setup(&config, HeadlessAudio::new());

        let mut last = animator.position();
        while animator.state() == LoopState::Flying {
            animator.tick(&mut objects, &mut audio);
            assert!(animator.position() >= last);
            last = animator.position();
        }
    }

    #[test]
    fn test_volume_ramps_to_ceiling_in_forty_ticks() {
        let config = fly_by(0.4);
        let (mut animator, mut objects, mut audio, radio) = setup(&config, HeadlessAudio::new());

        for _ in 0..39 {
            animator.tick(&mut objects, &mut audio);
        }
        assert!(animator.volume() < 0.4);

        animator.tick(&mut objects, &mut audio);
        assert_eq!(animator.volume(), 0.4);
        assert_eq!(audio.get_volume(radio), Ok(0.4));

        for _ in 0..20 {
            animator.tick(&mut objects, &mut audio);
            assert_eq!(animator.volume(), 0.4);
        }
        assert!(audio.is_playing(radio));
        assert_eq!(audio.play_count(radio), 1);
    }

    #[test]
    fn test_fade_from_ceiling() {
        let config = fly_by(0.4);
        let (mut animator, mut objects, mut audio, radio) = setup(&config, HeadlessAudio::new());
        while animator.state() == LoopState::Flying {
            animator.tick(&mut objects, &mut audio);
        }
        assert_eq!(animator.volume(), 0.4);

        let mut last = animator.volume();
        for _ in 0..39 {
            assert_eq!(animator.fade_tick(&mut objects, &mut audio), FadeProgress::Fading);
            assert!(animator.volume() <= last);
            last = animator.volume();
        }
        assert_relative_eq!(animator.volume(), 0.01, epsilon = 1e-4);
        assert_eq!(animator.state(), LoopState::FadingOut);

        assert_eq!(animator.fade_tick(&mut objects, &mut audio), FadeProgress::Finished);
        assert_eq!(animator.state(), LoopState::Waiting);
        assert_eq!(animator.volume(), 0.0);
        assert!(!audio.is_playing(radio));
        assert_eq!(audio.get_volume(radio), Ok(0.0));
    }

    #[test]
    fn test_volume_stays_within_bounds_for_uneven_steps() {
        // ceiling, ramp step, fade step, fade floor
        let cases = [
            (0.105, 0.01, 0.01, 0.01),
            (0.015, 0.01, 0.02, 0.01),
            (0.4, 0.03, 0.07, 0.01),
            (0.5, 0.07, 0.3, 0.0),
            (1.0, 0.3, 0.25, 0.05),
        ];

        for (ceiling, ramp_step, fade_step, fade_floor) in cases {
            let mut config = fly_by(ceiling);
            config.radio.ramp_step = ramp_step;
            config.radio.fade_step = fade_step;
            config.radio.fade_floor = fade_floor;
            let (mut animator, mut objects, mut audio, radio) = setup(&config, HeadlessAudio::new());

            while animator.state() == LoopState::Flying {
                animator.tick(&mut objects, &mut audio);
                let volume = animator.volume();
                assert!((0.0..=ceiling).contains(&volume), "ceiling {ceiling}: ramped to {volume}");
                assert_eq!(audio.get_volume(radio), Ok(volume));
            }
            assert_eq!(animator.volume(), ceiling, "ceiling {ceiling} not reached exactly");

            let mut last = animator.volume();
            for _ in 0..1000 {
                let progress = animator.fade_tick(&mut objects, &mut audio);
                let volume = animator.volume();
                assert!((0.0..=last).contains(&volume), "ceiling {ceiling}: faded to {volume}");
                last = volume;
                if progress == FadeProgress::Finished {
                    break;
                }
            }
            assert_eq!(animator.state(), LoopState::Waiting, "ceiling {ceiling}");
            assert_eq!(animator.volume(), 0.0);
            assert_eq!(audio.get_volume(radio), Ok(0.0));
        }
    }

    #[test]
    fn test_respawn_resets_to_start() {
        let config = fly_by(0.1);
        let (mut animator, mut objects, mut audio, radio) = setup(&config, HeadlessAudio::new());
        while animator.state() == LoopState::Flying {
            animator.tick(&mut objects, &mut audio);
        }
        while animator.fade_tick(&mut objects, &mut audio) == FadeProgress::Fading {}

        // Waiting ignores render ticks
        assert_eq!(animator.tick(&mut objects, &mut audio), None);
        assert_eq!(animator.position(), 40.0);

        assert!(animator.respawn(&mut objects));
        assert_eq!(animator.state(), LoopState::Flying);
        assert_eq!(animator.position(), -40.0);
        assert!(animator.is_visible());
        assert_eq!(objects.visible.get(&CAR), Some(&true));
        assert_eq!(objects.position(CAR), Some(Vec3::new(2.0, 0.5, -40.0)));

        animator.tick(&mut objects, &mut audio);
        assert_eq!(audio.play_count(radio), 2);
        assert_relative_eq!(animator.volume(), 0.01, epsilon = 1e-6);
    }

    #[test]
    fn test_respawn_during_fade_is_held() {
        let config = fly_by(0.4);
        let (mut animator, mut objects, mut audio, _) = setup(&config, HeadlessAudio::new());
        while animator.state() == LoopState::Flying {
            animator.tick(&mut objects, &mut audio);
        }

        assert!(!animator.respawn(&mut objects));
        assert_eq!(animator.state(), LoopState::FadingOut);
        assert!(!animator.is_visible());

        while animator.fade_tick(&mut objects, &mut audio) == FadeProgress::Fading {}
        assert_eq!(animator.state(), LoopState::Flying);
        assert_eq!(animator.position(), -40.0);
        assert_eq!(animator.volume(), 0.0);
    }

    #[test]
    fn test_respawn_ignored_while_flying() {
        let config = fly_by(0.1);
        let (mut animator, mut objects, mut audio, _) = setup(&config, HeadlessAudio::new());
        animator.tick(&mut objects, &mut audio);

        assert!(!animator.respawn(&mut objects));
        assert_eq!(animator.position(), -39.0);
    }

    #[test]
    fn test_stale_fade_ticker_finishes() {
        let config = fly_by(0.1);
        let (mut animator, mut objects, mut audio, _) = setup(&config, HeadlessAudio::new());
        assert_eq!(animator.fade_tick(&mut objects, &mut audio), FadeProgress::Finished);
        assert_eq!(animator.state(), LoopState::Flying);
    }

    #[test]
    fn test_not_ready_audio_skips_play() {
        let config = fly_by(0.1);
        let (mut animator, mut objects, mut audio, radio) =
            setup(&config, HeadlessAudio::new().with_deferred_loading());

        for _ in 0..5 {
            animator.tick(&mut objects, &mut audio);
        }
        assert!(!audio.is_playing(radio));
        assert_eq!(audio.play_count(radio), 0);

        audio.mark_ready(radio);
        animator.tick(&mut objects, &mut audio);
        assert!(audio.is_playing(radio));
        // Volume keeps ramping while the track loads
        assert_relative_eq!(audio.get_volume(radio).unwrap(), 0.06, epsilon = 1e-5);
    }

    #[test]
    fn test_autoplay_rejection_waits_for_gesture() {
        let config = fly_by(0.1);
        let (mut animator, mut objects, mut audio, radio) =
            setup(&config, HeadlessAudio::new().with_autoplay_blocked());

        for _ in 0..10 {
            animator.tick(&mut objects, &mut audio);
        }
        assert_eq!(audio.rejected_plays(), 1);
        assert!(!audio.is_playing(radio));

        audio.grant_user_gesture();
        animator.resume_audio();
        animator.tick(&mut objects, &mut audio);
        assert!(audio.is_playing(radio));
    }

    #[test]
    fn test_playback_rate_follows_speed() {
        let mut config = fly_by(0.1);
        config.speed = 1.5;
        config.radio.reference_speed = Some(1.0);
        let (mut animator, mut objects, mut audio, radio) = setup(&config, HeadlessAudio::new());

        animator.tick(&mut objects, &mut audio);
        assert_eq!(audio.playback_rate(radio), Some(1.5));
    }

    #[test]
    fn test_without_sound_loop_still_runs() {
        let config = fly_by(0.1);
        let actor = LoopedActor::new(CAR, Vec3::zeros(), &config);
        let mut animator = LoopAnimator::new(actor, AudioChannel::new(&config.radio, None));
        let mut objects = TestObjects::default();
        let mut audio = HeadlessAudio::new();

        for _ in 0..80 {
            animator.tick(&mut objects, &mut audio);
        }
        assert_eq!(animator.state(), LoopState::FadingOut);

        // Volume ramped to the ceiling with no track; fade still completes
        let mut fade_ticks = 0;
        while animator.fade_tick(&mut objects, &mut audio) == FadeProgress::Fading {
            fade_ticks += 1;
        }
        assert_eq!(fade_ticks, 9);
        assert_eq!(animator.state(), LoopState::Waiting);
    }
}
