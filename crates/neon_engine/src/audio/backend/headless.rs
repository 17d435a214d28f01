//! In-memory audio backend
//!
//! Nothing is decoded or played. Every sound keeps its simulated state
//! (ready, playing, volume, rate) so callers can be checked against it.
//! Two behaviors of real platforms can be reproduced:
//!
//! - asynchronous loading: with [`HeadlessAudio::with_deferred_loading`]
//!   sounds stay not-ready until [`HeadlessAudio::mark_ready`]
//! - autoplay policies: with [`HeadlessAudio::with_autoplay_blocked`] every
//!   `play` fails with [`AudioError::AutoplayRejected`] until
//!   [`AudioBackend::grant_user_gesture`]

use super::{AudioBackend, AudioBackendConfig, SoundHandle};
use crate::audio::AudioError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct HeadlessSound {
    path: PathBuf,
    looping: bool,
    ready: bool,
    playing: bool,
    volume: f32,
    rate: f32,
    play_count: u32,
}

/// Recording audio backend without an output device
#[derive(Debug, Default)]
pub struct HeadlessAudio {
    sounds: HashMap<SoundHandle, HeadlessSound>,
    next_id: u32,
    initialized: bool,
    deferred_loading: bool,
    autoplay_blocked: bool,
    rejected_plays: u32,
}

impl HeadlessAudio {
    /// Backend with instant loading and no autoplay restriction
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded sounds stay not-ready until [`Self::mark_ready`]
    #[must_use]
    pub fn with_deferred_loading(mut self) -> Self {
        self.deferred_loading = true;
        self
    }

    /// Reject playback until a user gesture is granted
    #[must_use]
    pub fn with_autoplay_blocked(mut self) -> Self {
        self.autoplay_blocked = true;
        self
    }

    /// Finish loading a sound; returns false for an unknown handle
    pub fn mark_ready(&mut self, handle: SoundHandle) -> bool {
        self.sounds.get_mut(&handle).map_or(false, |sound| {
            sound.ready = true;
            true
        })
    }

    /// Current playback rate of a sound
    pub fn playback_rate(&self, handle: SoundHandle) -> Option<f32> {
        self.sounds.get(&handle).map(|sound| sound.rate)
    }

    /// How many times a sound was started
    pub fn play_count(&self, handle: SoundHandle) -> u32 {
        self.sounds.get(&handle).map_or(0, |sound| sound.play_count)
    }

    /// Plays refused by the autoplay policy
    pub fn rejected_plays(&self) -> u32 {
        self.rejected_plays
    }

    /// Path and looping flag a sound was loaded with
    pub fn source(&self, handle: SoundHandle) -> Option<(&Path, bool)> {
        self.sounds
            .get(&handle)
            .map(|sound| (sound.path.as_path(), sound.looping))
    }

    fn sound_mut(&mut self, handle: SoundHandle) -> Result<&mut HeadlessSound, AudioError> {
        self.sounds.get_mut(&handle).ok_or(AudioError::InvalidHandle)
    }
}

impl AudioBackend for HeadlessAudio {
    fn initialize(&mut self, _config: &AudioBackendConfig) -> Result<(), AudioError> {
        if !self.initialized {
            self.initialized = true;
            log::info!("Headless audio backend initialized");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.initialized {
            for sound in self.sounds.values_mut() {
                sound.playing = false;
            }
            self.initialized = false;
            log::info!("Headless audio backend shutdown");
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn update(&mut self) {}

    fn load_sound(&mut self, path: &Path, looping: bool) -> Result<SoundHandle, AudioError> {
        if !self.initialized {
            return Err(AudioError::BackendNotInitialized);
        }

        let handle = SoundHandle::new(self.next_id, 0);
        self.next_id = self.next_id.wrapping_add(1);
        self.sounds.insert(
            handle,
            HeadlessSound {
                path: path.to_path_buf(),
                looping,
                ready: !self.deferred_loading,
                playing: false,
                volume: 1.0,
                rate: 1.0,
                play_count: 0,
            },
        );
        Ok(handle)
    }

    fn is_ready(&self, handle: SoundHandle) -> bool {
        self.sounds.get(&handle).map_or(false, |sound| sound.ready)
    }

    fn play(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        if self.autoplay_blocked {
            self.sound_mut(handle)?;
            self.rejected_plays += 1;
            return Err(AudioError::AutoplayRejected);
        }

        let sound = self.sound_mut(handle)?;
        if !sound.ready {
            return Err(AudioError::NotReady);
        }
        sound.playing = true;
        sound.play_count += 1;
        Ok(())
    }

    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.sound_mut(handle)?.playing = false;
        Ok(())
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        self.sound_mut(handle)?.volume = volume.max(0.0);
        Ok(())
    }

    fn get_volume(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        self.sounds
            .get(&handle)
            .map(|sound| sound.volume)
            .ok_or(AudioError::InvalidHandle)
    }

    fn set_playback_rate(&mut self, handle: SoundHandle, rate: f32) -> Result<(), AudioError> {
        self.sound_mut(handle)?.rate = rate;
        Ok(())
    }

    fn is_playing(&self, handle: SoundHandle) -> bool {
        self.sounds.get(&handle).map_or(false, |sound| sound.playing)
    }

    fn grant_user_gesture(&mut self) {
        if self.autoplay_blocked {
            log::debug!("User gesture received, autoplay unblocked");
        }
        self.autoplay_blocked = false;
    }
}
