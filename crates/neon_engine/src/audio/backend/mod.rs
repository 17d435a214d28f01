//! Audio backend implementations
//!
//! Platform-independent abstraction over audio playback libraries.

pub mod headless;
#[cfg(feature = "audio")]
pub mod rodio_backend;

use crate::audio::AudioError;
use std::path::Path;

/// Sound handle for tracking loaded sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle {
    /// Unique identifier for the sound
    pub id: u32,
    /// Generation counter for handle validation
    pub generation: u32,
}

impl SoundHandle {
    /// Create a new sound handle
    pub fn new(id: u32, generation: u32) -> Self {
        Self { id, generation }
    }
}

/// Audio backend trait for platform abstraction
///
/// Not `Send`: the engine drives audio from its single render thread.
pub trait AudioBackend {
    /// Initialize the audio backend
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError>;

    /// Shutdown the audio backend
    fn shutdown(&mut self);

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;

    /// Update the backend (release finished playback, finish loads)
    fn update(&mut self);

    /// Request a track; it may become ready later
    fn load_sound(&mut self, path: &Path, looping: bool) -> Result<SoundHandle, AudioError>;

    /// Whether a loaded track can be played
    fn is_ready(&self, handle: SoundHandle) -> bool;

    /// Start playback from the beginning
    fn play(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Stop playback; stopping a stopped sound succeeds
    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Set volume of a sound, kept across play/stop
    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError>;

    /// Get volume of a sound
    fn get_volume(&self, handle: SoundHandle) -> Result<f32, AudioError>;

    /// Set playback rate (1.0 = normal speed), kept across play/stop
    fn set_playback_rate(&mut self, handle: SoundHandle, rate: f32) -> Result<(), AudioError>;

    /// Check if a sound is playing
    fn is_playing(&self, handle: SoundHandle) -> bool;

    /// The user interacted; backends that gate autoplay may now play
    fn grant_user_gesture(&mut self) {}
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Sample rate (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of output channels (1=mono, 2=stereo)
    pub channels: u16,
    /// Buffer size for audio processing
    pub buffer_size: usize,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 4096,
        }
    }
}

/// Create the default audio backend for the platform
#[cfg(feature = "audio")]
pub fn create_backend(config: &AudioBackendConfig) -> Result<Box<dyn AudioBackend>, AudioError> {
    let mut backend = Box::new(rodio_backend::RodioBackend::new());
    backend.initialize(config)?;
    Ok(backend)
}

impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError> {
        (**self).initialize(config)
    }

    fn shutdown(&mut self) {
        (**self).shutdown();
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn update(&mut self) {
        (**self).update();
    }

    fn load_sound(&mut self, path: &Path, looping: bool) -> Result<SoundHandle, AudioError> {
        (**self).load_sound(path, looping)
    }

    fn is_ready(&self, handle: SoundHandle) -> bool {
        (**self).is_ready(handle)
    }

    fn play(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        (**self).play(handle)
    }

    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        (**self).stop(handle)
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        (**self).set_volume(handle, volume)
    }

    fn get_volume(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        (**self).get_volume(handle)
    }

    fn set_playback_rate(&mut self, handle: SoundHandle, rate: f32) -> Result<(), AudioError> {
        (**self).set_playback_rate(handle, rate)
    }

    fn is_playing(&self, handle: SoundHandle) -> bool {
        (**self).is_playing(handle)
    }

    fn grant_user_gesture(&mut self) {
        (**self).grant_user_gesture();
    }
}
