//! Audio playback
//!
//! The only sound in the scene is the fly-by radio, so the audio layer is a
//! thin handle-based backend: load a track, wait for it to become ready,
//! then play, stop, and adjust volume and playback rate.
//!
//! Two backends exist:
//! - [`HeadlessAudio`]: in-memory, records every call; used by tests and by
//!   the viewer when built without sound
//! - `RodioBackend` (feature `audio`): real playback through `rodio`

pub mod backend;

pub use backend::headless::HeadlessAudio;
pub use backend::{AudioBackend, AudioBackendConfig, SoundHandle};

#[cfg(feature = "audio")]
pub use backend::rodio_backend::RodioBackend;

use thiserror::Error;

/// Audio errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Backend used before `initialize`
    #[error("Audio backend not initialized")]
    BackendNotInitialized,

    /// Output device could not be opened
    #[error("Audio backend initialization failed: {0}")]
    BackendInitFailed(String),

    /// Handle does not refer to a loaded sound
    #[error("Invalid sound handle")]
    InvalidHandle,

    /// Sound still loading
    #[error("Sound not ready")]
    NotReady,

    /// Playback refused until the user interacts with the page or window
    #[error("Autoplay rejected")]
    AutoplayRejected,

    /// Decoding or output failure
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}
