// Synth module - voice management on top of an opaque synthesis backend

pub mod backend;
pub mod ramp;
pub mod voice_manager;

pub use backend::{SilentBackend, SynthBackend};
pub use ramp::Ramp;
pub use voice_manager::VoiceManager;

use thiserror::Error;

/// Synth-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    #[error("Invalid note channel {channel} (backend has {channels} channels)")]
    InvalidChannel { channel: u8, channels: usize },

    #[error("Failed to load soundbank: {0}")]
    SoundbankLoadFailure(String),
}

pub type SynthResult<T> = Result<T, SynthError>;
