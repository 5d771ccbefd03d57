// Sampler - one-shot sample playback backend

pub mod bank;
pub mod engine;
pub mod loader;

pub use bank::{SampleBank, SampleMapping};
pub use engine::SampleBankBackend;
pub use loader::{Sample, load_sample};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("FLAC error: {0}")]
    Flac(#[from] claxon::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Sample file {0} contains no audio")]
    Empty(String),
}

pub type SamplerResult<T> = Result<T, SamplerError>;
