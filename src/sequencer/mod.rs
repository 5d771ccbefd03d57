// Sequencer module
// Beat clock, step-grid tracks, chord building and the audio-callback player

pub mod clock;
pub mod drum;
pub mod handle;
pub mod metronome;
pub mod note;
pub mod player;
pub mod state;
pub mod track;

pub use clock::{BeatBoundary, BeatClock};
pub use drum::DrumVoice;
pub use handle::SequencerHandle;
pub use metronome::{ClickType, Metronome};
pub use note::{CHORD_CAPACITY, ChordChain, MAX_TRACKS, NoteEvent};
pub use player::{Sequencer, create_sequencer};
pub use state::SharedSequencerState;
pub use track::Track;

use crate::config::ConfigError;
use crate::synth::SynthError;
use thiserror::Error;

/// Sequencer errors
///
/// None of these are fatal: the operation that raised one is skipped (or,
/// for tempo, clamped) and the sequencer keeps running.
#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("Step index {index} out of range (track has {len} steps)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Track {track} out of range ({tracks} tracks)")]
    TrackOutOfRange { track: usize, tracks: usize },

    #[error("Invalid beat length {beats} (must be 1..={max})")]
    InvalidBeatLength { beats: usize, max: usize },

    #[error("Tempo {requested} BPM out of range, clamped to {applied} BPM")]
    InvalidTempo { requested: f64, applied: f64 },

    #[error("Command queue is full")]
    QueueFull,

    #[error("Synth error: {0}")]
    Synth(#[from] SynthError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type SequencerResult<T> = Result<T, SequencerError>;
