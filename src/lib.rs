// loopstep - loop-based drum step sequencer library

pub mod audio;
pub mod config;
pub mod messaging;
pub mod sampler;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::engine::{AudioEngine, EngineError, OutputDevice};
pub use config::{ConfigError, SequencerConfig};
pub use messaging::{Command, Notification, NotificationKind};
pub use sampler::SampleBankBackend;
pub use sequencer::{
    BeatBoundary, BeatClock, ChordChain, DrumVoice, NoteEvent, Sequencer, SequencerError,
    SequencerHandle, SharedSequencerState, Track, create_sequencer,
};
pub use synth::{SilentBackend, SynthBackend, SynthError, VoiceManager};
