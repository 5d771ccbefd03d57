// Commands - control thread -> audio thread
//
// Every variant is Copy so pushing one never allocates. Relative changes
// (toggles, grow/shrink) are resolved by the audio thread against its own
// state, so several of them queued before one buffer all take effect.

use crate::sequencer::note::NoteEvent;

#[derive(Debug, Clone, Copy)]
pub enum Command {
    SetTempo(f64),
    SetMetronome(bool),
    ToggleMetronome,
    SetRecording(bool),
    ToggleRecording,
    /// A note played live on a track; recorded when recording is on
    RecordStep {
        track: usize,
        pitch: u8,
        velocity: f32,
    },
    SetStep {
        track: usize,
        index: usize,
        event: Option<NoteEvent>,
    },
    ClearTrack(usize),
    ChangeBeatLength {
        track: usize,
        beats: usize,
    },
    /// One beat longer
    GrowTrack(usize),
    /// One beat shorter, never below one beat
    ShrinkTrack(usize),
    Pause,
    Unpause,
    TogglePause,
    RampDown,
    RampUp,
    Reset,
}
