// Drum voices - fixed voice id to pitch table

use std::fmt;

/// A drum voice of the sequencer's kit
///
/// The discriminant is the voice id; track `i` plays voice `i % 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumVoice {
    KickDrum = 0,
    Clap,
    HiHat,
    OpenHi,
    Cowbell,
    Metronome,
    LowTom,
    Shaker,
    HighTom,
    MidTom,
}

impl DrumVoice {
    pub const ALL: [DrumVoice; 10] = [
        DrumVoice::KickDrum,
        DrumVoice::Clap,
        DrumVoice::HiHat,
        DrumVoice::OpenHi,
        DrumVoice::Cowbell,
        DrumVoice::Metronome,
        DrumVoice::LowTom,
        DrumVoice::Shaker,
        DrumVoice::HighTom,
        DrumVoice::MidTom,
    ];

    /// Look up a voice by id
    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }

    /// Voice recorded by the given track
    pub fn for_track(track: usize) -> Self {
        Self::ALL[track % Self::ALL.len()]
    }

    /// Pitch sent to the backend
    pub fn pitch(self) -> u8 {
        match self {
            DrumVoice::KickDrum => 35,
            DrumVoice::Clap => 39,
            DrumVoice::HiHat => 42,
            DrumVoice::OpenHi => 46,
            DrumVoice::Cowbell => 56,
            DrumVoice::Metronome => 75,
            DrumVoice::LowTom => 45,
            DrumVoice::Shaker => 70,
            DrumVoice::HighTom => 38,
            DrumVoice::MidTom => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DrumVoice::KickDrum => "kick",
            DrumVoice::Clap => "clap",
            DrumVoice::HiHat => "hi hat",
            DrumVoice::OpenHi => "open hi",
            DrumVoice::Cowbell => "cowbell",
            DrumVoice::Metronome => "woodblock",
            DrumVoice::LowTom => "low tom",
            DrumVoice::Shaker => "shaker",
            DrumVoice::HighTom => "high tom",
            DrumVoice::MidTom => "mid tom",
        }
    }
}

/// Pitch for a raw voice id; unknown ids map to 0 ("nothing")
pub fn pitch_for_voice_id(id: usize) -> u8 {
    DrumVoice::from_id(id).map(DrumVoice::pitch).unwrap_or(0)
}

impl fmt::Display for DrumVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
