// Metronome - click notes on every beat
// Clicks go through the synth backend like any other note, as an extra
// member of the step's chord.

use super::clock::BeatBoundary;
use super::drum::DrumVoice;
use super::note::NoteEvent;

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on first beat of measure (accent/downbeat)
    Accent,
    /// Click on other beats
    Regular,
}

impl ClickType {
    pub fn velocity(self) -> f32 {
        match self {
            ClickType::Accent => Metronome::ACCENT_VELOCITY,
            ClickType::Regular => Metronome::REGULAR_VELOCITY,
        }
    }
}

/// Metronome state
#[derive(Debug, Clone)]
pub struct Metronome {
    enabled: bool,
    pitch: u8,
    channel: u8,
    duration: f64,
}

impl Metronome {
    pub const ACCENT_VELOCITY: f32 = 1.0;
    pub const REGULAR_VELOCITY: f32 = 0.4;

    /// Click length in seconds
    pub const CLICK_DURATION: f64 = 1.0;

    /// Create a disabled metronome sending on `channel`
    pub fn new(channel: u8) -> Self {
        Self {
            enabled: false,
            pitch: DrumVoice::Metronome.pitch(),
            channel,
            duration: Self::CLICK_DURATION,
        }
    }

    /// Enable/disable metronome
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if metronome is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Click type for a grid position, if one is due there
    pub fn click_type(boundary: &BeatBoundary) -> Option<ClickType> {
        if !boundary.is_on_beat() {
            return None;
        }

        Some(if boundary.beat_index == 0 {
            ClickType::Accent
        } else {
            ClickType::Regular
        })
    }

    /// The click note due at a grid position, if enabled
    pub fn click_for(&self, boundary: &BeatBoundary) -> Option<NoteEvent> {
        if !self.enabled {
            return None;
        }

        Self::click_type(boundary).map(|click| {
            NoteEvent::new(self.pitch, click.velocity(), self.channel).with_duration(self.duration)
        })
    }
}
