// Sequencer configuration, loadable from a RON file

use crate::sequencer::note::MAX_TRACKS;
use crate::synth::voice_manager::MAX_CHANNELS;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("RON serialization error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub sample_rate: u32,
    /// Nominal frames per audio callback (analysis window length)
    pub frame_size: usize,
    /// Largest callback the sequencer handles without chunking
    pub max_frames: usize,
    pub num_tracks: usize,
    /// Steps per beat
    pub beat_divisor: usize,
    pub beats_per_measure: usize,
    pub default_track_beats: usize,
    pub max_track_beats: usize,
    pub default_bpm: f64,
    pub low_bpm: f64,
    pub high_bpm: f64,
    pub synth_channels: usize,
    pub polyphony: usize,
    pub metronome_enabled: bool,
    pub metronome_channel: u8,
    /// Duration of recorded hits in seconds (0 = until replaced)
    pub recorded_note_duration: f64,
    /// JSON sample bank played by the sample backend
    pub soundbank: Option<PathBuf>,
    pub command_queue_capacity: usize,
    pub notification_queue_capacity: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            frame_size: 512,
            max_frames: 4096,
            num_tracks: 10,
            beat_divisor: 4,
            beats_per_measure: 4,
            default_track_beats: 4,
            max_track_beats: 32,
            default_bpm: 120.0,
            low_bpm: 40.0,
            high_bpm: 240.0,
            synth_channels: 16,
            polyphony: 32,
            metronome_enabled: false,
            metronome_channel: 0,
            recorded_note_duration: 0.0,
            soundbank: None,
            command_queue_capacity: 256,
            notification_queue_capacity: 128,
        }
    }
}

impl SequencerConfig {
    /// Load and validate a RON config file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = ron::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        let content = ron::ser::to_string_pretty(self, PrettyConfig::default())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let nonzero = [
            ("sample_rate", self.sample_rate as usize),
            ("frame_size", self.frame_size),
            ("max_frames", self.max_frames),
            ("num_tracks", self.num_tracks),
            ("beat_divisor", self.beat_divisor),
            ("beats_per_measure", self.beats_per_measure),
            ("max_track_beats", self.max_track_beats),
            ("synth_channels", self.synth_channels),
            ("polyphony", self.polyphony),
            ("command_queue_capacity", self.command_queue_capacity),
            ("notification_queue_capacity", self.notification_queue_capacity),
        ];
        if let Some((name, _)) = nonzero.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{} must be greater than 0", name)));
        }

        if self.num_tracks > MAX_TRACKS {
            return Err(ConfigError::Invalid(format!(
                "num_tracks {} exceeds the maximum of {}",
                self.num_tracks, MAX_TRACKS
            )));
        }

        if self.synth_channels > MAX_CHANNELS {
            return Err(ConfigError::Invalid(format!(
                "synth_channels {} exceeds the maximum of {}",
                self.synth_channels, MAX_CHANNELS
            )));
        }

        if self.default_track_beats == 0 || self.default_track_beats > self.max_track_beats {
            return Err(ConfigError::Invalid(format!(
                "default_track_beats {} must be in 1..={}",
                self.default_track_beats, self.max_track_beats
            )));
        }

        if !(self.low_bpm > 0.0 && self.low_bpm <= self.high_bpm) {
            return Err(ConfigError::Invalid(format!(
                "invalid tempo range {}..{}",
                self.low_bpm, self.high_bpm
            )));
        }

        if self.frame_size > self.max_frames {
            return Err(ConfigError::Invalid(format!(
                "frame_size {} exceeds max_frames {}",
                self.frame_size, self.max_frames
            )));
        }

        if self.recorded_note_duration < 0.0 {
            return Err(ConfigError::Invalid(
                "recorded_note_duration must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = SequencerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.frame_size, 512);
        assert_eq!(config.default_bpm, 120.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SequencerConfig::default();
        config.num_tracks = 17;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SequencerConfig::default();
        config.beat_divisor = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SequencerConfig::default();
        config.low_bpm = 200.0;
        config.high_bpm = 100.0;
        assert!(config.validate().is_err());

        let mut config = SequencerConfig::default();
        config.default_track_beats = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_count_limited_to_note_channels() {
        let config = SequencerConfig {
            synth_channels: 256,
            ..SequencerConfig::default()
        };
        assert!(config.validate().is_ok());

        let config = SequencerConfig {
            synth_channels: 257,
            ..SequencerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("loopstep.ron");
        std::fs::write(&path, "(default_bpm: 90.0, num_tracks: 4)").unwrap();

        let config = SequencerConfig::load_from_file(&path).unwrap();
        assert_eq!(config.default_bpm, 90.0);
        assert_eq!(config.num_tracks, 4);
        assert_eq!(config.beat_divisor, 4);
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("loopstep.ron");

        let mut config = SequencerConfig::default();
        config.metronome_enabled = true;
        config.soundbank = Some(PathBuf::from("drums/bank.json"));
        config.save_to_file(&path).unwrap();

        assert_eq!(SequencerConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.ron");
        std::fs::write(&path, "(default_bpm: ").unwrap();

        assert!(matches!(
            SequencerConfig::load_from_file(&path),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SequencerConfig::load_from_file(&temp_dir.path().join("missing.ron")),
            Err(ConfigError::Io(_))
        ));
    }
}
