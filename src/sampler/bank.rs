use super::SamplerResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serializable sample bank (JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBank {
    pub name: String,
    pub version: String,
    pub samples: Vec<SampleMapping>,
}

/// Mapping from MIDI note to sample file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMapping {
    /// MIDI note number (0-127)
    pub note: u8,
    /// Path to the sample file, relative to the bank file
    pub sample_path: PathBuf,
    #[serde(default)]
    pub name: String,
    /// Volume multiplier
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Pan position (-1.0 left, 0.0 center, 1.0 right)
    #[serde(default)]
    pub pan: f32,
}

fn default_volume() -> f32 {
    1.0
}

impl SampleMapping {
    pub fn new(note: u8, sample_path: impl Into<PathBuf>) -> Self {
        let sample_path = sample_path.into();
        Self {
            note,
            name: sample_path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            sample_path,
            volume: 1.0,
            pan: 0.0,
        }
    }
}

impl SampleBank {
    pub fn new(name: String) -> Self {
        Self {
            name,
            version: "1.0".to_string(),
            samples: Vec::new(),
        }
    }

    /// Add a mapping, replacing any existing mapping for the same note
    pub fn add_mapping(&mut self, mapping: SampleMapping) {
        self.samples.retain(|m| m.note != mapping.note);
        self.samples.push(mapping);
    }

    pub fn get_mapping(&self, note: u8) -> Option<&SampleMapping> {
        self.samples.iter().find(|m| m.note == note)
    }

    pub fn remove_mapping(&mut self, note: u8) -> bool {
        let initial_len = self.samples.len();
        self.samples.retain(|m| m.note != note);
        self.samples.len() < initial_len
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SamplerResult<()> {
        let json_str = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json_str)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SamplerResult<Self> {
        let json_str = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json_str)?)
    }
}

impl Default for SampleBank {
    fn default() -> Self {
        Self::new("Untitled Bank".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_add_mapping_replaces_note() {
        let mut bank = SampleBank::new("Kit".to_string());
        bank.add_mapping(SampleMapping::new(35, "kick.wav"));
        bank.add_mapping(SampleMapping::new(35, "kick2.wav"));

        assert_eq!(bank.samples.len(), 1);
        assert_eq!(bank.get_mapping(35).unwrap().name, "kick2");
        assert!(bank.remove_mapping(35));
        assert!(!bank.remove_mapping(35));
    }

    #[test]
    fn test_save_load_bank() {
        let dir = tempdir().unwrap();
        let bank_path = dir.path().join("kit.json");

        let mut bank = SampleBank::new("Kit".to_string());
        let mut hat = SampleMapping::new(42, "hats/closed.flac");
        hat.pan = -0.3;
        bank.add_mapping(hat);
        bank.save_to_file(&bank_path).unwrap();

        assert_eq!(SampleBank::load_from_file(&bank_path).unwrap(), bank);
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"name":"Kit","version":"1.0","samples":[{"note":39,"sample_path":"clap.wav"}]}"#;
        let bank: SampleBank = serde_json::from_str(json).unwrap();
        let clap = bank.get_mapping(39).unwrap();
        assert_eq!(clap.volume, 1.0);
        assert_eq!(clap.pan, 0.0);
    }
}
