use super::SynthResult;
use std::path::Path;

/// Synthesis backend driven by the voice manager
///
/// The backend is owned by the audio thread: every method is called from
/// inside the audio callback except `load_soundbank`, which runs at startup.
pub trait SynthBackend: Send {
    /// Load the sound data (samples, soundfont...) the backend plays
    fn load_soundbank(&mut self, path: &Path) -> SynthResult<()>;

    /// Start a note; velocity 0 stops it
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8);

    /// Render `num_frames` interleaved stereo frames into `buffer`
    ///
    /// `buffer` holds at least `num_frames * 2` samples and is overwritten.
    fn synthesize_stereo(&mut self, buffer: &mut [f32], num_frames: usize);

    /// Silence every channel immediately
    fn all_notes_off(&mut self);

    /// Number of note channels the backend accepts
    fn channel_count(&self) -> usize;

    /// Short name for logs
    fn name(&self) -> &str {
        "backend"
    }
}

/// Backend that accepts every call and renders silence
///
/// Stands in when the real backend's sound data could not be loaded.
#[derive(Debug, Clone)]
pub struct SilentBackend {
    channels: usize,
}

impl SilentBackend {
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }
}

impl SynthBackend for SilentBackend {
    fn load_soundbank(&mut self, _path: &Path) -> SynthResult<()> {
        Ok(())
    }

    fn note_on(&mut self, _channel: u8, _pitch: u8, _velocity: u8) {}

    fn synthesize_stereo(&mut self, buffer: &mut [f32], num_frames: usize) {
        let len = (num_frames * 2).min(buffer.len());
        buffer[..len].fill(0.0);
    }

    fn all_notes_off(&mut self) {}

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn name(&self) -> &str {
        "silent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_backend_renders_zeros() {
        let mut backend = SilentBackend::new(16);
        let mut buffer = vec![1.0; 64];

        backend.note_on(0, 42, 127);
        backend.synthesize_stereo(&mut buffer, 16);

        assert!(buffer[..32].iter().all(|&s| s == 0.0));
        assert!(buffer[32..].iter().all(|&s| s == 1.0));
        assert_eq!(backend.channel_count(), 16);
    }
}
