// Sample bank backend - one-shot sample voices keyed by pitch
//
// Voices are pre-allocated at construction; note_on picks a free voice or
// steals the oldest one. Velocity 0 releases matching voices with a short
// fade instead of cutting them.

use super::bank::SampleBank;
use super::loader::{Sample, load_sample};
use crate::synth::{SynthBackend, SynthError, SynthResult};
use log::{debug, info};
use std::f32::consts::FRAC_PI_2;
use std::path::Path;
use std::sync::Arc;

/// Release fade length in seconds
const RELEASE_SECONDS: f32 = 0.01;

/// Loaded sample with its mix settings
#[derive(Debug)]
struct MappedSample {
    sample: Sample,
    volume: f32,
    pan: f32,
}

#[derive(Debug, Default)]
struct SamplerVoice {
    sample: Option<Arc<MappedSample>>,
    channel: u8,
    note: u8,
    position: f64,
    step: f64,
    gain_left: f32,
    gain_right: f32,
    release: Option<f32>,
    age: u64,
}

impl SamplerVoice {
    fn is_active(&self) -> bool {
        self.sample.is_some()
    }

    fn start(&mut self, sample: Arc<MappedSample>, channel: u8, note: u8, velocity: u8, output_rate: f32, age: u64) {
        let gain = velocity as f32 / 127.0 * sample.volume;
        let angle = (sample.pan.clamp(-1.0, 1.0) * 0.5 + 0.5) * FRAC_PI_2;

        self.step = sample.sample.sample_rate as f64 / output_rate as f64;
        self.gain_left = gain * angle.cos();
        self.gain_right = gain * angle.sin();
        self.position = 0.0;
        self.release = None;
        self.channel = channel;
        self.note = note;
        self.age = age;
        self.sample = Some(sample);
    }

    /// Mix into an interleaved stereo buffer
    fn render(&mut self, buffer: &mut [f32], release_step: f32) {
        let Some(mapped) = self.sample.as_ref() else {
            return;
        };
        let data = &mapped.sample.data;
        let mut finished = false;

        for frame in buffer.chunks_exact_mut(2) {
            let index = self.position as usize;
            if index >= data.len() {
                finished = true;
                break;
            }

            // Linear interpolation
            let fraction = self.position.fract() as f32;
            let current = data[index];
            let next = data.get(index + 1).copied().unwrap_or(0.0);
            let mut sample = current + (next - current) * fraction;

            if let Some(level) = self.release.as_mut() {
                *level -= release_step;
                if *level <= 0.0 {
                    finished = true;
                    break;
                }
                sample *= *level;
            }

            frame[0] += sample * self.gain_left;
            frame[1] += sample * self.gain_right;
            self.position += self.step;
        }

        if finished {
            self.stop();
        }
    }

    fn stop(&mut self) {
        self.sample = None;
        self.release = None;
    }
}

/// Synth backend playing a JSON sample bank
pub struct SampleBankBackend {
    sample_rate: f32,
    channels: usize,
    samples: Vec<Option<Arc<MappedSample>>>,
    voices: Vec<SamplerVoice>,
    age: u64,
}

impl SampleBankBackend {
    pub fn new(sample_rate: f32, channels: usize, polyphony: usize) -> Self {
        Self {
            sample_rate: sample_rate.max(1.0),
            channels,
            samples: vec![None; 128],
            voices: (0..polyphony.max(1)).map(|_| SamplerVoice::default()).collect(),
            age: 0,
        }
    }

    /// Map a decoded sample to a note directly
    pub fn set_sample(&mut self, note: u8, sample: Sample, volume: f32, pan: f32) {
        if let Some(slot) = self.samples.get_mut(note as usize) {
            *slot = Some(Arc::new(MappedSample { sample, volume, pan }));
        }
    }

    pub fn has_sample(&self, note: u8) -> bool {
        self.samples.get(note as usize).is_some_and(Option::is_some)
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn polyphony(&self) -> usize {
        self.voices.len()
    }

    fn free_or_oldest_voice(&mut self) -> usize {
        if let Some(index) = self.voices.iter().position(|v| !v.is_active()) {
            return index;
        }

        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn release(&mut self, channel: u8, note: u8) {
        for voice in self
            .voices
            .iter_mut()
            .filter(|v| v.is_active() && v.channel == channel && v.note == note)
        {
            voice.release.get_or_insert(1.0);
        }
    }
}

impl SynthBackend for SampleBankBackend {
    fn load_soundbank(&mut self, path: &Path) -> SynthResult<()> {
        let bank = SampleBank::load_from_file(path).map_err(|e| {
            SynthError::SoundbankLoadFailure(format!("{}: {}", path.display(), e))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        for mapping in &bank.samples {
            let sample_path = base.join(&mapping.sample_path);
            let sample = load_sample(&sample_path).map_err(|e| {
                SynthError::SoundbankLoadFailure(format!("{}: {}", sample_path.display(), e))
            })?;

            debug!(
                "Note {} -> {} ({:.2}s at {} Hz)",
                mapping.note,
                sample.name,
                sample.duration_seconds(),
                sample.sample_rate
            );
            self.set_sample(mapping.note, sample, mapping.volume, mapping.pan);
        }

        info!("Sample bank '{}' loaded: {} samples", bank.name, bank.samples.len());
        Ok(())
    }

    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        if channel as usize >= self.channels {
            return;
        }

        if velocity == 0 {
            self.release(channel, pitch);
            return;
        }

        let Some(sample) = self.samples.get(pitch as usize).and_then(Option::clone) else {
            return;
        };

        self.age += 1;
        let index = self.free_or_oldest_voice();
        let (rate, age) = (self.sample_rate, self.age);
        self.voices[index].start(sample, channel, pitch, velocity, rate, age);
    }

    fn synthesize_stereo(&mut self, buffer: &mut [f32], num_frames: usize) {
        let len = (num_frames * 2).min(buffer.len());
        let out = &mut buffer[..len];
        out.fill(0.0);

        let release_step = 1.0 / (RELEASE_SECONDS * self.sample_rate);
        for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
            voice.render(out, release_step);
        }
    }

    fn all_notes_off(&mut self) {
        self.voices.iter_mut().for_each(SamplerVoice::stop);
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn name(&self) -> &str {
        "sample bank"
    }
}
