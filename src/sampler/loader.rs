// Sample loading - WAV (hound) and FLAC (claxon), decoded to mono f32

use super::{SamplerError, SamplerResult};
use claxon::FlacReader;
use hound::{SampleFormat, WavReader};
use std::path::Path;

/// Decoded mono sample
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub data: Vec<f32>,
    pub sample_rate: u32,
}

impl Sample {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate.max(1) as f64
    }
}

pub fn load_sample(path: &Path) -> SamplerResult<Sample> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let sample = match extension.as_str() {
        "wav" => load_wav(path)?,
        "flac" => load_flac(path)?,
        _ => return Err(SamplerError::UnsupportedFormat(extension)),
    };

    if sample.is_empty() {
        return Err(SamplerError::Empty(path.display().to_string()));
    }
    Ok(sample)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn load_wav(path: &Path) -> SamplerResult<Sample> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(Sample {
        name: file_name(path),
        data: downmix(&interleaved, spec.channels as usize),
        sample_rate: spec.sample_rate,
    })
}

fn load_flac(path: &Path) -> SamplerResult<Sample> {
    let mut reader = FlacReader::open(path)?;
    let info = reader.streaminfo();
    let scale = (1i64 << (info.bits_per_sample - 1)) as f32;

    let interleaved: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|s| s as f32 / scale))
        .collect::<Result<_, _>>()?;

    Ok(Sample {
        name: file_name(path),
        data: downmix(&interleaved, info.channels as usize),
        sample_rate: info.sample_rate,
    })
}

/// Average interleaved channels into one
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
