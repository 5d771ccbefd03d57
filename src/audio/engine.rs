// Audio engine - CPAL output stream driving the sequencer
//
// The sequencer is moved into the audio callback and owned by the audio
// thread; control goes through its command queue. Internally everything is
// interleaved stereo f32, converted to the device format (f32/i16/u16) and
// channel count when written to the output buffer.
//
// On macOS (CoreAudio) the Stream is not Send, so the engine has to stay on
// the thread that created it.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{error, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::audio::format_conversion::write_stereo_block;
use crate::sequencer::Sequencer;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Stream configuration error: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Error in stream creation: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("Error starting stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0:?} (supported: F32, I16, U16)")]
    UnsupportedFormat(SampleFormat),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// An output device with its negotiated stream configuration
///
/// Opened first so the sequencer and backend can be built at the device
/// sample rate, then turned into a running `AudioEngine` with `start`.
pub struct OutputDevice {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl OutputDevice {
    /// Default output device of the default host
    pub fn default_output() -> EngineResult<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(EngineError::NoDevice)?;
        Self::from_device(device)
    }

    fn from_device(device: Device) -> EngineResult<Self> {
        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();

        info!(
            "Audio device: {} ({:?}, {} Hz, {} channels)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_format,
            supported_config.sample_rate().0,
            supported_config.channels()
        );

        Ok(Self {
            device,
            config: supported_config.into(),
            sample_format,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> usize {
        self.config.channels as usize
    }

    /// Move the sequencer into the audio callback and start playing
    pub fn start(self, sequencer: Sequencer) -> EngineResult<AudioEngine> {
        let stream_error = Arc::new(AtomicBool::new(false));
        let channels = self.channels();

        let stream = match self.sample_format {
            SampleFormat::F32 => {
                build_stream::<f32>(&self.device, &self.config, sequencer, stream_error.clone())
            }
            SampleFormat::I16 => {
                build_stream::<i16>(&self.device, &self.config, sequencer, stream_error.clone())
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&self.device, &self.config, sequencer, stream_error.clone())
            }
            other => return Err(EngineError::UnsupportedFormat(other)),
        }?;

        stream.play()?;

        info!(
            "Audio engine started: {} Hz, {} channels",
            self.sample_rate(),
            channels
        );

        Ok(AudioEngine {
            sample_rate: self.sample_rate(),
            channels,
            stream_error,
            _stream: stream,
            _device: self.device,
        })
    }
}

pub struct AudioEngine {
    _device: Device,
    _stream: Stream,
    sample_rate: u32,
    channels: usize,
    stream_error: Arc<AtomicBool>,
}

impl AudioEngine {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Whether the stream reported an error since it started
    pub fn has_stream_error(&self) -> bool {
        self.stream_error.load(Ordering::Relaxed)
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut sequencer: Sequencer,
    stream_error: Arc<AtomicBool>,
) -> EngineResult<Stream>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let channels = (config.channels as usize).max(1);
    let max_frames = sequencer.config().max_frames;

    // Pre-allocated; the callback never allocates
    let mut stereo = vec![0.0f32; max_frames * 2];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            // No allocations, no I/O, no locks in here
            for out in data.chunks_mut(max_frames * channels) {
                let frames = out.len() / channels;
                sequencer.advance(&mut stereo, frames);
                write_stereo_block(&stereo[..frames * 2], out, channels);
            }
        },
        move |err| {
            // Runs outside the audio callback
            error!("Audio stream error: {}", err);
            stream_error.store(true, Ordering::Relaxed);
        },
        None,
    )?;

    Ok(stream)
}
