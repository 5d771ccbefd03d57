// Format conversion for CPAL output streams
//
// The sequencer renders interleaved stereo f32; devices may want i16/u16 and
// any channel count. All conversions are allocation-free.

use super::dsp_utils::{flush_denormals_to_zero, soft_clip};
use cpal::{FromSample, Sample};

/// Write one stereo frame into a device frame of any channel count
///
/// Channels beyond the first two get silence; a mono device gets the
/// average of left and right.
#[inline]
pub fn write_stereo_to_interleaved_frame<T>(
    (left_sample, right_sample): (f32, f32),
    output_frame: &mut [T],
) where
    T: Sample + FromSample<f32>,
{
    if output_frame.len() >= 2 {
        output_frame[0] = Sample::from_sample::<f32>(left_sample);
        output_frame[1] = Sample::from_sample::<f32>(right_sample);
        for channel_sample in output_frame.iter_mut().skip(2) {
            *channel_sample = Sample::from_sample::<f32>(0.0);
        }
    } else if let Some(channel_sample) = output_frame.first_mut() {
        let mono_sample = (left_sample + right_sample) * 0.5;
        *channel_sample = Sample::from_sample::<f32>(mono_sample);
    }
}

/// Copy a rendered stereo block into a device buffer
///
/// Samples are soft-clipped on the way out. Returns the number of frames
/// written (bounded by both buffers).
pub fn write_stereo_block<T>(stereo: &[f32], output: &mut [T], device_channels: usize) -> usize
where
    T: Sample + FromSample<f32>,
{
    let device_channels = device_channels.max(1);
    let mut frames = 0;

    for (frame, out) in stereo
        .chunks_exact(2)
        .zip(output.chunks_exact_mut(device_channels))
    {
        let left = soft_clip(flush_denormals_to_zero(frame[0]));
        let right = soft_clip(flush_denormals_to_zero(frame[1]));
        write_stereo_to_interleaved_frame((left, right), out);
        frames += 1;
    }

    frames
}
