// DSP utilities - output hygiene and analysis windowing

use std::f32::consts::PI;

/// Flush tiny values to zero
///
/// Denormals slow down some CPUs dramatically; anything below 1e-15 is far
/// under 32-bit float noise anyway.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clipping (tanh), keeps the device output inside [-1, 1]
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Hann window coefficient for sample `index` of a `len`-sample window
///
/// `0.5 * (1 - cos(2*pi*i / (len - 1)))`; a 1-sample window is 1.
#[inline]
pub fn hann_coefficient(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }
    0.5 * (1.0 - (2.0 * PI * index as f32 / (len - 1) as f32).cos())
}

/// Precomputed Hann window
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len).map(|i| hann_coefficient(i, len)).collect()
}

/// Mono downmix of an interleaved stereo buffer, windowed
///
/// `output[i] = (left + right) / 2 * window(i)`. Uses `window` when it has
/// exactly `num_frames` coefficients, computes them otherwise.
pub fn windowed_mono_downmix(stereo: &[f32], output: &mut [f32], num_frames: usize, window: &[f32]) {
    let num_frames = num_frames.min(stereo.len() / 2).min(output.len());
    let precomputed = window.len() == num_frames;

    for (i, (out, frame)) in output[..num_frames]
        .iter_mut()
        .zip(stereo.chunks_exact(2))
        .enumerate()
    {
        let coefficient = if precomputed {
            window[i]
        } else {
            hann_coefficient(i, num_frames)
        };
        *out = (frame[0] + frame[1]) * 0.5 * coefficient;
    }
}
