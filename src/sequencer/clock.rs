// Beat clock - converts elapsed audio frames into beat / sub-beat positions
//
// The clock keeps a fractional phase accumulator in samples. Boundaries are
// found by subtracting the step length from the accumulator, so the
// fractional remainder carries over and there is no long-run drift even when
// the step length is not a whole number of samples (120 BPM, 4 steps per
// beat at 44.1 kHz = 5512.5 samples).

use super::{SequencerError, SequencerResult};
use crate::config::SequencerConfig;
use std::fmt;

/// Default tempo range
pub const LOW_BPM: f64 = 40.0;
pub const HIGH_BPM: f64 = 240.0;

/// A grid position reached by the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatBoundary {
    /// Monotonic beat count since start
    pub global_beat: u64,
    /// Beat within the measure
    pub beat_index: usize,
    /// Step within the beat
    pub sub_beat_index: usize,
}

impl BeatBoundary {
    /// Whether this is the first step of a beat
    pub fn is_on_beat(&self) -> bool {
        self.sub_beat_index == 0
    }

    /// Whether this is the first step of a measure
    pub fn is_downbeat(&self) -> bool {
        self.sub_beat_index == 0 && self.beat_index == 0
    }
}

impl fmt::Display for BeatBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "beat {} ({}.{})",
            self.global_beat,
            self.beat_index + 1,
            self.sub_beat_index + 1
        )
    }
}

/// Tempo clock
///
/// Starts primed: the first non-empty `tick` reports position (0, 0), and
/// boundary `k` is reported once `k * samples_per_beat_divisor` frames have
/// elapsed.
#[derive(Debug, Clone)]
pub struct BeatClock {
    sample_rate: f64,
    bpm: f64,
    low_bpm: f64,
    high_bpm: f64,
    beat_divisor: usize,
    beats_per_measure: usize,
    samples_per_beat_divisor: f64,

    phase_accumulator: f64,
    started: bool,
    sub_beat_index: usize,
    beat_index: usize,
    measure_beat_counter: u64,
}

impl BeatClock {
    /// Create a clock at `bpm` (clamped to the default range)
    pub fn new(sample_rate: f64, bpm: f64, beat_divisor: usize, beats_per_measure: usize) -> Self {
        Self::with_range(sample_rate, bpm, beat_divisor, beats_per_measure, LOW_BPM, HIGH_BPM)
    }

    /// Create a clock with a custom tempo range
    pub fn with_range(
        sample_rate: f64,
        bpm: f64,
        beat_divisor: usize,
        beats_per_measure: usize,
        low_bpm: f64,
        high_bpm: f64,
    ) -> Self {
        let beat_divisor = beat_divisor.max(1);
        let mut clock = Self {
            sample_rate: sample_rate.max(1.0),
            bpm: low_bpm,
            low_bpm,
            high_bpm: high_bpm.max(low_bpm),
            beat_divisor,
            beats_per_measure: beats_per_measure.max(1),
            samples_per_beat_divisor: 0.0,
            phase_accumulator: 0.0,
            started: false,
            sub_beat_index: 0,
            beat_index: 0,
            measure_beat_counter: 0,
        };

        // Out-of-range start tempo is clamped like any other
        let _ = clock.set_tempo(bpm);
        clock
    }

    pub fn from_config(config: &SequencerConfig) -> Self {
        Self::with_range(
            config.sample_rate as f64,
            config.default_bpm,
            config.beat_divisor,
            config.beats_per_measure,
            config.low_bpm,
            config.high_bpm,
        )
    }

    /// Samples in one minute at the clock's sample rate
    pub fn samples_per_minute(&self) -> f64 {
        self.sample_rate * 60.0
    }

    /// Set the tempo
    ///
    /// Tempos outside the range are clamped and still applied; the returned
    /// error only reports that clamping happened.
    pub fn set_tempo(&mut self, bpm: f64) -> SequencerResult<()> {
        let requested = bpm;
        let applied = if bpm.is_nan() {
            self.bpm
        } else {
            bpm.clamp(self.low_bpm, self.high_bpm)
        };

        self.bpm = applied;
        self.samples_per_beat_divisor =
            self.samples_per_minute() / self.bpm / self.beat_divisor as f64;

        if applied != requested {
            return Err(SequencerError::InvalidTempo { requested, applied });
        }
        Ok(())
    }

    /// Advance by `num_frames` and iterate over the boundaries crossed
    ///
    /// Every crossed boundary is yielded; boundaries left unconsumed are
    /// reported by the next `tick`.
    pub fn tick(&mut self, num_frames: usize) -> Ticks<'_> {
        self.phase_accumulator += num_frames as f64;
        Ticks { clock: self }
    }

    fn next_boundary(&mut self) -> Option<BeatBoundary> {
        // Step (0, 0) sits at frame 0 and fires once any frame has elapsed
        if !self.started {
            if self.phase_accumulator > 0.0 {
                self.started = true;
                return Some(self.position());
            }
            return None;
        }

        if self.phase_accumulator < self.samples_per_beat_divisor {
            return None;
        }

        self.phase_accumulator -= self.samples_per_beat_divisor;
        self.advance_position();
        Some(self.position())
    }

    fn advance_position(&mut self) {
        self.sub_beat_index += 1;
        if self.sub_beat_index >= self.beat_divisor {
            self.sub_beat_index %= self.beat_divisor;
            self.measure_beat_counter += 1;
            self.beat_index = (self.measure_beat_counter % self.beats_per_measure as u64) as usize;
        }
    }

    /// Current (last reported) position
    pub fn position(&self) -> BeatBoundary {
        BeatBoundary {
            global_beat: self.measure_beat_counter,
            beat_index: self.beat_index,
            sub_beat_index: self.sub_beat_index,
        }
    }

    /// Grid position closest to now
    ///
    /// The current position while less than half a step has elapsed since it
    /// was reached, the following one after that.
    pub fn nearest_position(&self) -> BeatBoundary {
        let current = self.position();
        if !self.started || self.phase_accumulator * 2.0 < self.samples_per_beat_divisor {
            return current;
        }

        let mut next = current;
        next.sub_beat_index += 1;
        if next.sub_beat_index >= self.beat_divisor {
            next.sub_beat_index = 0;
            next.global_beat += 1;
            next.beat_index = (next.global_beat % self.beats_per_measure as u64) as usize;
        }
        next
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn tempo_range(&self) -> (f64, f64) {
        (self.low_bpm, self.high_bpm)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn beat_divisor(&self) -> usize {
        self.beat_divisor
    }

    pub fn beats_per_measure(&self) -> usize {
        self.beats_per_measure
    }

    pub fn samples_per_beat_divisor(&self) -> f64 {
        self.samples_per_beat_divisor
    }

    /// Fractional samples elapsed in the current step
    pub fn phase(&self) -> f64 {
        self.phase_accumulator
    }

    pub fn beat_index(&self) -> usize {
        self.beat_index
    }

    pub fn sub_beat_index(&self) -> usize {
        self.sub_beat_index
    }

    pub fn global_beat(&self) -> u64 {
        self.measure_beat_counter
    }

    /// Whether the first boundary has been reported
    pub fn has_started(&self) -> bool {
        self.started
    }
}

/// Boundaries crossed by one `tick`
pub struct Ticks<'a> {
    clock: &'a mut BeatClock,
}

impl Iterator for Ticks<'_> {
    type Item = BeatBoundary;

    fn next(&mut self) -> Option<BeatBoundary> {
        self.clock.next_boundary()
    }
}
