// Track - one drum voice's looping step grid
// A track is like a "pattern" that loops over its own beat length, which may
// differ from the other tracks (polymeter).

use super::note::NoteEvent;
use super::{SequencerError, SequencerResult};

/// A fixed-length grid of optional notes
///
/// Invariant: `steps.len() == beat_length * beat_divisor`.
/// The grid is reserved up front for `max_beats`, so resizing never
/// allocates (tracks are edited from the audio thread).
#[derive(Debug, Clone)]
pub struct Track {
    beat_length: usize,
    beat_divisor: usize,
    max_beats: usize,
    steps: Vec<Option<NoteEvent>>,
}

impl Track {
    /// Create an empty track
    pub fn new(beat_length: usize, beat_divisor: usize, max_beats: usize) -> SequencerResult<Self> {
        let max_beats = max_beats.max(1);
        Self::check_beat_length(beat_length, max_beats)?;

        let beat_divisor = beat_divisor.max(1);
        let mut steps = Vec::with_capacity(max_beats * beat_divisor);
        steps.resize(beat_length * beat_divisor, None);

        Ok(Self {
            beat_length,
            beat_divisor,
            max_beats,
            steps,
        })
    }

    fn check_beat_length(beats: usize, max: usize) -> SequencerResult<()> {
        if beats == 0 || beats > max {
            return Err(SequencerError::InvalidBeatLength { beats, max });
        }
        Ok(())
    }

    /// Number of beats the loop spans
    pub fn beat_length(&self) -> usize {
        self.beat_length
    }

    pub fn beat_divisor(&self) -> usize {
        self.beat_divisor
    }

    pub fn max_beats(&self) -> usize {
        self.max_beats
    }

    /// Number of steps in the grid
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.iter().all(Option::is_none)
    }

    /// Number of steps holding a note
    pub fn note_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_some()).count()
    }

    pub fn steps(&self) -> &[Option<NoteEvent>] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&NoteEvent> {
        self.steps.get(index).and_then(Option::as_ref)
    }

    /// Write a note into a step, replacing what was there
    pub fn set_step(&mut self, index: usize, event: NoteEvent) -> SequencerResult<()> {
        let len = self.steps.len();
        match self.steps.get_mut(index) {
            Some(cell) => {
                *cell = Some(event);
                Ok(())
            }
            None => Err(SequencerError::IndexOutOfRange { index, len }),
        }
    }

    /// Empty a single step
    pub fn clear_step(&mut self, index: usize) -> SequencerResult<()> {
        let len = self.steps.len();
        match self.steps.get_mut(index) {
            Some(cell) => {
                *cell = None;
                Ok(())
            }
            None => Err(SequencerError::IndexOutOfRange { index, len }),
        }
    }

    /// Empty every step, keeping the length
    pub fn clear(&mut self) {
        self.steps.iter_mut().for_each(|cell| *cell = None);
    }

    /// Resize the loop to `beats` beats
    ///
    /// Steps below `min(old, new)` keep their notes. Growing pads with empty
    /// steps; shrinking discards everything past the new end (lossy).
    pub fn change_beat_length(&mut self, beats: usize) -> SequencerResult<()> {
        Self::check_beat_length(beats, self.max_beats)?;

        // Within the reserved capacity: no reallocation
        self.steps.resize(beats * self.beat_divisor, None);
        self.beat_length = beats;
        Ok(())
    }

    /// Grid index for a transport position
    ///
    /// Always `< len()` since `sub_beat_index` is reduced modulo the divisor.
    pub fn current_index(&self, global_beat: u64, sub_beat_index: usize) -> usize {
        let beat = (global_beat % self.beat_length as u64) as usize;
        beat * self.beat_divisor + sub_beat_index % self.beat_divisor
    }

    /// The note due at a transport position, copied out of the grid
    pub fn due_note(&self, global_beat: u64, sub_beat_index: usize) -> Option<NoteEvent> {
        self.steps[self.current_index(global_beat, sub_beat_index)]
    }

    /// Whether the step at a transport position holds a note
    pub fn has_note_at(&self, global_beat: u64, sub_beat_index: usize) -> bool {
        self.due_note(global_beat, sub_beat_index).is_some()
    }

    /// Step a live hit is recorded into
    ///
    /// The caller passes the quantized transport position (see
    /// `BeatClock::nearest_position`).
    pub fn nearest_step_for_recording(&self, global_beat: u64, sub_beat_index: usize) -> usize {
        self.current_index(global_beat, sub_beat_index)
    }
}
