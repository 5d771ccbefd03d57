// Shared sequencer state - published by the audio thread, read by the
// input / visualization side. Relaxed atomics only: every field is an
// independent snapshot, there is no cross-field consistency.

use super::note::MAX_TRACKS;
use crate::audio::parameters::AtomicF32;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

#[derive(Debug)]
pub struct SharedSequencerState {
    num_tracks: usize,
    beat_index: AtomicUsize,
    sub_beat_index: AtomicUsize,
    global_beat: AtomicU64,
    track_has_note: [AtomicBool; MAX_TRACKS],
    track_beat_length: [AtomicUsize; MAX_TRACKS],
    selected_track: AtomicUsize,
    bpm: AtomicF32,
    recording: AtomicBool,
    metronome: AtomicBool,
    paused: AtomicBool,
}

impl SharedSequencerState {
    pub fn new(num_tracks: usize, bpm: f64, track_beats: usize) -> Self {
        Self {
            num_tracks: num_tracks.min(MAX_TRACKS),
            beat_index: AtomicUsize::new(0),
            sub_beat_index: AtomicUsize::new(0),
            global_beat: AtomicU64::new(0),
            track_has_note: std::array::from_fn(|_| AtomicBool::new(false)),
            track_beat_length: std::array::from_fn(|_| AtomicUsize::new(track_beats)),
            selected_track: AtomicUsize::new(0),
            bpm: AtomicF32::new(bpm as f32),
            recording: AtomicBool::new(false),
            metronome: AtomicBool::new(false),
            paused: AtomicBool::new(false),
        }
    }

    pub fn num_tracks(&self) -> usize {
        self.num_tracks
    }

    pub fn beat_index(&self) -> usize {
        self.beat_index.load(Ordering::Relaxed)
    }

    pub fn sub_beat_index(&self) -> usize {
        self.sub_beat_index.load(Ordering::Relaxed)
    }

    pub fn global_beat(&self) -> u64 {
        self.global_beat.load(Ordering::Relaxed)
    }

    /// Whether the track's current step holds a note (false for unknown tracks)
    pub fn track_has_note(&self, track: usize) -> bool {
        self.track_has_note
            .get(track)
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn track_beat_length(&self, track: usize) -> usize {
        self.track_beat_length
            .get(track)
            .map_or(0, |len| len.load(Ordering::Relaxed))
    }

    pub fn selected_track(&self) -> usize {
        self.selected_track.load(Ordering::Relaxed)
    }

    pub fn bpm(&self) -> f32 {
        self.bpm.get()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }

    pub fn is_metronome_on(&self) -> bool {
        self.metronome.load(Ordering::Relaxed)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    // Writers

    pub(crate) fn publish_position(&self, global_beat: u64, beat_index: usize, sub_beat_index: usize) {
        self.global_beat.store(global_beat, Ordering::Relaxed);
        self.beat_index.store(beat_index, Ordering::Relaxed);
        self.sub_beat_index.store(sub_beat_index, Ordering::Relaxed);
    }

    pub(crate) fn publish_track(&self, track: usize, has_note: bool, beat_length: usize) {
        if let Some(flag) = self.track_has_note.get(track) {
            flag.store(has_note, Ordering::Relaxed);
        }
        if let Some(len) = self.track_beat_length.get(track) {
            len.store(beat_length, Ordering::Relaxed);
        }
    }

    pub(crate) fn set_selected_track(&self, track: usize) {
        self.selected_track.store(track, Ordering::Relaxed);
    }

    pub(crate) fn set_bpm(&self, bpm: f64) {
        self.bpm.set(bpm as f32);
    }

    pub(crate) fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::Relaxed);
    }

    pub(crate) fn set_metronome(&self, enabled: bool) {
        self.metronome.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }
}
