// Sequencer handle - input-thread side of the sequencer
//
// Mutations are pushed as commands into the SPSC queue and applied by the
// audio thread at the start of its next buffer. Track selection lives here
// only; the audio thread never needs it.

use super::drum::DrumVoice;
use super::note::NoteEvent;
use super::state::SharedSequencerState;
use super::{SequencerError, SequencerResult};
use crate::messaging::channels::CommandProducer;
use crate::messaging::command::Command;
use log::debug;
use ringbuf::traits::Producer;
use std::sync::Arc;

/// BPM change per tempo nudge
pub const TEMPO_STEP: f64 = 1.0;

pub struct SequencerHandle {
    commands: CommandProducer,
    state: Arc<SharedSequencerState>,
    num_tracks: usize,
    selected_track: usize,
    bpm: f64,
    low_bpm: f64,
    high_bpm: f64,
}

impl SequencerHandle {
    pub(crate) fn new(
        commands: CommandProducer,
        state: Arc<SharedSequencerState>,
        bpm: f64,
        tempo_range: (f64, f64),
    ) -> Self {
        let num_tracks = state.num_tracks();
        Self {
            commands,
            state,
            num_tracks,
            selected_track: 0,
            bpm,
            low_bpm: tempo_range.0,
            high_bpm: tempo_range.1,
        }
    }

    /// State published by the audio thread
    pub fn state(&self) -> &Arc<SharedSequencerState> {
        &self.state
    }

    pub fn num_tracks(&self) -> usize {
        self.num_tracks
    }

    fn send(&mut self, command: Command) -> SequencerResult<()> {
        debug!("Sending {:?}", command);
        self.commands
            .try_push(command)
            .map_err(|_| SequencerError::QueueFull)
    }

    fn check_track(&self, track: usize) -> SequencerResult<()> {
        if track >= self.num_tracks {
            return Err(SequencerError::TrackOutOfRange {
                track,
                tracks: self.num_tracks,
            });
        }
        Ok(())
    }

    // Tempo

    /// Request a tempo; out-of-range values are clamped by the audio thread
    pub fn set_tempo(&mut self, bpm: f64) -> SequencerResult<()> {
        self.send(Command::SetTempo(bpm))?;
        if !bpm.is_nan() {
            self.bpm = bpm.clamp(self.low_bpm, self.high_bpm);
        }
        Ok(())
    }

    /// Tempo last requested through this handle (after clamping)
    pub fn tempo(&self) -> f64 {
        self.bpm
    }

    /// One BPM faster, if below the upper bound
    pub fn increase_tempo(&mut self) -> SequencerResult<()> {
        if self.bpm < self.high_bpm {
            self.set_tempo(self.bpm + TEMPO_STEP)?;
        }
        Ok(())
    }

    /// One BPM slower, if above the lower bound
    pub fn decrease_tempo(&mut self) -> SequencerResult<()> {
        if self.bpm > self.low_bpm {
            self.set_tempo(self.bpm - TEMPO_STEP)?;
        }
        Ok(())
    }

    // Flags

    pub fn toggle_metronome(&mut self, enabled: bool) -> SequencerResult<()> {
        self.send(Command::SetMetronome(enabled))
    }

    pub fn toggle_recording(&mut self, recording: bool) -> SequencerResult<()> {
        self.send(Command::SetRecording(recording))
    }

    /// Invert the metronome flag as the audio thread sees it
    pub fn flip_metronome(&mut self) -> SequencerResult<()> {
        self.send(Command::ToggleMetronome)
    }

    /// Invert the recording flag as the audio thread sees it
    pub fn flip_recording(&mut self) -> SequencerResult<()> {
        self.send(Command::ToggleRecording)
    }

    // Track selection

    pub fn selected_track(&self) -> usize {
        self.selected_track
    }

    pub fn select_track(&mut self, track: usize) -> SequencerResult<()> {
        self.check_track(track)?;
        self.selected_track = track;
        self.state.set_selected_track(track);
        Ok(())
    }

    pub fn select_next_track(&mut self) -> usize {
        let track = (self.selected_track + 1) % self.num_tracks;
        self.selected_track = track;
        self.state.set_selected_track(track);
        track
    }

    pub fn select_previous_track(&mut self) -> usize {
        let track = (self.selected_track + self.num_tracks - 1) % self.num_tracks;
        self.selected_track = track;
        self.state.set_selected_track(track);
        track
    }

    // Steps

    /// Hit a note on a track: recorded when recording, played live otherwise
    pub fn record_step(&mut self, track: usize, pitch: u8, velocity: f32) -> SequencerResult<()> {
        self.check_track(track)?;
        self.send(Command::RecordStep {
            track,
            pitch,
            velocity,
        })
    }

    /// Hit the selected track's drum voice at full velocity
    pub fn record_selected(&mut self) -> SequencerResult<()> {
        let track = self.selected_track;
        self.record_step(track, DrumVoice::for_track(track).pitch(), 1.0)
    }

    /// Write (or with `None`, empty) one cell directly
    pub fn set_step(
        &mut self,
        track: usize,
        index: usize,
        event: Option<NoteEvent>,
    ) -> SequencerResult<()> {
        self.check_track(track)?;
        self.send(Command::SetStep {
            track,
            index,
            event,
        })
    }

    pub fn clear_track(&mut self, track: usize) -> SequencerResult<()> {
        self.check_track(track)?;
        self.send(Command::ClearTrack(track))
    }

    pub fn clear_selected_track(&mut self) -> SequencerResult<()> {
        self.clear_track(self.selected_track)
    }

    // Lengths

    pub fn change_beat_length(&mut self, track: usize, beats: usize) -> SequencerResult<()> {
        self.check_track(track)?;
        self.send(Command::ChangeBeatLength { track, beats })
    }

    /// One beat longer; the audio thread rejects lengths past the maximum
    pub fn grow_selected_track(&mut self) -> SequencerResult<()> {
        self.send(Command::GrowTrack(self.selected_track))
    }

    /// One beat shorter, never below one beat
    pub fn shrink_selected_track(&mut self) -> SequencerResult<()> {
        self.send(Command::ShrinkTrack(self.selected_track))
    }

    // Output

    pub fn pause(&mut self) -> SequencerResult<()> {
        self.send(Command::Pause)
    }

    pub fn unpause(&mut self) -> SequencerResult<()> {
        self.send(Command::Unpause)
    }

    pub fn toggle_pause(&mut self) -> SequencerResult<()> {
        self.send(Command::TogglePause)
    }

    pub fn ramp_down(&mut self) -> SequencerResult<()> {
        self.send(Command::RampDown)
    }

    pub fn ramp_up(&mut self) -> SequencerResult<()> {
        self.send(Command::RampUp)
    }

    /// Silence every sounding note
    pub fn reset(&mut self) -> SequencerResult<()> {
        self.send(Command::Reset)
    }
}
