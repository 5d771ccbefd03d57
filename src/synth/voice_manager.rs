// Voice Manager - per-channel chords on top of the synth backend
//
// Each channel holds at most one active chord. Triggering a new chord on a
// channel replaces the stored one without silencing it; chords stop only
// when their scheduled stop time passes (or on an explicit stop/reset).

use log::warn;

use super::backend::SynthBackend;
use super::ramp::Ramp;
use super::{SynthError, SynthResult};
use crate::sequencer::note::ChordChain;

/// Frames rendered per backend call
pub const DEFAULT_SCRATCH_FRAMES: usize = 2048;

/// Channels addressable by a `u8` note channel
pub const MAX_CHANNELS: usize = u8::MAX as usize + 1;

pub struct VoiceManager {
    backend: Box<dyn SynthBackend>,
    active: Vec<Option<ChordChain>>,
    envelope: Ramp,
    pause_ramp: Ramp,
    scratch: Vec<f32>,
    sample_rate: f32,
}

impl VoiceManager {
    pub fn new(backend: Box<dyn SynthBackend>, sample_rate: f32) -> Self {
        Self::with_scratch_frames(backend, sample_rate, DEFAULT_SCRATCH_FRAMES)
    }

    /// Create with a scratch buffer of `frames` stereo frames
    ///
    /// Larger requests are rendered in chunks of this size.
    pub fn with_scratch_frames(
        backend: Box<dyn SynthBackend>,
        sample_rate: f32,
        frames: usize,
    ) -> Self {
        // Pre-allocate everything the audio thread touches
        let channels = backend.channel_count().min(MAX_CHANNELS);
        Self {
            backend,
            active: vec![None; channels],
            envelope: Ramp::new(1.0, 1.0, 1.0),
            pause_ramp: Ramp::new(1.0, 1.0, 2.0),
            scratch: vec![0.0; frames.max(1) * 2],
            sample_rate: sample_rate.max(1.0),
        }
    }

    pub fn backend(&self) -> &dyn SynthBackend {
        self.backend.as_ref()
    }

    pub fn channel_count(&self) -> usize {
        self.active.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Chord currently held by a channel
    pub fn active_chord(&self, channel: usize) -> Option<&ChordChain> {
        self.active.get(channel).and_then(Option::as_ref)
    }

    pub fn active_channel_count(&self) -> usize {
        self.active.iter().filter(|c| c.is_some()).count()
    }

    /// Trigger every member of a chord
    ///
    /// Members on an invalid channel are skipped and reported (the first one
    /// is returned as the error); the others are still played.
    pub fn play_chord(&mut self, chord: &ChordChain, now: u64) -> SynthResult<()> {
        let channels = self.active.len();
        let mut first_error = None;

        let mut scheduled = *chord;
        scheduled.schedule(now, self.sample_rate as f64);

        for note in scheduled.iter() {
            if note.channel as usize >= channels {
                warn!(
                    "Invalid note channel {} (pitch {}), skipped",
                    note.channel, note.pitch
                );
                first_error.get_or_insert(SynthError::InvalidChannel {
                    channel: note.channel,
                    channels,
                });
                continue;
            }

            self.backend
                .note_on(note.channel, note.pitch, note.midi_velocity());

            // Replaces whatever the channel held
            self.active[note.channel as usize] = scheduled.members_on_channel(note.channel);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Stop every channel whose chord has reached its stop time
    pub fn maintain_expirations(&mut self, now: u64) {
        for channel in 0..self.active.len() {
            let expired = self.active[channel]
                .as_ref()
                .map(|chord| {
                    let stop = chord.stop_time();
                    stop > 0 && stop <= now
                })
                .unwrap_or(false);

            if expired {
                self.stop_channel(channel);
            }
        }
    }

    /// Note-off every member of a channel's chord and clear it
    pub fn stop_channel(&mut self, channel: usize) {
        let Some(chord) = self.active.get_mut(channel).and_then(Option::take) else {
            return;
        };

        for note in chord.iter() {
            // Velocity 0 is the backend's note-off
            self.backend.note_on(note.channel, note.pitch, 0);
        }
    }

    /// Stop every channel
    pub fn clear_all_chords(&mut self) {
        for channel in 0..self.active.len() {
            self.stop_channel(channel);
        }
    }

    /// Clear everything, including notes the channel table no longer tracks
    pub fn reset(&mut self) {
        self.clear_all_chords();
        self.backend.all_notes_off();
    }

    pub fn pause(&mut self) {
        self.pause_ramp.update(0.0);
    }

    pub fn unpause(&mut self) {
        self.pause_ramp.update(1.0);
    }

    pub fn is_paused(&self) -> bool {
        self.pause_ramp.goal == 0.0
    }

    /// Slow fade of the whole mix
    pub fn ramp_down(&mut self) {
        self.envelope.update_with_slew(0.12, 1.5);
    }

    /// Fade the mix back in after `ramp_down`
    pub fn ramp_up(&mut self) {
        self.envelope.update_with_slew(1.0, 0.09);
    }

    pub fn envelope(&self) -> &Ramp {
        &self.envelope
    }

    pub fn pause_ramp(&self) -> &Ramp {
        &self.pause_ramp
    }

    /// Render `num_frames` interleaved stereo frames into `buffer`
    ///
    /// The backend renders into the scratch buffer, both ramps advance and
    /// the result is written scaled by `envelope * pause_ramp`.
    pub fn synthesize_into(&mut self, buffer: &mut [f32], num_frames: usize, _now: u64) {
        let num_frames = num_frames.min(buffer.len() / 2);
        let chunk_frames = self.scratch.len() / 2;

        let mut done = 0;
        while done < num_frames {
            let frames = (num_frames - done).min(chunk_frames);
            let scratch = &mut self.scratch[..frames * 2];

            self.backend.synthesize_stereo(scratch, frames);

            self.envelope.interp(frames as f32 / self.sample_rate);
            self.pause_ramp.interp(frames as f32 / self.sample_rate);

            // Stepped attack when rising
            if self.envelope.goal > 0.9 {
                if self.envelope.value > 0.3 {
                    self.envelope.slew = 0.6;
                } else if self.envelope.value > 0.2 {
                    self.envelope.slew = 0.3;
                } else if self.envelope.value > 0.15 {
                    self.envelope.slew = 0.2;
                }
            }

            let gain = self.envelope.value * self.pause_ramp.value;
            let out = &mut buffer[done * 2..(done + frames) * 2];
            for (dst, src) in out.chunks_exact_mut(2).zip(scratch.chunks_exact(2)) {
                dst[0] = src[0] * gain;
                dst[1] = src[1] * gain;
            }

            done += frames;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::note::NoteEvent;
    use crate::synth::SynthResult;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    const SAMPLE_RATE: f32 = 44100.0;

    type CallLog = Arc<Mutex<Vec<(u8, u8, u8)>>>;

    /// Records note_on calls and renders a constant signal
    struct MockBackend {
        calls: CallLog,
        channels: usize,
        level: f32,
    }

    impl SynthBackend for MockBackend {
        fn load_soundbank(&mut self, _path: &Path) -> SynthResult<()> {
            Ok(())
        }

        fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
            self.calls.lock().unwrap().push((channel, pitch, velocity));
        }

        fn synthesize_stereo(&mut self, buffer: &mut [f32], num_frames: usize) {
            buffer[..num_frames * 2].fill(self.level);
        }

        fn all_notes_off(&mut self) {}

        fn channel_count(&self) -> usize {
            self.channels
        }
    }

    fn manager(channels: usize) -> (VoiceManager, CallLog) {
        let calls = CallLog::default();
        let backend = MockBackend {
            calls: calls.clone(),
            channels,
            level: 0.5,
        };
        (VoiceManager::new(Box::new(backend), SAMPLE_RATE), calls)
    }

    #[test]
    fn test_play_chord_triggers_members() {
        let (mut vm, calls) = manager(4);
        let chord = ChordChain::combine(&[
            NoteEvent::new(35, 1.0, 0),
            NoteEvent::new(42, 0.4, 1),
        ])
        .unwrap();

        vm.play_chord(&chord, 0).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![(0, 35, 127), (1, 42, 51)]);
        assert_eq!(vm.active_channel_count(), 2);
    }

    #[test]
    fn test_invalid_channel_skipped() {
        let (mut vm, calls) = manager(3);
        let chord = ChordChain::combine(&[
            NoteEvent::new(35, 1.0, 0),
            NoteEvent::new(39, 1.0, 7),
            NoteEvent::new(42, 1.0, 2),
        ])
        .unwrap();

        let result = vm.play_chord(&chord, 0);

        assert_eq!(
            result,
            Err(SynthError::InvalidChannel {
                channel: 7,
                channels: 3
            })
        );
        assert_eq!(*calls.lock().unwrap(), vec![(0, 35, 127), (2, 42, 127)]);
    }

    #[test]
    fn test_new_chord_replaces_without_stopping() {
        let (mut vm, calls) = manager(2);
        vm.play_chord(&ChordChain::single(NoteEvent::new(35, 1.0, 0)), 0)
            .unwrap();
        vm.play_chord(&ChordChain::single(NoteEvent::new(42, 1.0, 0)), 100)
            .unwrap();

        // No note-off was sent for the first chord
        assert!(calls.lock().unwrap().iter().all(|&(_, _, v)| v > 0));
        assert_eq!(vm.active_chord(0).unwrap().get(0).unwrap().pitch, 42);
    }

    #[test]
    fn test_expiration_stops_channel() {
        let (mut vm, calls) = manager(2);
        let note = NoteEvent::new(75, 1.0, 0).with_duration(1.0);
        vm.play_chord(&ChordChain::single(note), 1000).unwrap();

        let stop = vm.active_chord(0).unwrap().stop_time();
        assert_eq!(stop, 1000 + 44100);

        vm.maintain_expirations(stop - 1);
        assert!(vm.active_chord(0).is_some());

        vm.maintain_expirations(stop);
        assert!(vm.active_chord(0).is_none());
        assert_eq!(calls.lock().unwrap().last(), Some(&(0, 75, 0)));
    }

    #[test]
    fn test_indefinite_note_never_expires() {
        let (mut vm, _calls) = manager(1);
        vm.play_chord(&ChordChain::single(NoteEvent::new(42, 1.0, 0)), 0)
            .unwrap();

        vm.maintain_expirations(u64::MAX);
        assert!(vm.active_chord(0).is_some());
    }

    #[test]
    fn test_stop_channel_sends_note_offs() {
        let (mut vm, calls) = manager(1);
        let chord = ChordChain::combine(&[
            NoteEvent::new(35, 1.0, 0),
            NoteEvent::new(42, 1.0, 0),
        ])
        .unwrap();
        vm.play_chord(&chord, 0).unwrap();
        calls.lock().unwrap().clear();

        vm.stop_channel(0);
        vm.stop_channel(0); // already empty

        assert_eq!(*calls.lock().unwrap(), vec![(0, 35, 0), (0, 42, 0)]);
    }

    #[test]
    fn test_pause_ramp_monotonic() {
        let (mut vm, _calls) = manager(1);
        let mut buffer = vec![0.0; 1024];

        vm.pause();
        let mut previous = vm.pause_ramp().value;
        for _ in 0..300 {
            vm.synthesize_into(&mut buffer, 512, 0);
            let value = vm.pause_ramp().value;
            assert!(value <= previous && value >= 0.0);
            previous = value;
        }
        assert!(previous < 0.01);

        vm.unpause();
        for _ in 0..300 {
            vm.synthesize_into(&mut buffer, 512, 0);
            let value = vm.pause_ramp().value;
            assert!(value >= previous && value <= 1.0);
            previous = value;
        }
        assert!(previous > 0.99);
    }

    #[test]
    fn test_output_scaled_by_ramps() {
        let (mut vm, _calls) = manager(1);
        let mut buffer = vec![0.0; 64];

        vm.synthesize_into(&mut buffer, 32, 0);
        assert!(buffer.iter().all(|&s| (s - 0.5).abs() < 1e-6));

        vm.ramp_down();
        for _ in 0..200 {
            vm.synthesize_into(&mut buffer, 32, 0);
        }
        let gain = vm.envelope().value * vm.pause_ramp().value;
        assert!(vm.envelope().value < 1.0);
        assert!((buffer[0] - 0.5 * gain).abs() < 1e-6);
    }

    #[test]
    fn test_ramp_up_uses_stepped_attack() {
        let (mut vm, _calls) = manager(1);
        let mut buffer = vec![0.0; 1024];

        vm.ramp_down();
        for _ in 0..2000 {
            vm.synthesize_into(&mut buffer, 512, 0);
        }
        assert!((vm.envelope().value - 0.12).abs() < 0.01);

        vm.ramp_up();
        while vm.envelope().value <= 0.3 {
            vm.synthesize_into(&mut buffer, 512, 0);
        }
        vm.synthesize_into(&mut buffer, 512, 0);
        assert_eq!(vm.envelope().slew, 0.6);
    }

    #[test]
    fn test_large_buffers_rendered_in_chunks() {
        let calls = CallLog::default();
        let backend = MockBackend {
            calls,
            channels: 1,
            level: 0.25,
        };
        let mut vm = VoiceManager::with_scratch_frames(Box::new(backend), SAMPLE_RATE, 100);
        let mut buffer = vec![0.0; 2 * 350];

        vm.synthesize_into(&mut buffer, 350, 0);
        assert!(buffer.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_channel_table_capped_at_note_channels() {
        let (mut vm, calls) = manager(300);
        assert_eq!(vm.channel_count(), MAX_CHANNELS);

        let chord = ChordChain::single(NoteEvent::new(35, 1.0, 0).with_duration(0.01));
        vm.play_chord(&chord, 0).unwrap();
        assert!(vm.active_chord(0).is_some());
        assert_eq!(vm.active_channel_count(), 1);

        vm.maintain_expirations(44100);
        assert_eq!(*calls.lock().unwrap(), vec![(0, 35, 127), (0, 35, 0)]);
    }
}
