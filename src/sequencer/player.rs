// Sequencer - the audio-callback orchestrator
//
// Owns the clock, the tracks and the voice manager. `advance` is called once
// per audio buffer: it applies queued commands, triggers every step boundary
// crossed by the buffer, renders the synth output and produces a windowed
// mono copy for analysis.

use super::clock::{BeatBoundary, BeatClock};
use super::handle::SequencerHandle;
use super::metronome::Metronome;
use super::note::{CHORD_CAPACITY, ChordChain, NoteEvent};
use super::state::SharedSequencerState;
use super::track::Track;
use super::{SequencerError, SequencerResult};
use crate::audio::dsp_utils::{hann_window, windowed_mono_downmix};
use crate::config::SequencerConfig;
use crate::messaging::channels::{
    CommandConsumer, NotificationConsumer, NotificationProducer, create_command_channel,
    create_notification_channel,
};
use crate::messaging::command::Command;
use crate::messaging::notification::{Notification, NotificationKind};
use crate::synth::{SilentBackend, SynthBackend, SynthError, VoiceManager};
use log::{debug, info, warn};
use ringbuf::traits::{Consumer, Producer};
use std::sync::Arc;

/// Ring buffer producer for the mono analysis signal
pub type AnalysisProducer = ringbuf::HeapProd<f32>;

pub struct Sequencer {
    config: SequencerConfig,
    clock: BeatClock,
    tracks: Vec<Track>,
    voices: VoiceManager,
    metronome: Metronome,
    recording: bool,

    /// Sample time at the start of the current buffer
    now: u64,

    window: Vec<f32>,
    analysis: Vec<f32>,
    analysis_len: usize,

    commands: Option<CommandConsumer>,
    notifications: Option<NotificationProducer>,
    analysis_out: Option<AnalysisProducer>,
    state: Arc<SharedSequencerState>,
    soundbank_fallback: bool,
}

impl Sequencer {
    /// Create a sequencer driving `backend`
    ///
    /// Loads the configured soundbank into the backend; if that fails the
    /// backend is replaced by a `SilentBackend` and the sequencer still runs.
    pub fn new(config: SequencerConfig, mut backend: Box<dyn SynthBackend>) -> SequencerResult<Self> {
        config.validate()?;

        let mut soundbank_fallback = false;
        if let Some(path) = &config.soundbank {
            match backend.load_soundbank(path) {
                Ok(()) => info!("Loaded soundbank {:?} into {}", path, backend.name()),
                Err(e) => {
                    warn!("{}; falling back to silent output", e);
                    backend = Box::new(SilentBackend::new(backend.channel_count()));
                    soundbank_fallback = true;
                }
            }
        }

        let tracks = (0..config.num_tracks)
            .map(|_| {
                Track::new(
                    config.default_track_beats,
                    config.beat_divisor,
                    config.max_track_beats,
                )
            })
            .collect::<SequencerResult<Vec<_>>>()?;

        let clock = BeatClock::from_config(&config);
        let voices =
            VoiceManager::with_scratch_frames(backend, config.sample_rate as f32, config.max_frames);

        let mut metronome = Metronome::new(config.metronome_channel);
        metronome.set_enabled(config.metronome_enabled);

        let state = Arc::new(SharedSequencerState::new(
            config.num_tracks,
            clock.bpm(),
            config.default_track_beats,
        ));
        state.set_metronome(config.metronome_enabled);

        info!(
            "Sequencer ready: {} tracks, {} BPM, {} steps per beat, {} Hz",
            config.num_tracks,
            clock.bpm(),
            config.beat_divisor,
            config.sample_rate
        );

        Ok(Self {
            window: hann_window(config.frame_size),
            analysis: vec![0.0; config.max_frames],
            analysis_len: 0,
            config,
            clock,
            tracks,
            voices,
            metronome,
            recording: false,
            now: 0,
            commands: None,
            notifications: None,
            analysis_out: None,
            state,
            soundbank_fallback,
        })
    }

    /// Attach the command queue drained at the start of every `advance`
    pub fn attach_commands(&mut self, commands: CommandConsumer) {
        self.commands = Some(commands);
    }

    /// Attach the notification queue; reports a pending soundbank fallback
    pub fn attach_notifications(&mut self, notifications: NotificationProducer) {
        self.notifications = Some(notifications);
        if self.soundbank_fallback {
            self.notify(NotificationKind::SoundbankFallback);
        }
    }

    /// Stream the windowed mono signal to a visualization thread
    pub fn attach_analysis(&mut self, analysis: AnalysisProducer) {
        self.analysis_out = Some(analysis);
    }

    pub fn shared_state(&self) -> Arc<SharedSequencerState> {
        Arc::clone(&self.state)
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }

    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    pub fn track(&self, track: usize) -> Option<&Track> {
        self.tracks.get(track)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_metronome_enabled(&self) -> bool {
        self.metronome.is_enabled()
    }

    /// Whether the soundbank failed to load and output is silent
    pub fn is_soundbank_fallback(&self) -> bool {
        self.soundbank_fallback
    }

    /// Windowed mono mix of the last buffer
    pub fn analysis_buffer(&self) -> &[f32] {
        &self.analysis[..self.analysis_len]
    }

    /// Process one audio buffer
    ///
    /// `buffer` receives `num_frames` interleaved stereo frames. Returns the
    /// Hann-windowed mono downmix of that output (at most `max_frames`
    /// samples).
    pub fn advance(&mut self, buffer: &mut [f32], num_frames: usize) -> &[f32] {
        let num_frames = num_frames.min(buffer.len() / 2);

        self.drain_commands();

        // Every boundary crossed during this buffer triggers at buffer start
        let now = self.now;
        for boundary in self.clock.tick(num_frames) {
            let chord = Self::chord_for(&self.tracks, &self.metronome, &boundary);
            if let Some(chord) = chord {
                if let Err(SynthError::InvalidChannel { channel, channels }) =
                    self.voices.play_chord(&chord, now)
                {
                    Self::push_notification(
                        &mut self.notifications,
                        NotificationKind::InvalidChannel { channel, channels },
                    );
                }
            }
        }

        self.voices.maintain_expirations(now);
        self.voices.synthesize_into(buffer, num_frames, now);
        self.now += num_frames as u64;

        self.analysis_len = num_frames.min(self.analysis.len());
        windowed_mono_downmix(buffer, &mut self.analysis, self.analysis_len, &self.window);
        if let Some(out) = self.analysis_out.as_mut() {
            // Dropped when the reader falls behind
            out.push_slice(&self.analysis[..self.analysis_len]);
        }

        self.publish_state();

        &self.analysis[..self.analysis_len]
    }

    /// Chord for one boundary: each track's due note, then the click
    fn chord_for(
        tracks: &[Track],
        metronome: &Metronome,
        boundary: &BeatBoundary,
    ) -> Option<ChordChain> {
        let mut notes = [NoteEvent::default(); CHORD_CAPACITY];
        let mut count = 0;

        let due = tracks
            .iter()
            .filter_map(|track| track.due_note(boundary.global_beat, boundary.sub_beat_index))
            .chain(metronome.click_for(boundary));

        for note in due.take(CHORD_CAPACITY) {
            notes[count] = note;
            count += 1;
        }

        ChordChain::combine(&notes[..count])
    }

    fn publish_state(&self) {
        let position = self.clock.position();
        self.state.publish_position(
            position.global_beat,
            position.beat_index,
            position.sub_beat_index,
        );

        for (i, track) in self.tracks.iter().enumerate() {
            self.state.publish_track(
                i,
                track.has_note_at(position.global_beat, position.sub_beat_index),
                track.beat_length(),
            );
        }
    }

    fn drain_commands(&mut self) {
        while let Some(command) = self.commands.as_mut().and_then(|rx| rx.try_pop()) {
            debug!("Applying {:?}", command);
            if let Err(e) = self.apply(command) {
                warn!("{}", e);
                if let Some(kind) = Self::notification_for(&e) {
                    self.notify(kind);
                }
            }
        }
    }

    /// Apply one command as if called directly
    pub fn apply(&mut self, command: Command) -> SequencerResult<()> {
        match command {
            Command::SetTempo(bpm) => self.set_tempo(bpm),
            Command::SetMetronome(enabled) => {
                self.set_metronome(enabled);
                Ok(())
            }
            Command::ToggleMetronome => {
                self.set_metronome(!self.metronome.is_enabled());
                Ok(())
            }
            Command::SetRecording(recording) => {
                self.set_recording(recording);
                Ok(())
            }
            Command::ToggleRecording => {
                self.set_recording(!self.recording);
                Ok(())
            }
            Command::RecordStep {
                track,
                pitch,
                velocity,
            } => {
                if let Some(step) = self.record_step(track, pitch, velocity)? {
                    self.notify(NotificationKind::NoteRecorded { track, step });
                }
                Ok(())
            }
            Command::SetStep {
                track,
                index,
                event,
            } => self.set_step(track, index, event),
            Command::ClearTrack(track) => self.clear_track(track),
            Command::ChangeBeatLength { track, beats } => self.change_beat_length(track, beats),
            Command::GrowTrack(track) => self.grow_track(track),
            Command::ShrinkTrack(track) => self.shrink_track(track),
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Unpause => {
                self.unpause();
                Ok(())
            }
            Command::TogglePause => {
                if self.voices.is_paused() {
                    self.unpause();
                } else {
                    self.pause();
                }
                Ok(())
            }
            Command::RampDown => {
                self.ramp_down();
                Ok(())
            }
            Command::RampUp => {
                self.ramp_up();
                Ok(())
            }
            Command::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    fn notification_for(error: &SequencerError) -> Option<NotificationKind> {
        match *error {
            SequencerError::IndexOutOfRange { index, len } => {
                Some(NotificationKind::StepOutOfRange { index, len })
            }
            SequencerError::TrackOutOfRange { track, tracks } => {
                Some(NotificationKind::TrackOutOfRange { track, tracks })
            }
            SequencerError::InvalidBeatLength { beats, max } => {
                Some(NotificationKind::InvalidBeatLength { beats, max })
            }
            SequencerError::InvalidTempo { requested, applied } => {
                Some(NotificationKind::TempoClamped { requested, applied })
            }
            SequencerError::Synth(SynthError::InvalidChannel { channel, channels }) => {
                Some(NotificationKind::InvalidChannel { channel, channels })
            }
            _ => None,
        }
    }

    fn notify(&mut self, kind: NotificationKind) {
        Self::push_notification(&mut self.notifications, kind);
    }

    fn push_notification(notifications: &mut Option<NotificationProducer>, kind: NotificationKind) {
        if let Some(tx) = notifications.as_mut() {
            // A full queue drops the notification; the warning is logged anyway
            let _ = tx.try_push(Notification::new(kind));
        }
    }

    fn track_mut(&mut self, track: usize) -> SequencerResult<&mut Track> {
        let tracks = self.tracks.len();
        self.tracks
            .get_mut(track)
            .ok_or(SequencerError::TrackOutOfRange { track, tracks })
    }

    // Direct control

    /// Set the tempo; clamped tempos are applied and reported as an error
    pub fn set_tempo(&mut self, bpm: f64) -> SequencerResult<()> {
        let result = self.clock.set_tempo(bpm);
        self.state.set_bpm(self.clock.bpm());
        result
    }

    pub fn set_metronome(&mut self, enabled: bool) {
        self.metronome.set_enabled(enabled);
        self.state.set_metronome(enabled);
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
        self.state.set_recording(recording);
    }

    /// Hit a note on a track
    ///
    /// While recording the note is stored at the step nearest to now and the
    /// step index is returned. Otherwise it is played immediately as a
    /// one-note chord and `None` is returned.
    pub fn record_step(
        &mut self,
        track: usize,
        pitch: u8,
        velocity: f32,
    ) -> SequencerResult<Option<usize>> {
        let event = NoteEvent::new(pitch, velocity, 0).with_duration(self.config.recorded_note_duration);

        if self.recording {
            let position = self.clock.nearest_position();
            let target = self.track_mut(track)?;
            let step =
                target.nearest_step_for_recording(position.global_beat, position.sub_beat_index);
            target.set_step(step, event)?;
            debug!("Recorded {} on track {} step {}", event.note_name(), track, step);
            return Ok(Some(step));
        }

        self.track_mut(track)?;
        self.voices.play_chord(&ChordChain::single(event), self.now)?;
        Ok(None)
    }

    /// Write one cell; `None` empties it
    pub fn set_step(
        &mut self,
        track: usize,
        index: usize,
        event: Option<NoteEvent>,
    ) -> SequencerResult<()> {
        let target = self.track_mut(track)?;
        match event {
            Some(event) => target.set_step(index, event),
            None => target.clear_step(index),
        }
    }

    pub fn clear_track(&mut self, track: usize) -> SequencerResult<()> {
        self.track_mut(track)?.clear();
        Ok(())
    }

    pub fn change_beat_length(&mut self, track: usize, beats: usize) -> SequencerResult<()> {
        self.track_mut(track)?.change_beat_length(beats)?;
        self.state.publish_track(track, false, beats);
        Ok(())
    }

    /// Lengthen a track by one beat; past the maximum this is an error
    pub fn grow_track(&mut self, track: usize) -> SequencerResult<()> {
        let beats = self.track_mut(track)?.beat_length() + 1;
        self.change_beat_length(track, beats)
    }

    /// Shorten a track by one beat; a one-beat track is left alone
    pub fn shrink_track(&mut self, track: usize) -> SequencerResult<()> {
        let beats = self.track_mut(track)?.beat_length();
        if beats > 1 {
            self.change_beat_length(track, beats - 1)?;
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        self.voices.pause();
        self.state.set_paused(true);
    }

    pub fn unpause(&mut self) {
        self.voices.unpause();
        self.state.set_paused(false);
    }

    pub fn ramp_down(&mut self) {
        self.voices.ramp_down();
    }

    pub fn ramp_up(&mut self) {
        self.voices.ramp_up();
    }

    /// Stop every sounding note; patterns are kept
    pub fn reset(&mut self) {
        self.voices.reset();
    }
}

/// Build a sequencer wired to a handle and a notification queue
///
/// The `Sequencer` is meant to be moved into the audio callback, the handle
/// and the notification consumer stay on the control thread.
pub fn create_sequencer(
    config: SequencerConfig,
    backend: Box<dyn SynthBackend>,
) -> SequencerResult<(Sequencer, SequencerHandle, NotificationConsumer)> {
    let (command_tx, command_rx) = create_command_channel(config.command_queue_capacity);
    let (notification_tx, notification_rx) =
        create_notification_channel(config.notification_queue_capacity);

    let mut sequencer = Sequencer::new(config, backend)?;
    sequencer.attach_commands(command_rx);
    sequencer.attach_notifications(notification_tx);

    let handle = SequencerHandle::new(
        command_tx,
        sequencer.shared_state(),
        sequencer.clock().bpm(),
        sequencer.clock().tempo_range(),
    );

    Ok((sequencer, handle, notification_rx))
}
