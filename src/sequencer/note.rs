// Note events and chord chains
// A note event is one triggered drum hit; a chord chain is the set of hits
// that sound together on one step.

use log::warn;

/// Maximum number of tracks a sequencer can hold
pub const MAX_TRACKS: usize = 16;

/// Maximum number of notes in one chord (every track plus the metronome)
pub const CHORD_CAPACITY: usize = MAX_TRACKS + 1;

/// A single triggered sound
///
/// Plain value type: copying a note out of a track cell never shares state
/// with the cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// MIDI-style pitch (0-127)
    pub pitch: u8,

    /// Velocity (0.0-1.0)
    pub velocity: f32,

    /// Synth channel this note is sent to
    pub channel: u8,

    /// Duration in seconds (0.0 = no automatic stop)
    pub duration: f64,

    /// Absolute sample time the note was triggered at
    pub synth_start_time: u64,

    /// Absolute sample time the note is stopped at (0 = no scheduled stop)
    pub synth_stop_time: u64,
}

impl NoteEvent {
    /// Creates a note with no scheduled stop
    ///
    /// Pitch is clamped to 127 and velocity to [0.0, 1.0].
    pub fn new(pitch: u8, velocity: f32, channel: u8) -> Self {
        let velocity = if velocity.is_finite() {
            velocity.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            pitch: pitch.min(127),
            velocity,
            channel,
            duration: 0.0,
            synth_start_time: 0,
            synth_stop_time: 0,
        }
    }

    /// Returns the same note with a duration in seconds
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self
    }

    /// Velocity scaled to the 0-127 range the backend expects
    pub fn midi_velocity(&self) -> u8 {
        (self.velocity * 127.0).round().clamp(0.0, 127.0) as u8
    }

    /// Whether the note has a scheduled stop time
    pub fn has_scheduled_stop(&self) -> bool {
        self.synth_stop_time > 0
    }

    /// Get the note name (e.g., "C4", "F#2")
    pub fn note_name(&self) -> String {
        const NOTE_NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];

        let octave = (self.pitch / 12) as i32 - 1;
        let note_index = (self.pitch % 12) as usize;

        format!("{}{}", NOTE_NAMES[note_index], octave)
    }
}

impl Default for NoteEvent {
    fn default() -> Self {
        Self::new(0, 0.0, 0)
    }
}

/// Notes meant to trigger simultaneously
///
/// Stored inline in a fixed array so building one on the audio thread never
/// allocates. Read-only once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordChain {
    notes: [NoteEvent; CHORD_CAPACITY],
    len: usize,
}

impl ChordChain {
    /// Build a chord from the given notes, in order
    ///
    /// Returns `None` for an empty slice. Notes beyond `CHORD_CAPACITY` are
    /// dropped.
    pub fn combine(events: &[NoteEvent]) -> Option<Self> {
        if events.is_empty() {
            return None;
        }

        if events.len() > CHORD_CAPACITY {
            warn!(
                "Chord of {} notes exceeds capacity {}, extra notes dropped",
                events.len(),
                CHORD_CAPACITY
            );
        }

        let len = events.len().min(CHORD_CAPACITY);
        let mut notes = [NoteEvent::default(); CHORD_CAPACITY];
        notes[..len].copy_from_slice(&events[..len]);

        Some(Self { notes, len })
    }

    /// Chord with a single note (live monitoring)
    pub fn single(event: NoteEvent) -> Self {
        let mut notes = [NoteEvent::default(); CHORD_CAPACITY];
        notes[0] = event;
        Self { notes, len: 1 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes[..self.len]
    }

    pub fn get(&self, index: usize) -> Option<&NoteEvent> {
        self.notes().get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteEvent> {
        self.notes().iter()
    }

    /// Sub-chord made of the members that target `channel`, in order
    pub(crate) fn members_on_channel(&self, channel: u8) -> Option<Self> {
        let mut notes = [NoteEvent::default(); CHORD_CAPACITY];
        let mut len = 0;

        for note in self.iter().filter(|n| n.channel == channel) {
            notes[len] = *note;
            len += 1;
        }

        (len > 0).then_some(Self { notes, len })
    }

    /// Stamp trigger and stop times on every member
    pub(crate) fn schedule(&mut self, now: u64, sample_rate: f64) {
        for note in self.notes[..self.len].iter_mut() {
            note.synth_start_time = now;
            if note.duration > 0.0 {
                note.synth_stop_time = now + (note.duration * sample_rate).round() as u64;
            }
        }
    }

    /// Earliest scheduled stop time among members (0 = none)
    pub fn stop_time(&self) -> u64 {
        self.iter()
            .map(|n| n.synth_stop_time)
            .filter(|&t| t > 0)
            .min()
            .unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a ChordChain {
    type Item = &'a NoteEvent;
    type IntoIter = std::slice::Iter<'a, NoteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_creation_clamps() {
        let note = NoteEvent::new(200, 1.5, 3);
        assert_eq!(note.pitch, 127);
        assert_eq!(note.velocity, 1.0);
        assert_eq!(note.channel, 3);
        assert_eq!(note.duration, 0.0);
        assert!(!note.has_scheduled_stop());

        let note = NoteEvent::new(42, f32::NAN, 0);
        assert_eq!(note.velocity, 0.0);
    }

    #[test]
    fn test_midi_velocity() {
        assert_eq!(NoteEvent::new(42, 1.0, 0).midi_velocity(), 127);
        assert_eq!(NoteEvent::new(42, 0.0, 0).midi_velocity(), 0);
        assert_eq!(NoteEvent::new(75, 0.4, 0).midi_velocity(), 51);
    }

    #[test]
    fn test_note_name() {
        assert_eq!(NoteEvent::new(60, 1.0, 0).note_name(), "C4");
        assert_eq!(NoteEvent::new(42, 1.0, 0).note_name(), "F#2");
    }

    #[test]
    fn test_combine_empty() {
        assert!(ChordChain::combine(&[]).is_none());
    }

    #[test]
    fn test_combine_preserves_order() {
        let a = NoteEvent::new(35, 1.0, 0);
        let b = NoteEvent::new(39, 0.5, 1);
        let c = NoteEvent::new(42, 0.25, 2);

        let chord = ChordChain::combine(&[a, b, c]).unwrap();
        assert_eq!(chord.len(), 3);
        assert_eq!(chord.notes(), &[a, b, c]);
        assert_eq!(chord.get(1).unwrap().pitch, 39);
        assert!(chord.get(3).is_none());
    }

    #[test]
    fn test_combine_copies_values() {
        let mut cell = NoteEvent::new(42, 1.0, 0);
        let chord = ChordChain::combine(&[cell]).unwrap();

        // Overwriting the source afterwards leaves the chord untouched
        cell.pitch = 35;
        assert_eq!(chord.get(0).unwrap().pitch, 42);
    }

    #[test]
    fn test_combine_truncates_to_capacity() {
        let notes = vec![NoteEvent::new(42, 1.0, 0); CHORD_CAPACITY + 4];
        let chord = ChordChain::combine(&notes).unwrap();
        assert_eq!(chord.len(), CHORD_CAPACITY);
    }

    #[test]
    fn test_schedule_sets_stop_times() {
        let timed = NoteEvent::new(75, 1.0, 0).with_duration(1.0);
        let open = NoteEvent::new(42, 1.0, 0);
        let mut chord = ChordChain::combine(&[timed, open]).unwrap();

        chord.schedule(1000, 44100.0);

        assert_eq!(chord.get(0).unwrap().synth_start_time, 1000);
        assert_eq!(chord.get(0).unwrap().synth_stop_time, 45100);
        assert_eq!(chord.get(1).unwrap().synth_stop_time, 0);
        assert_eq!(chord.stop_time(), 45100);
    }

    #[test]
    fn test_members_on_channel() {
        let chord = ChordChain::combine(&[
            NoteEvent::new(35, 1.0, 0),
            NoteEvent::new(39, 1.0, 1),
            NoteEvent::new(42, 1.0, 0),
        ])
        .unwrap();

        let channel_zero = chord.members_on_channel(0).unwrap();
        assert_eq!(channel_zero.len(), 2);
        assert_eq!(channel_zero.get(1).unwrap().pitch, 42);
        assert!(chord.members_on_channel(5).is_none());
    }
}
