// Shared test helpers

#![allow(dead_code)]

use loopstep::synth::{SynthBackend, SynthResult};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    AllNotesOff,
}

pub type CallLog = Arc<Mutex<Vec<BackendCall>>>;

/// Backend that records every call and renders a constant level
pub struct RecordingBackend {
    calls: CallLog,
    channels: usize,
    level: f32,
}

impl RecordingBackend {
    pub fn new(channels: usize) -> (Self, CallLog) {
        let calls = CallLog::default();
        (
            Self {
                calls: calls.clone(),
                channels,
                level: 0.25,
            },
            calls,
        )
    }
}

impl SynthBackend for RecordingBackend {
    fn load_soundbank(&mut self, _path: &Path) -> SynthResult<()> {
        Ok(())
    }

    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.calls.lock().unwrap().push(BackendCall::NoteOn {
            channel,
            pitch,
            velocity,
        });
    }

    fn synthesize_stereo(&mut self, buffer: &mut [f32], num_frames: usize) {
        buffer[..num_frames * 2].fill(self.level);
    }

    fn all_notes_off(&mut self) {
        self.calls.lock().unwrap().push(BackendCall::AllNotesOff);
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub fn note_ons(calls: &CallLog) -> Vec<(u8, u8, u8)> {
    calls
        .lock()
        .unwrap()
        .iter()
        .filter_map(|call| match *call {
            BackendCall::NoteOn {
                channel,
                pitch,
                velocity,
            } => Some((channel, pitch, velocity)),
            BackendCall::AllNotesOff => None,
        })
        .collect()
}

pub fn take_calls(calls: &CallLog) -> Vec<BackendCall> {
    std::mem::take(&mut *calls.lock().unwrap())
}
