// Notifications - audio thread -> control thread
//
// Built on the audio thread, so no heap data: the kind carries the numbers
// and the message is formatted on the receiving side.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationKind {
    StepOutOfRange { index: usize, len: usize },
    TrackOutOfRange { track: usize, tracks: usize },
    InvalidBeatLength { beats: usize, max: usize },
    InvalidChannel { channel: u8, channels: usize },
    TempoClamped { requested: f64, applied: f64 },
    SoundbankFallback,
    NoteRecorded { track: usize, step: usize },
}

impl NotificationKind {
    pub fn level(&self) -> NotificationLevel {
        match self {
            NotificationKind::NoteRecorded { .. } => NotificationLevel::Info,
            NotificationKind::SoundbankFallback => NotificationLevel::Error,
            _ => NotificationLevel::Warning,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::StepOutOfRange { index, len } => {
                write!(f, "step {} out of range ({} steps)", index, len)
            }
            NotificationKind::TrackOutOfRange { track, tracks } => {
                write!(f, "track {} out of range ({} tracks)", track, tracks)
            }
            NotificationKind::InvalidBeatLength { beats, max } => {
                write!(f, "invalid beat length {} (max {})", beats, max)
            }
            NotificationKind::InvalidChannel { channel, channels } => {
                write!(f, "invalid channel {} ({} channels)", channel, channels)
            }
            NotificationKind::TempoClamped { requested, applied } => {
                write!(f, "tempo {} BPM clamped to {} BPM", requested, applied)
            }
            NotificationKind::SoundbankFallback => {
                write!(f, "soundbank failed to load, output is silent")
            }
            NotificationKind::NoteRecorded { track, step } => {
                write!(f, "note recorded on track {} step {}", track, step)
            }
        }
    }
}

/// Notification with a timestamp (Unix milliseconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub timestamp: u64,
}

impl Notification {
    pub fn new(kind: NotificationKind) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self { kind, timestamp }
    }

    pub fn level(&self) -> NotificationLevel {
        self.kind.level()
    }

    /// True if younger than `max_age_ms`
    pub fn is_recent(&self, max_age_ms: u64) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        now.saturating_sub(self.timestamp) < max_age_ms
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.level(), self.kind)
    }
}
