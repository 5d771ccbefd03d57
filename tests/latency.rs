// Integration test: callback cost
//
// One `advance` must cost far less than the real time the buffer covers.

mod common;

use common::RecordingBackend;
use loopstep::{NoteEvent, Sequencer, SequencerConfig};
use std::time::Instant;

const BUFFER_SIZE: usize = 512;
const SAMPLE_RATE: f64 = 44100.0;

fn busy_sequencer() -> Sequencer {
    let config = SequencerConfig {
        num_tracks: 16,
        metronome_enabled: true,
        ..SequencerConfig::default()
    };
    let (backend, _calls) = RecordingBackend::new(16);
    let mut seq = Sequencer::new(config, Box::new(backend)).unwrap();

    // Every step of every track holds a note
    for track in 0..16 {
        for step in 0..16 {
            seq.set_step(track, step, Some(NoteEvent::new(35, 1.0, track as u8)))
                .unwrap();
        }
    }
    seq
}

#[test]
fn test_advance_faster_than_real_time() {
    let mut seq = busy_sequencer();
    let mut buffer = vec![0.0; BUFFER_SIZE * 2];

    // Warm up
    for _ in 0..10 {
        seq.advance(&mut buffer, BUFFER_SIZE);
    }

    let iterations = 1000;
    let start = Instant::now();
    for _ in 0..iterations {
        seq.advance(&mut buffer, BUFFER_SIZE);
    }
    let per_buffer = start.elapsed().as_secs_f64() / iterations as f64;

    let buffer_duration = BUFFER_SIZE as f64 / SAMPLE_RATE;
    println!(
        "advance: {:.1}us per buffer (buffer covers {:.2}ms)",
        per_buffer * 1e6,
        buffer_duration * 1e3
    );

    // Generous margin for debug builds and loaded CI machines
    assert!(
        per_buffer < buffer_duration * 0.5,
        "advance too slow: {:.3}ms per buffer",
        per_buffer * 1e3
    );
}

#[test]
fn test_command_to_audio_latency_is_one_buffer() {
    let (backend, calls) = RecordingBackend::new(16);
    let (mut seq, mut handle, _notifications) =
        loopstep::create_sequencer(SequencerConfig::default(), Box::new(backend)).unwrap();
    let mut buffer = vec![0.0; BUFFER_SIZE * 2];
    seq.advance(&mut buffer, BUFFER_SIZE);

    // A live hit reaches the backend in the very next callback
    handle.record_step(0, 35, 1.0).unwrap();
    seq.advance(&mut buffer, BUFFER_SIZE);

    assert_eq!(common::note_ons(&calls), vec![(0, 35, 127)]);
}
