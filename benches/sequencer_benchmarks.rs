use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use loopstep::sequencer::ChordChain;
use loopstep::synth::VoiceManager;
use loopstep::{BeatClock, NoteEvent, SampleBankBackend, Sequencer, SequencerConfig, SilentBackend};

/// Clock cost per buffer, including boundary iteration
fn bench_clock_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock_tick");

    for frames in [64usize, 512, 4096] {
        let mut clock = BeatClock::new(44100.0, 120.0, 4, 4);
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, &frames| {
            b.iter(|| black_box(clock.tick(frames).count()));
        });
    }
    group.finish();
}

/// Building the largest possible chord
fn bench_chord_combine(c: &mut Criterion) {
    let notes: Vec<NoteEvent> = (0..17).map(|i| NoteEvent::new(35 + i, 1.0, i % 16)).collect();

    c.bench_function("chord_combine_17", |b| {
        b.iter(|| black_box(ChordChain::combine(black_box(&notes))));
    });
}

/// Full callback with every step of every track filled
fn bench_sequencer_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequencer_advance");

    for num_tracks in [1usize, 10, 16] {
        let config = SequencerConfig {
            num_tracks,
            metronome_enabled: true,
            ..SequencerConfig::default()
        };
        let mut seq = Sequencer::new(config, Box::new(SilentBackend::new(16))).unwrap();
        for track in 0..num_tracks {
            for step in 0..16 {
                seq.set_step(track, step, Some(NoteEvent::new(42, 1.0, track as u8)))
                    .unwrap();
            }
        }

        let mut buffer = vec![0.0; 1024];
        group.bench_with_input(
            BenchmarkId::from_parameter(num_tracks),
            &num_tracks,
            |b, _| {
                b.iter(|| {
                    black_box(seq.advance(&mut buffer, 512));
                });
            },
        );
    }
    group.finish();
}

/// Sample voices mixing into a stereo buffer
fn bench_sample_backend(c: &mut Criterion) {
    let mut backend = SampleBankBackend::new(44100.0, 16, 32);
    let sample = loopstep::sampler::Sample {
        name: "noise".to_string(),
        data: (0..441_000).map(|i| ((i % 100) as f32 / 50.0) - 1.0).collect(),
        sample_rate: 48000,
    };
    backend.set_sample(42, sample, 1.0, 0.3);

    let mut voices = VoiceManager::new(Box::new(backend), 44100.0);
    for channel in 0..16 {
        let _ = voices.play_chord(&ChordChain::single(NoteEvent::new(42, 1.0, channel)), 0);
    }

    let mut buffer = vec![0.0; 1024];
    c.bench_function("sample_backend_16_voices", |b| {
        b.iter(|| voices.synthesize_into(black_box(&mut buffer), 512, 0));
    });
}

criterion_group!(
    benches,
    bench_clock_tick,
    bench_chord_combine,
    bench_sequencer_advance,
    bench_sample_backend
);
criterion_main!(benches);
