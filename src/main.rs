use log::{error, info, warn};
use loopstep::messaging::NotificationLevel;
use loopstep::sequencer::SequencerResult;
use loopstep::{
    OutputDevice, SampleBankBackend, SequencerConfig, SequencerHandle, create_sequencer,
};
use ringbuf::traits::Consumer;
use std::io::BufRead;
use std::path::Path;

fn print_keys() {
    println!("Keys (type then Enter):");
    println!("  a       metronome on/off");
    println!("  space   recording on/off");
    println!("  j       hit the selected track");
    println!("  c       clear the selected track");
    println!("  k / d   grow / shrink the selected track by one beat");
    println!("  l / s   next / previous track");
    println!("  + / -   tempo up / down");
    println!("  p       pause / unpause");
    println!("  r / u   ramp down / up");
    println!("  x       reset (silence)");
    println!("  q       quit");
}

/// Apply one key; returns false on quit
fn handle_key(key: char, handle: &mut SequencerHandle) -> SequencerResult<bool> {
    match key {
        'a' => handle.flip_metronome()?,
        ' ' => handle.flip_recording()?,
        'j' => handle.record_selected()?,
        'c' => handle.clear_selected_track()?,
        'k' => handle.grow_selected_track()?,
        'd' => handle.shrink_selected_track()?,
        'l' => {
            let track = handle.select_next_track();
            info!("Track {} selected", track);
        }
        's' => {
            let track = handle.select_previous_track();
            info!("Track {} selected", track);
        }
        '+' => {
            handle.increase_tempo()?;
            info!("BPM changed to {}", handle.tempo());
        }
        '-' => {
            handle.decrease_tempo()?;
            info!("BPM changed to {}", handle.tempo());
        }
        'p' => handle.toggle_pause()?,
        'r' => handle.ramp_down()?,
        'u' => handle.ramp_up()?,
        'x' => handle.reset()?,
        'q' => return Ok(false),
        _ => {}
    }
    Ok(true)
}

fn main() {
    env_logger::init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => match SequencerConfig::load_from_file(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load {}: {}", path, e);
                return;
            }
        },
        None => SequencerConfig::default(),
    };

    let output = match OutputDevice::default_output() {
        Ok(output) => output,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    config.sample_rate = output.sample_rate();

    if config.soundbank.is_none() {
        warn!("No soundbank configured; the sequencer will run silent");
    }

    let backend = SampleBankBackend::new(
        config.sample_rate as f32,
        config.synth_channels,
        config.polyphony,
    );

    let (sequencer, mut handle, mut notifications) =
        match create_sequencer(config, Box::new(backend)) {
            Ok(parts) => parts,
            Err(e) => {
                error!("{}", e);
                return;
            }
        };

    let engine = match output.start(sequencer) {
        Ok(engine) => engine,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    print_keys();

    let stdin = std::io::stdin();
    'input: for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        for key in line.chars() {
            match handle_key(key, &mut handle) {
                Ok(true) => {}
                Ok(false) => break 'input,
                Err(e) => warn!("{}", e),
            }
        }

        while let Some(notification) = notifications.try_pop() {
            match notification.level() {
                NotificationLevel::Info => info!("{}", notification.kind),
                NotificationLevel::Warning => warn!("{}", notification.kind),
                NotificationLevel::Error => error!("{}", notification.kind),
            }
        }

        if engine.has_stream_error() {
            error!("Audio stream failed, exiting");
            break;
        }
    }

    info!("Bye");
}
