//! tonada — a realtime polyphonic subtractive synthesizer.
//!
//! Opens the default (or named) audio output, attaches a MIDI input port,
//! applies a preset and plays until interrupted.

mod preset;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tonada_engine::Synth;
use tonada_io::{CpalOutput, MidiSource, list_output_devices};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tonada", version, about = "Realtime polyphonic subtractive synthesizer", long_about = None)]
struct Cli {
    /// Preset name or path to a preset TOML file
    #[arg(short, long, default_value = "default")]
    preset: String,

    /// MIDI input port (substring match; first available port if omitted)
    #[arg(short = 'd', long)]
    midi_port: Option<String>,

    /// Audio output device (substring match; system default if omitted)
    #[arg(short, long)]
    output: Option<String>,

    /// Master volume, 0.0 to 1.5
    #[arg(long, default_value_t = 1.0)]
    volume: f64,

    /// List MIDI input ports and exit
    #[arg(long)]
    list_midi: bool,

    /// List audio output devices and exit
    #[arg(long)]
    list_outputs: bool,

    /// List factory presets and exit
    #[arg(long)]
    list_presets: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    if cli.list_midi {
        for port in MidiSource::ports() {
            println!("{port}");
        }
        return Ok(());
    }
    if cli.list_outputs {
        for device in list_output_devices() {
            println!("{device}");
        }
        return Ok(());
    }
    if cli.list_presets {
        for preset in preset::factory_presets() {
            println!(
                "{:10} {}",
                preset.name,
                preset.description.unwrap_or_default()
            );
        }
        return Ok(());
    }

    let patch = preset::find(&cli.preset)?;

    let (output, sink) = CpalOutput::open(cli.output.as_deref())?;
    let synth = Synth::start(Box::new(sink))?;
    synth.set_volume(cli.volume);
    patch.apply(&synth)?;

    // No MIDI input is not fatal; the synth still runs (and is controllable
    // through the library API), it just has no keys attached.
    let midi = match MidiSource::connect(cli.midi_port.as_deref(), synth.events()) {
        Ok(midi) => Some(midi),
        Err(err) => {
            tracing::warn!(%err, "running without MIDI input");
            None
        }
    };

    println!("tonada: preset '{}', Ctrl+C to quit", patch.name);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(50));
    }

    println!("\nExiting ...");
    drop(midi);
    drop(synth);
    drop(output);
    Ok(())
}
