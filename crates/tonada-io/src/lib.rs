//! Platform I/O for the tonada synthesizer.
//!
//! This crate provides:
//! - [`CpalOutput`] / [`CpalSink`] — a cpal-backed PCM output with the
//!   blocking `play` semantics the render loop expects
//! - [`MidiSource`] — a midir input connection feeding parsed events into
//!   the engine's queue

mod midi;
mod pcm;

pub use midi::MidiSource;
pub use pcm::{CHANNELS, CpalOutput, CpalSink, PERIOD_FRAMES, SAMPLE_RATE, list_output_devices};

/// Error types for device I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no audio output device available")]
    NoDevice,

    #[error("no output device matching '{0}'")]
    DeviceNotFound(String),

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("MIDI init error: {0}")]
    MidiInit(#[from] midir::InitError),

    #[error("no MIDI input port available")]
    NoMidiPort,

    #[error("no MIDI input port matching '{0}'")]
    MidiPortNotFound(String),

    #[error("MIDI connect error: {0}")]
    MidiConnect(String),
}

pub type Result<T> = std::result::Result<T, Error>;
