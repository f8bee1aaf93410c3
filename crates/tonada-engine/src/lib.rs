//! Tonada engine - the concurrent half of the tonada synthesizer.
//!
//! This crate wires the pure DSP core from `tonada-dsp` into a realtime
//! pipeline:
//!
//! - [`Event`] / [`event_queue`] — the control-event FIFO between a
//!   producer thread (MIDI, UI) and the render thread
//! - [`PcmSink`] — the blocking PCM consumer the render loop feeds
//! - [`Renderer`] / [`RenderEngine`] — the per-period render loop and the
//!   thread that runs it
//! - [`Synth`] — the public control surface
//!
//! Only the render thread ever touches the voice pool. Everything the
//! outside world does goes through the event queue or a lock-free atomic,
//! so no lock is ever taken on the audio path.

mod event;
mod render;
mod shared;
mod sink;
mod synth;

pub use event::{Event, EventReceiver, EventSender, QUEUE_CAPACITY, event_queue};
pub use render::{RenderEngine, Renderer, clip};
pub use shared::Controls;
pub use sink::PcmSink;
pub use synth::Synth;

// The façade speaks the dsp crate's vocabulary for waveforms
pub use tonada_dsp::Waveform;

/// Error types for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to spawn render thread: {0}")]
    Thread(#[from] std::io::Error),

    #[error("PCM sink error: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, Error>;
