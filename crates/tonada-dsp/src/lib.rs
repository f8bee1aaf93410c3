//! Tonada DSP - per-sample building blocks for the tonada synthesizer.
//!
//! This crate provides the pure signal-processing core: band-limited
//! oscillators, exponential ADSR envelopes, a resonant ladder filter, and
//! the per-note voice plus the polyphonic voice pool that composes them.
//!
//! Everything here is sample-by-sample, allocation-free and thread-unaware;
//! concurrency, device I/O and event plumbing live in `tonada-engine` and
//! `tonada-io`.
//!
//! # Example
//!
//! ```rust
//! use tonada_dsp::{Polyphonic, Waveform};
//!
//! let mut poly = Polyphonic::new(44_100.0);
//! poly.set_waveform(Waveform::Saw);
//!
//! // Play a chord
//! poly.note_on(60, 1.0); // C4
//! poly.note_on(64, 0.8); // E4
//! poly.note_on(67, 0.8); // G4
//!
//! // Generate audio
//! let mut buffer = vec![0.0; 1024];
//! for sample in buffer.iter_mut() {
//!     *sample = poly.process();
//! }
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! tonada-dsp = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod poly;
pub mod voice;

pub use envelope::{Envelope, EnvelopeStage, MIN_LEVEL};
pub use filter::{FilterMode, LadderFilter};
pub use oscillator::{Oscillator, Waveform};
pub use poly::{MAX_VOICES, Polyphonic};
pub use voice::{Voice, midi_to_freq};
