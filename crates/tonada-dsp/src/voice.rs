//! A single synthesizer voice: one note in flight.

use crate::envelope::{Envelope, EnvelopeStage};
use crate::filter::{FilterMode, LadderFilter};
use crate::oscillator::{Oscillator, Waveform};

/// One note in flight.
///
/// Composes an oscillator, an amplitude envelope, a lowpass ladder filter
/// and a second envelope that sweeps the filter cutoff. A voice is created
/// sounding (its envelopes gated) and reports inactive once its amplitude
/// envelope has released to the floor.
#[derive(Debug, Clone)]
pub struct Voice {
    active: bool,
    velocity: f64,
    /// Per-voice filter, always lowpass.
    pub filter: LadderFilter,
    /// Amplitude envelope; its lifetime is the voice's lifetime.
    pub amp_env: Envelope,
    /// Filter-cutoff modulation envelope.
    pub filter_env: Envelope,
    /// Tone generator.
    pub oscillator: Oscillator,
}

impl Voice {
    /// Create a voice for a note, already triggered.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sample_rate: f64,
        waveform: Waveform,
        frequency: f64,
        velocity: f64,
        amp_adsr: [f64; 4],
        cutoff: f64,
        resonance: f64,
        filter_adsr: [f64; 4],
    ) -> Self {
        let mut oscillator = Oscillator::new(sample_rate);
        oscillator.set_waveform(waveform);
        oscillator.set_frequency(frequency);

        let mut filter = LadderFilter::new(cutoff, resonance);
        filter.set_mode(FilterMode::Lowpass);

        let mut voice = Self {
            active: false,
            velocity: 0.0,
            filter,
            amp_env: Envelope::new(sample_rate, amp_adsr),
            filter_env: Envelope::new(sample_rate, filter_adsr),
            oscillator,
        };
        voice.filter_env.gate_on();
        voice.note_on(velocity);
        voice
    }

    /// Retrigger: update the velocity and restart the amplitude envelope's
    /// attack. The oscillator keeps its phase and the filter its state.
    pub fn note_on(&mut self, velocity: f64) {
        self.active = true;
        self.velocity = velocity;
        self.amp_env.gate_on();
    }

    /// Release the amplitude envelope. The voice keeps sounding until the
    /// release tail reaches the floor.
    pub fn note_off(&mut self) {
        self.amp_env.gate_off();
    }

    /// Whether the voice is still producing sound.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Velocity of the most recent trigger.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.oscillator.set_waveform(waveform);
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.oscillator.set_pitch(pitch);
    }

    pub fn set_adsr(&mut self, stage: EnvelopeStage, value: f64) {
        self.amp_env.set_value(stage, value);
    }

    pub fn set_filter_adsr(&mut self, stage: EnvelopeStage, value: f64) {
        self.filter_env.set_value(stage, value);
    }

    pub fn set_filter_cutoff(&mut self, value: f64) {
        self.filter.set_cutoff(value);
    }

    pub fn set_filter_resonance(&mut self, value: f64) {
        self.filter.set_resonance(value);
    }

    /// Produce one sample.
    #[inline]
    pub fn process(&mut self) -> f64 {
        self.active = self.amp_env.is_active();
        self.filter.set_cutoff_mod(self.filter_env.advance() * 0.8);
        self.filter
            .process(self.oscillator.advance() * self.amp_env.advance() * self.velocity)
    }
}

/// Convert a MIDI note number to its equal-tempered frequency in Hz.
///
/// Standard tuning: A4 (note 69) = 440 Hz.
#[inline]
pub fn midi_to_freq(note: u8) -> f64 {
    440.0 * libm::pow(2.0, (note as f64 - 69.0) / 12.0)
}
