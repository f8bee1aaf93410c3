//! Band-limited audio oscillator.
//!
//! Naive sine/saw/square/triangle generators with PolyBLEP (Polynomial
//! Band-Limited Step) correction applied at the waveform discontinuities
//! to suppress aliasing.

use core::f64::consts::{PI, TAU};
use libm::{fabs, fmod, pow, sin};

/// Oscillator waveform types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Waveform {
    /// Sine — pure fundamental, needs no band-limiting.
    Sine = 0,
    /// Sawtooth — all harmonics, bright timbre.
    Saw = 1,
    /// Square — odd harmonics, hollow timbre.
    #[default]
    Square = 2,
    /// Triangle — odd harmonics with fast rolloff, soft timbre.
    Triangle = 3,
}

impl Waveform {
    /// Inverse of `as u8`. Out-of-range values map to the default.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Sine,
            1 => Self::Saw,
            3 => Self::Triangle,
            _ => Self::Square,
        }
    }
}

/// Audio-rate oscillator with PolyBLEP anti-aliasing.
///
/// The phase accumulator runs over `[0, 2π)` and advances by
/// `phase_increment` after each sample. Saw and square get a PolyBLEP
/// correction at their step discontinuities; the triangle is produced by
/// feeding the corrected square through a one-pole leaky integrator, which
/// band-limits the slope discontinuity as well.
///
/// # Example
///
/// ```rust
/// use tonada_dsp::{Oscillator, Waveform};
///
/// let mut osc = Oscillator::new(44_100.0);
/// osc.set_frequency(440.0); // A4
/// osc.set_waveform(Waveform::Saw);
///
/// let sample = osc.advance();
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    /// Waveform type.
    waveform: Waveform,
    /// Sample rate in Hz.
    sample_rate: f64,
    /// Base frequency in Hz, before pitch modulation.
    frequency: f64,
    /// Pitch-bend amount in [-1, 1].
    pitch: f64,
    /// Current phase position in [0, 2π).
    phase: f64,
    /// Phase advance per sample, in radians.
    phase_increment: f64,
    /// Muted oscillators output zero and hold their phase.
    muted: bool,
    /// Previous output, the triangle integrator's state.
    last_out: f64,
}

impl Oscillator {
    /// Create a new oscillator at the given sample rate.
    ///
    /// Defaults to a 440 Hz sawtooth, unmuted, phase zero.
    pub fn new(sample_rate: f64) -> Self {
        let mut osc = Self {
            waveform: Waveform::Saw,
            sample_rate,
            frequency: 440.0,
            pitch: 0.0,
            phase: 0.0,
            phase_increment: 0.0,
            muted: false,
            last_out: 0.0,
        };
        osc.update_increment();
        osc
    }

    /// Set waveform type.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Get current waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set base frequency in Hz.
    pub fn set_frequency(&mut self, freq_hz: f64) {
        self.frequency = freq_hz;
        self.update_increment();
    }

    /// Get base frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Set pitch-bend amount in [-1, 1]. Values outside the range are clamped.
    ///
    /// The bend maps exponentially to a frequency offset of up to
    /// ±(2¹⁴ − 1) Hz; see [`Oscillator::update_increment`]'s math.
    pub fn set_pitch(&mut self, pitch: f64) {
        self.pitch = pitch.clamp(-1.0, 1.0);
        self.update_increment();
    }

    /// Set sample rate and recalculate the phase increment.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_increment();
    }

    /// Mute or unmute. A muted oscillator outputs zero and does not
    /// advance its phase, so it costs nothing to run.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Current phase in [0, 2π).
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Effective phase advance per sample, in radians.
    pub fn phase_increment(&self) -> f64 {
        self.phase_increment
    }

    /// Generate the next sample and advance the phase.
    #[inline]
    pub fn advance(&mut self) -> f64 {
        if self.muted {
            return 0.0;
        }

        let t = self.phase / TAU;
        let dt = self.phase_increment / TAU;

        let value = match self.waveform {
            Waveform::Sine => sin(self.phase),
            Waveform::Saw => (2.0 * self.phase / TAU - 1.0) - poly_blep(t, dt),
            Waveform::Square => self.blep_square(t, dt),
            Waveform::Triangle => {
                // Leaky integration of the corrected square:
                // y[n] = dφ·x[n] + (1 − dφ)·y[n−1]. The coefficient is the
                // phase increment itself, so high notes decay fast.
                let square = self.blep_square(t, dt);
                self.last_out =
                    self.phase_increment * square + (1.0 - self.phase_increment) * self.last_out;
                self.last_out
            }
        };

        self.phase += self.phase_increment;
        while self.phase >= TAU {
            self.phase -= TAU;
        }
        value
    }

    /// Naive square with PolyBLEP at both the rising and falling edges.
    #[inline]
    fn blep_square(&self, t: f64, dt: f64) -> f64 {
        let naive = if self.phase < PI { 1.0 } else { -1.0 };
        naive + poly_blep(t, dt) - poly_blep(fmod(t + 0.5, 1.0), dt)
    }

    /// Recompute the phase increment from frequency, pitch bend and rate.
    ///
    /// The bend maps to `sign(pitch) · (2^(|pitch|·14) − 1)` Hz; the summed
    /// frequency is clamped to [0, rate/2] before conversion to radians.
    fn update_increment(&mut self) {
        let mut bend = pow(2.0, fabs(self.pitch) * 14.0) - 1.0;
        if self.pitch < 0.0 {
            bend = -bend;
        }
        let freq = (self.frequency + bend).clamp(0.0, self.sample_rate / 2.0);
        self.phase_increment = freq * TAU / self.sample_rate;
    }
}

/// 2nd-order PolyBLEP residual for a unit step discontinuity at t = 0.
///
/// `t` is the normalized phase in [0, 1), `dt` the normalized phase
/// increment. Within one sample of the discontinuity the ideal band-limited
/// step is approximated by a parabolic segment; elsewhere the correction is
/// zero.
#[inline]
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        // Just after the discontinuity: 2u − u² − 1 over u ∈ [0, 1)
        let u = t / dt;
        2.0 * u - u * u - 1.0
    } else if t > 1.0 - dt {
        // Just before the discontinuity: u² + 2u + 1 over u ∈ (−1, 0)
        let u = (t - 1.0) / dt;
        u * u + 2.0 * u + 1.0
    } else {
        0.0
    }
}
