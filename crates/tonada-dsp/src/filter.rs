//! Four-pole resonant ladder filter.
//!
//! A Moog-style approximation: four one-pole integrators in series with a
//! resonance feedback path from the first stage. The cutoff is normalised
//! to [0.01, 0.99] rather than expressed in Hz.

/// Filter response taps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Output of the fourth pole.
    #[default]
    Lowpass,
    /// Input minus the fourth pole.
    Highpass,
    /// First pole minus the fourth pole.
    Bandpass,
}

/// Resonant lowpass/highpass/bandpass ladder filter.
///
/// The effective cutoff is `clamp(threshold + modulation, 0.01, 0.99)`;
/// the threshold is the user-set base value, the modulation typically comes
/// from an envelope. Resonance feedback is derived as
/// `resonance + resonance / (1 − cutoff)` and recomputed whenever either
/// input changes.
#[derive(Debug, Clone)]
pub struct LadderFilter {
    mode: FilterMode,
    /// Effective cutoff used when filtering.
    cutoff: f64,
    /// Base cutoff before modulation.
    cutoff_threshold: f64,
    /// Modulation added on top of the threshold.
    cutoff_mod: f64,
    resonance: f64,
    feedback: f64,
    /// Four integrator states in series.
    buf0: f64,
    buf1: f64,
    buf2: f64,
    buf3: f64,
}

impl LadderFilter {
    /// Create a lowpass filter with the given base cutoff and resonance.
    pub fn new(cutoff: f64, resonance: f64) -> Self {
        let mut filter = Self {
            mode: FilterMode::Lowpass,
            cutoff: 0.0,
            cutoff_threshold: cutoff,
            cutoff_mod: 0.0,
            resonance,
            feedback: 0.0,
            buf0: 0.0,
            buf1: 0.0,
            buf2: 0.0,
            buf3: 0.0,
        };
        filter.update_cutoff();
        filter.update_feedback();
        filter
    }

    /// Select the response tap.
    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
    }

    /// Set the base cutoff.
    pub fn set_cutoff(&mut self, cutoff: f64) {
        self.cutoff_threshold = cutoff;
        self.update_cutoff();
        self.update_feedback();
    }

    /// Set the cutoff modulation (from an envelope or any other source).
    pub fn set_cutoff_mod(&mut self, cutoff_mod: f64) {
        self.cutoff_mod = cutoff_mod;
        self.update_cutoff();
        self.update_feedback();
    }

    /// Set the resonance amount, nominally [0, 0.99].
    pub fn set_resonance(&mut self, resonance: f64) {
        self.resonance = resonance;
        self.update_feedback();
    }

    /// Effective cutoff after modulation and clamping.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        // Silence in, silence out, and the integrators hold their state
        if input == 0.0 {
            return input;
        }
        self.buf0 += self.cutoff * (input - self.buf0 + self.feedback * (self.buf0 - self.buf1));
        self.buf1 += self.cutoff * (self.buf0 - self.buf1);
        self.buf2 += self.cutoff * (self.buf1 - self.buf2);
        self.buf3 += self.cutoff * (self.buf2 - self.buf3);
        match self.mode {
            FilterMode::Lowpass => self.buf3,
            FilterMode::Highpass => input - self.buf3,
            FilterMode::Bandpass => self.buf0 - self.buf3,
        }
    }

    fn update_cutoff(&mut self) {
        self.cutoff = (self.cutoff_threshold + self.cutoff_mod).clamp(0.01, 0.99);
    }

    fn update_feedback(&mut self) {
        self.feedback = self.resonance + self.resonance / (1.0 - self.cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_clamped() {
        let mut filter = LadderFilter::new(0.5, 0.0);
        filter.set_cutoff(-1.0);
        assert_eq!(filter.cutoff(), 0.01);
        filter.set_cutoff(2.0);
        assert_eq!(filter.cutoff(), 0.99);
    }

    #[test]
    fn modulation_adds_to_threshold() {
        let mut filter = LadderFilter::new(0.3, 0.0);
        filter.set_cutoff_mod(0.2);
        assert!((filter.cutoff() - 0.5).abs() < 1e-12);

        // Modulation past the ceiling clamps
        filter.set_cutoff_mod(0.8);
        assert_eq!(filter.cutoff(), 0.99);

        // And below the floor
        filter.set_cutoff_mod(-1.0);
        assert_eq!(filter.cutoff(), 0.01);
    }

    #[test]
    fn zero_input_short_circuits() {
        let mut filter = LadderFilter::new(0.5, 0.5);
        // Prime the state with some signal
        for _ in 0..16 {
            filter.process(1.0);
        }
        let primed = filter.process(1.0);

        // Zero input returns zero and must not decay the state
        assert_eq!(filter.process(0.0), 0.0);
        let resumed = filter.process(1.0);
        assert!((resumed - primed).abs() < 0.2, "state was disturbed by silence");
    }

    #[test]
    fn lowpass_converges_to_dc_input() {
        let mut filter = LadderFilter::new(0.5, 0.0);
        let mut out = 0.0;
        for _ in 0..1_000 {
            out = filter.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-6, "lowpass should pass DC, got {out}");
    }

    #[test]
    fn highpass_rejects_dc_input() {
        let mut filter = LadderFilter::new(0.5, 0.0);
        filter.set_mode(FilterMode::Highpass);
        let mut out = 1.0;
        for _ in 0..1_000 {
            out = filter.process(1.0);
        }
        assert!(out.abs() < 1e-6, "highpass should reject DC, got {out}");
    }

    #[test]
    fn bandpass_rejects_dc_input() {
        let mut filter = LadderFilter::new(0.5, 0.0);
        filter.set_mode(FilterMode::Bandpass);
        let mut out = 1.0;
        for _ in 0..1_000 {
            out = filter.process(1.0);
        }
        assert!(out.abs() < 1e-6, "bandpass should reject DC, got {out}");
    }

    #[test]
    fn output_bounded_at_moderate_resonance() {
        let mut filter = LadderFilter::new(0.5, 0.2);
        let mut phase = 0.0_f64;
        for i in 0..44_100 {
            phase += 0.05;
            let out = filter.process(libm::sin(phase));
            assert!(out.is_finite(), "sample {i} not finite");
            assert!(out.abs() < 10.0, "sample {i} = {out} unbounded");
        }
    }
}
