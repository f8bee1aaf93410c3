//! Exponential ADSR envelope generator.
//!
//! The envelope moves geometrically between stage targets: on entering a
//! stage it precomputes a per-sample multiplier that carries the level from
//! its start value to its end value over the stage duration, so the hot
//! path is a single multiply. Exponential motion sounds linear to the ear.

use libm::log;

/// Floor of the envelope's output, roughly -80 dB.
///
/// Levels never start below this, and a released envelope is considered
/// finished once it decays back down to it.
pub const MIN_LEVEL: f64 = 1e-4;

/// ADSR envelope stages.
///
/// Stage order doubles as the index into the envelope's value table:
/// attack/decay/release values are durations in seconds, sustain is an
/// absolute level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Rising from [`MIN_LEVEL`] toward 1.0.
    Attack,
    /// Falling from 1.0 toward the sustain level.
    Decay,
    /// Holding at the sustain level until released.
    Sustain,
    /// Falling from the current level toward [`MIN_LEVEL`]; terminal.
    Release,
}

impl EnvelopeStage {
    /// Stage transition table: A→D, D→S, S→S, R→R.
    fn next(self) -> Self {
        match self {
            Self::Attack => Self::Decay,
            Self::Decay => Self::Sustain,
            Self::Sustain => Self::Sustain,
            Self::Release => Self::Release,
        }
    }
}

/// Four-stage exponential envelope.
///
/// # Example
///
/// ```rust
/// use tonada_dsp::Envelope;
///
/// // attack, decay, sustain level, release
/// let mut env = Envelope::new(44_100.0, [0.01, 0.5, 0.5, 1.0]);
/// env.gate_on();
///
/// for _ in 0..1000 {
///     let level = env.advance();
///     // scale a voice's output by `level`
/// }
///
/// env.gate_off();
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Sample rate in Hz.
    sample_rate: f64,
    /// Current output level.
    level: f64,
    /// Per-sample geometric multiplier for the current stage.
    multiplier: f64,
    /// Current stage.
    stage: EnvelopeStage,
    /// Stage values, indexed by stage: A/D/R in seconds, S as a level.
    values: [f64; 4],
    /// Samples elapsed in the current stage.
    current_sample: u64,
    /// Sample count at which the next stage is entered.
    next_stage_at: u64,
}

impl Envelope {
    /// Create an envelope from `[attack, decay, sustain, release]`.
    ///
    /// The envelope starts silent; call [`Envelope::gate_on`] to begin the
    /// attack.
    pub fn new(sample_rate: f64, adsr: [f64; 4]) -> Self {
        Self {
            sample_rate,
            level: MIN_LEVEL,
            multiplier: 1.0,
            stage: EnvelopeStage::Attack,
            values: adsr,
            current_sample: 0,
            next_stage_at: 0,
        }
    }

    /// Trigger the envelope: enter (or re-enter) the attack stage.
    pub fn gate_on(&mut self) {
        self.enter_stage(EnvelopeStage::Attack);
    }

    /// Release the envelope. Release can be entered from any stage and
    /// decays from wherever the level currently is.
    pub fn gate_off(&mut self) {
        self.enter_stage(EnvelopeStage::Release);
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current output level without advancing.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// `false` once the envelope has been released and has decayed to the
    /// floor; `true` in every other state.
    pub fn is_active(&self) -> bool {
        !(self.stage == EnvelopeStage::Release && self.level <= MIN_LEVEL)
    }

    /// Advance one sample and return the level.
    #[inline]
    pub fn advance(&mut self) -> f64 {
        if self.stage != EnvelopeStage::Sustain {
            if self.current_sample == self.next_stage_at {
                self.enter_stage(self.stage.next());
            }
            self.level *= self.multiplier;
            self.current_sample += 1;
        }
        self.level
    }

    /// Update a stage value mid-flight.
    ///
    /// The new value always replaces the stored one; if the envelope is
    /// currently inside the affected stage the trajectory is rewritten in
    /// place:
    ///
    /// - sustain changed while sustaining: the level jumps immediately;
    /// - sustain changed while decaying: the decay retargets to the new
    ///   sustain over its remaining samples;
    /// - the current stage's own duration changed: the remaining portion is
    ///   rescaled to the new duration and the multiplier recomputed from the
    ///   current level to the stage's end target.
    pub fn set_value(&mut self, stage: EnvelopeStage, value: f64) {
        self.values[stage as usize] = value;

        if self.stage == EnvelopeStage::Sustain && stage == EnvelopeStage::Sustain {
            self.level = value;
        } else if self.stage == EnvelopeStage::Decay && stage == EnvelopeStage::Sustain {
            let remaining = self.next_stage_at.saturating_sub(self.current_sample);
            self.multiplier = stage_multiplier(self.level, value.max(MIN_LEVEL), remaining);
        } else if self.stage == stage {
            let target = match self.stage {
                EnvelopeStage::Attack => 1.0,
                EnvelopeStage::Decay => self.values[EnvelopeStage::Sustain as usize].max(MIN_LEVEL),
                EnvelopeStage::Release => MIN_LEVEL,
                // sustain-while-sustaining handled above
                EnvelopeStage::Sustain => return,
            };
            let progress = if self.next_stage_at == 0 {
                1.0
            } else {
                self.current_sample as f64 / self.next_stage_at as f64
            };
            let remaining = ((1.0 - progress) * value * self.sample_rate) as u64;
            self.next_stage_at = self.current_sample + remaining;
            self.multiplier = stage_multiplier(self.level, target, remaining);
        }
    }

    fn enter_stage(&mut self, stage: EnvelopeStage) {
        self.stage = stage;
        self.current_sample = 0;
        self.next_stage_at = match stage {
            EnvelopeStage::Sustain => 0,
            _ => (self.values[stage as usize] * self.sample_rate) as u64,
        };

        match stage {
            EnvelopeStage::Attack => {
                self.level = MIN_LEVEL;
                self.multiplier = stage_multiplier(self.level, 1.0, self.next_stage_at);
            }
            EnvelopeStage::Decay => {
                self.level = 1.0;
                self.multiplier = stage_multiplier(
                    self.level,
                    self.values[EnvelopeStage::Sustain as usize].max(MIN_LEVEL),
                    self.next_stage_at,
                );
            }
            EnvelopeStage::Sustain => {
                self.level = self.values[EnvelopeStage::Sustain as usize];
                self.multiplier = 1.0;
            }
            EnvelopeStage::Release => {
                // Decay from the current level, wherever the release caught it
                self.multiplier = stage_multiplier(self.level, MIN_LEVEL, self.next_stage_at);
            }
        }
    }
}

/// Geometric multiplier moving a level from `start` to `end` over
/// `num_samples` samples: `1 + (ln end − ln start) / n`. Cheaper than a
/// per-sample `exp`.
fn stage_multiplier(start: f64, end: f64, num_samples: u64) -> f64 {
    1.0 + (log(end) - log(start)) / num_samples.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44_100.0;

    fn test_env() -> Envelope {
        Envelope::new(SR, [0.01, 0.05, 0.5, 0.1])
    }

    #[test]
    fn attack_rises_then_decays_to_sustain() {
        let mut env = test_env();
        env.gate_on();
        assert_eq!(env.stage(), EnvelopeStage::Attack);

        let mut prev = 0.0;
        while env.stage() == EnvelopeStage::Attack {
            let level = env.advance();
            assert!(level >= prev, "attack must be monotonic: {prev} -> {level}");
            prev = level;
        }
        assert_eq!(env.stage(), EnvelopeStage::Decay);

        // Run through decay; should settle at the sustain level
        for _ in 0..(0.05 * SR) as usize + 2 {
            env.advance();
        }
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn sustain_holds_indefinitely() {
        let mut env = test_env();
        env.gate_on();
        for _ in 0..(0.06 * SR) as usize + 4 {
            env.advance();
        }
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        for _ in 0..50_000 {
            assert_eq!(env.advance(), 0.5);
        }
    }

    #[test]
    fn release_reaches_floor_within_duration() {
        let mut env = test_env();
        env.gate_on();
        for _ in 0..10_000 {
            env.advance();
        }

        env.gate_off();
        assert_eq!(env.stage(), EnvelopeStage::Release);
        assert!(env.is_active());

        let release_samples = (0.1 * SR) as usize;
        let mut samples = 0;
        while env.is_active() {
            env.advance();
            samples += 1;
            assert!(samples <= release_samples + 2, "release overran its duration");
        }
        assert!(env.level() <= MIN_LEVEL);
    }

    #[test]
    fn release_from_attack_decays_from_current_level() {
        let mut env = test_env();
        env.gate_on();
        for _ in 0..100 {
            env.advance();
        }
        let level = env.level();

        env.gate_off();
        let after = env.advance();
        assert!(after < level, "release must move down from {level}, got {after}");
    }

    #[test]
    fn level_stays_at_or_above_floor_while_active() {
        let mut env = test_env();
        env.gate_on();
        for _ in 0..20_000 {
            let level = env.advance();
            if env.is_active() {
                assert!(level >= MIN_LEVEL * 0.9, "active level {level} below floor");
            }
        }
    }

    #[test]
    fn retrigger_restarts_attack() {
        let mut env = test_env();
        env.gate_on();
        for _ in 0..5_000 {
            env.advance();
        }
        env.gate_on();
        assert_eq!(env.stage(), EnvelopeStage::Attack);
        assert_eq!(env.level(), MIN_LEVEL);
    }

    #[test]
    fn set_sustain_while_sustaining_jumps_immediately() {
        let mut env = test_env();
        env.gate_on();
        for _ in 0..(0.06 * SR) as usize + 4 {
            env.advance();
        }
        assert_eq!(env.stage(), EnvelopeStage::Sustain);

        env.set_value(EnvelopeStage::Sustain, 0.8);
        assert_eq!(env.advance(), 0.8);
    }

    #[test]
    fn set_sustain_while_decaying_retargets_decay() {
        let mut env = Envelope::new(SR, [0.001, 0.2, 0.5, 0.1]);
        env.gate_on();
        // Get into decay
        while env.stage() != EnvelopeStage::Decay {
            env.advance();
        }
        for _ in 0..1_000 {
            env.advance();
        }

        env.set_value(EnvelopeStage::Sustain, 0.9);
        // Still decay; eventually sustains at the new value
        for _ in 0..(0.2 * SR) as usize {
            env.advance();
            if env.stage() == EnvelopeStage::Sustain {
                break;
            }
        }
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn shortening_current_stage_finishes_sooner() {
        let mut env = Envelope::new(SR, [1.0, 0.05, 0.5, 0.1]);
        env.gate_on();
        for _ in 0..1_000 {
            env.advance();
        }
        assert_eq!(env.stage(), EnvelopeStage::Attack);

        // Shrink the attack from 1s to 10ms: remaining ≈ 99.9% of 10ms
        env.set_value(EnvelopeStage::Attack, 0.01);
        let mut samples = 0;
        while env.stage() == EnvelopeStage::Attack {
            env.advance();
            samples += 1;
            assert!(samples < 600, "attack did not shorten");
        }
    }

    #[test]
    fn inactive_only_after_release() {
        let mut env = test_env();
        env.gate_on();
        assert!(env.is_active());
        for _ in 0..30_000 {
            env.advance();
            assert!(env.is_active(), "must stay active until released");
        }
    }

    #[test]
    fn value_update_for_other_stage_is_deferred() {
        let mut env = test_env();
        env.gate_on();
        let level = env.advance();

        // Changing release while attacking must not disturb the trajectory
        env.set_value(EnvelopeStage::Release, 1.5);
        let next = env.advance();
        assert!(next >= level);
        assert_eq!(env.stage(), EnvelopeStage::Attack);
    }
}
