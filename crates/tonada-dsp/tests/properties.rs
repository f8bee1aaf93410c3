//! Property-based tests for the tonada DSP invariants.
//!
//! Randomized checks of the phase, level and cutoff bounds plus the
//! one-voice-per-note guarantee of the polyphonic pool.

use core::f64::consts::TAU;
use proptest::prelude::*;
use tonada_dsp::{
    Envelope, EnvelopeStage, LadderFilter, MIN_LEVEL, Oscillator, Polyphonic, Waveform,
};

const SR: f64 = 44_100.0;

fn any_waveform() -> impl Strategy<Value = Waveform> {
    prop_oneof![
        Just(Waveform::Sine),
        Just(Waveform::Saw),
        Just(Waveform::Square),
        Just(Waveform::Triangle),
    ]
}

fn any_stage() -> impl Strategy<Value = EnvelopeStage> {
    prop_oneof![
        Just(EnvelopeStage::Attack),
        Just(EnvelopeStage::Decay),
        Just(EnvelopeStage::Sustain),
        Just(EnvelopeStage::Release),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// After any advance, the oscillator phase is in [0, 2π), for any
    /// frequency up to Nyquist and any pitch bend.
    #[test]
    fn oscillator_phase_in_range(
        freq in 0.0f64..22_050.0,
        pitch in -1.0f64..=1.0,
        waveform in any_waveform(),
    ) {
        let mut osc = Oscillator::new(SR);
        osc.set_waveform(waveform);
        osc.set_frequency(freq);
        osc.set_pitch(pitch);
        for _ in 0..512 {
            osc.advance();
            prop_assert!(
                (0.0..TAU).contains(&osc.phase()),
                "phase {} out of range (freq={freq}, pitch={pitch})",
                osc.phase()
            );
        }
    }

    /// For any threshold/modulation pair, the effective cutoff lands in
    /// [0.01, 0.99].
    #[test]
    fn filter_cutoff_clamped(
        threshold in -2.0f64..2.0,
        modulation in -2.0f64..2.0,
        resonance in 0.0f64..0.99,
    ) {
        let mut filter = LadderFilter::new(threshold, resonance);
        filter.set_cutoff_mod(modulation);
        prop_assert!((0.01..=0.99).contains(&filter.cutoff()));
    }

    /// While active, the envelope level never falls below the floor; once
    /// it does fall below, the envelope reports inactive.
    #[test]
    fn envelope_level_respects_floor(
        attack in 0.01f64..1.5,
        decay in 0.01f64..1.5,
        sustain in 0.01f64..1.0,
        release in 0.01f64..0.2,
        release_after in 0usize..8_000,
    ) {
        let mut env = Envelope::new(SR, [attack, decay, sustain, release]);
        env.gate_on();
        for _ in 0..release_after {
            env.advance();
        }
        env.gate_off();
        for _ in 0..20_000 {
            let level = env.advance();
            if env.is_active() {
                prop_assert!(
                    level >= MIN_LEVEL * 0.99,
                    "active envelope fell to {level}"
                );
            }
        }
    }

    /// A random storm of note events never produces two voices for one note
    /// number, and every sounding note is one that was turned on.
    #[test]
    fn at_most_one_voice_per_note(
        events in prop::collection::vec((0u8..8, 0u8..4, 0.0f64..=1.0), 1..64),
    ) {
        let notes = [60u8, 62, 64, 65, 67, 69, 71, 72];
        let mut poly = Polyphonic::new(SR);

        for (idx, kind, velocity) in events {
            let note = notes[idx as usize];
            match kind {
                0 | 1 => poly.note_on(note, velocity),
                2 => poly.note_off(note),
                _ => { poly.process(); }
            }
            // Never more voices than distinct playable notes, and one bit
            // per live voice: two voices on the same note would collapse
            // into a single mask bit and break the equality.
            prop_assert!(poly.active_voice_count() <= notes.len());
            prop_assert_eq!(
                poly.active_mask().count_ones() as usize,
                poly.active_voice_count()
            );
        }
    }

    /// Two consecutive note_on calls for the same note leave one voice in
    /// the attack stage carrying the second velocity.
    #[test]
    fn retrigger_is_idempotent(
        note in 0u8..128,
        v1 in 0.0f64..=1.0,
        v2 in 0.0f64..=1.0,
        gap in 0usize..2_000,
    ) {
        let mut poly = Polyphonic::new(SR);
        poly.note_on(note, v1);
        for _ in 0..gap {
            poly.process();
        }
        poly.note_on(note, v2);

        prop_assert_eq!(poly.active_voice_count(), 1);
        let voice = poly.voice(note).expect("voice exists");
        prop_assert_eq!(voice.amp_env.stage(), EnvelopeStage::Attack);
        prop_assert_eq!(voice.velocity(), v2);
    }

    /// Mid-flight stage edits keep the envelope's level finite and
    /// non-negative no matter when they land.
    #[test]
    fn envelope_survives_random_edits(
        stage in any_stage(),
        value in 0.01f64..1.5,
        edit_after in 0usize..4_000,
    ) {
        let mut env = Envelope::new(SR, [0.05, 0.1, 0.7, 0.2]);
        env.gate_on();
        for _ in 0..edit_after {
            env.advance();
        }
        env.set_value(stage, value);
        for _ in 0..4_000 {
            let level = env.advance();
            prop_assert!(level.is_finite() && level >= 0.0, "level {level}");
        }
    }
}
