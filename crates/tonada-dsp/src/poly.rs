//! Polyphonic voice pool.
//!
//! Maps note numbers to voices with a fixed number of slots, so playing
//! notes never allocates on the audio thread. At most one voice exists per
//! note number; a repeated NoteOn retriggers the existing voice instead of
//! stacking a second one.

use crate::envelope::EnvelopeStage;
use crate::oscillator::Waveform;
use crate::voice::{Voice, midi_to_freq};

/// Number of preallocated voice slots.
pub const MAX_VOICES: usize = 32;

#[derive(Debug, Clone)]
struct Slot {
    note: u8,
    /// Monotonic trigger counter, used to evict the oldest voice when the
    /// pool is full.
    age: u64,
    voice: Voice,
}

/// Polyphonic note player.
///
/// Holds the current patch defaults (waveform, envelopes, filter settings)
/// and applies them to every new voice; parameter setters update the
/// defaults *and* broadcast to all live voices. Voices whose amplitude
/// envelope has finished are swept out during [`Polyphonic::process`].
///
/// # Example
///
/// ```rust
/// use tonada_dsp::{Polyphonic, Waveform};
///
/// let mut poly = Polyphonic::new(44_100.0);
/// poly.set_waveform(Waveform::Saw);
/// poly.note_on(69, 1.0);
///
/// let sample = poly.process();
/// ```
#[derive(Debug, Clone)]
pub struct Polyphonic {
    sample_rate: f64,
    waveform: Waveform,
    amp_adsr: [f64; 4],
    filter_adsr: [f64; 4],
    filter_cutoff: f64,
    filter_resonance: f64,
    slots: [Option<Slot>; MAX_VOICES],
    age_counter: u64,
}

impl Polyphonic {
    /// Create an empty pool with the default patch: square wave, short
    /// attack, medium decay and sustain, long release, wide-open filter.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            waveform: Waveform::Square,
            amp_adsr: [0.01, 0.5, 0.5, 1.0],
            filter_adsr: [0.2, 0.2, 1.0, 1.0],
            filter_cutoff: 0.99,
            filter_resonance: 0.0,
            slots: core::array::from_fn(|_| None),
            age_counter: 0,
        }
    }

    /// Start or retrigger a note.
    pub fn note_on(&mut self, note: u8, velocity: f64) {
        self.age_counter += 1;
        let age = self.age_counter;

        if let Some(slot) = self.slot_mut(note) {
            slot.age = age;
            slot.voice.note_on(velocity);
            return;
        }

        let slot = Slot {
            note,
            age,
            voice: Voice::new(
                self.sample_rate,
                self.waveform,
                midi_to_freq(note),
                velocity,
                self.amp_adsr,
                self.filter_cutoff,
                self.filter_resonance,
                self.filter_adsr,
            ),
        };

        if let Some(free) = self.slots.iter_mut().find(|s| s.is_none()) {
            *free = Some(slot);
        } else if let Some(oldest) = self
            .slots
            .iter_mut()
            .min_by_key(|s| s.as_ref().map_or(0, |s| s.age))
        {
            // Pool exhausted: evict the longest-held voice
            *oldest = Some(slot);
        }
    }

    /// Release a note. Hardware sometimes sends NoteOff for notes that were
    /// never on; those are ignored.
    pub fn note_off(&mut self, note: u8) {
        if let Some(slot) = self.slot_mut(note) {
            slot.voice.note_off();
        }
    }

    /// Whether a note is currently sounding.
    pub fn note_active(&self, note: u8) -> bool {
        self.slots
            .iter()
            .flatten()
            .find(|s| s.note == note)
            .is_some_and(|s| s.voice.is_active())
    }

    /// Number of live voices.
    pub fn active_voice_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.voice.is_active())
            .count()
    }

    /// Bitmask of sounding note numbers, bit `n` for note `n`.
    pub fn active_mask(&self) -> u128 {
        let mut mask = 0u128;
        for slot in self.slots.iter().flatten() {
            if slot.voice.is_active() {
                mask |= 1u128 << slot.note;
            }
        }
        mask
    }

    /// The voice currently keyed by `note`, if any.
    pub fn voice(&self, note: u8) -> Option<&Voice> {
        self.slots
            .iter()
            .flatten()
            .find(|s| s.note == note)
            .map(|s| &s.voice)
    }

    /// Set the waveform for current and future notes.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        for slot in self.slots.iter_mut().flatten() {
            slot.voice.set_waveform(waveform);
        }
    }

    /// Apply a pitch bend to all sounding notes.
    pub fn set_pitch(&mut self, pitch: f64) {
        for slot in self.slots.iter_mut().flatten() {
            slot.voice.set_pitch(pitch);
        }
    }

    /// Set one amplitude-envelope stage for current and future notes.
    pub fn set_adsr(&mut self, stage: EnvelopeStage, value: f64) {
        self.amp_adsr[stage as usize] = value;
        for slot in self.slots.iter_mut().flatten() {
            slot.voice.set_adsr(stage, value);
        }
    }

    /// Set one filter-envelope stage for current and future notes.
    pub fn set_filter_adsr(&mut self, stage: EnvelopeStage, value: f64) {
        self.filter_adsr[stage as usize] = value;
        for slot in self.slots.iter_mut().flatten() {
            slot.voice.set_filter_adsr(stage, value);
        }
    }

    /// Set the filter cutoff for current and future notes.
    pub fn set_filter_cutoff(&mut self, value: f64) {
        self.filter_cutoff = value;
        for slot in self.slots.iter_mut().flatten() {
            slot.voice.set_filter_cutoff(value);
        }
    }

    /// Set the filter resonance for current and future notes.
    pub fn set_filter_resonance(&mut self, value: f64) {
        self.filter_resonance = value;
        for slot in self.slots.iter_mut().flatten() {
            slot.voice.set_filter_resonance(value);
        }
    }

    /// Mix one sample from all live voices, sweeping out finished ones.
    ///
    /// The sum is returned unclipped; scaling and clipping are the render
    /// loop's job.
    #[inline]
    pub fn process(&mut self) -> f64 {
        let mut out = 0.0;
        for slot in self.slots.iter_mut() {
            match slot {
                Some(s) if s.voice.is_active() => out += s.voice.process(),
                Some(_) => *slot = None,
                None => {}
            }
        }
        out
    }

    fn slot_mut(&mut self, note: u8) -> Option<&mut Slot> {
        self.slots.iter_mut().flatten().find(|s| s.note == note)
    }
}
