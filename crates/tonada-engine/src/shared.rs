//! Lock-free control state shared between the façade and the render thread.
//!
//! Scalar controls the fixed event wire format cannot carry (master volume,
//! waveform) live here as atomics: the façade thread writes, the render
//! thread reads. The render thread publishes its active-note bitmask the
//! same way, so `note_active` queries never touch the voice pool.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use tonada_dsp::Waveform;

/// Shared atomic controls. One instance per synth, behind an `Arc`.
#[derive(Debug)]
pub struct Controls {
    /// Master volume, f64 bit-cast into an AtomicU64.
    volume: AtomicU64,
    /// Waveform discriminant.
    waveform: AtomicU8,
    /// Active-note bitmask, notes 0-63.
    notes_low: AtomicU64,
    /// Active-note bitmask, notes 64-127.
    notes_high: AtomicU64,
}

impl Controls {
    pub fn new(volume: f64, waveform: Waveform) -> Self {
        Self {
            volume: AtomicU64::new(volume.to_bits()),
            waveform: AtomicU8::new(waveform as u8),
            notes_low: AtomicU64::new(0),
            notes_high: AtomicU64::new(0),
        }
    }

    /// Set the master volume (façade thread).
    #[inline]
    pub fn set_volume(&self, volume: f64) {
        self.volume.store(volume.to_bits(), Ordering::Release);
    }

    /// Read the master volume (render thread).
    #[inline]
    pub fn volume(&self) -> f64 {
        f64::from_bits(self.volume.load(Ordering::Acquire))
    }

    /// Select the waveform (façade thread). Applied by the render thread at
    /// the next period boundary.
    #[inline]
    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.store(waveform as u8, Ordering::Release);
    }

    /// Read the selected waveform (render thread).
    #[inline]
    pub fn waveform(&self) -> Waveform {
        Waveform::from_u8(self.waveform.load(Ordering::Acquire))
    }

    /// Publish the sounding-note bitmask (render thread, once per period).
    pub fn publish_active_notes(&self, mask: u128) {
        self.notes_low.store(mask as u64, Ordering::Release);
        self.notes_high.store((mask >> 64) as u64, Ordering::Release);
    }

    /// The last published note bitmask.
    pub fn active_notes(&self) -> u128 {
        let low = self.notes_low.load(Ordering::Acquire) as u128;
        let high = self.notes_high.load(Ordering::Acquire) as u128;
        low | (high << 64)
    }

    /// Whether a note was sounding as of the last published period.
    pub fn note_active(&self, note: u8) -> bool {
        note < 128 && (self.active_notes() >> note) & 1 == 1
    }
}
