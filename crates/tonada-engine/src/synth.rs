//! The public control surface.

use std::sync::Arc;

use tonada_dsp::Waveform;

use crate::Result;
use crate::event::{Event, EventSender, event_queue};
use crate::render::{RenderEngine, Renderer};
use crate::shared::Controls;
use crate::sink::PcmSink;

const DEFAULT_VOLUME: f64 = 1.0;

/// The synthesizer façade.
///
/// Starting a `Synth` spawns the render thread against the given PCM sink;
/// dropping it stops and joins the thread. All methods take `&self`:
/// continuous parameters and notes are posted to the event queue the render
/// thread drains, volume and waveform go through lock-free atomics, and
/// `note_active` reads the bitmask the render thread publishes each period.
/// Nothing here ever blocks on the audio path.
///
/// Out-of-range parameter values are clamped at this boundary, never
/// reported as errors.
///
/// # Example
///
/// ```rust,ignore
/// use tonada_engine::{Synth, Waveform};
///
/// let synth = Synth::start(Box::new(sink))?;
/// synth.set_waveform(Waveform::Saw);
/// synth.set_attack(0.05);
/// synth.note_on(69, 1.0);
/// ```
pub struct Synth {
    controls: Arc<Controls>,
    events: EventSender,
    // Held for Drop: stops and joins the render thread
    _engine: RenderEngine,
}

impl Synth {
    /// Spawn the render thread against `sink` and return the control
    /// surface. The sink decides the sample rate and period size.
    pub fn start(sink: Box<dyn PcmSink + Send>) -> Result<Self> {
        let (events, receiver) = event_queue();
        let controls = Arc::new(Controls::new(DEFAULT_VOLUME, Waveform::Square));
        let renderer = Renderer::new(sink.rate() as f64, receiver, Arc::clone(&controls));
        let engine = RenderEngine::start(renderer, sink)?;
        Ok(Self {
            controls,
            events,
            _engine: engine,
        })
    }

    /// A producer handle for feeding events from another thread (the MIDI
    /// source connects through this).
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    /// Master volume, clamped to [0.0, 1.5]. Default 1.0.
    pub fn set_volume(&self, value: f64) {
        self.controls.set_volume(value.clamp(0.0, 1.5));
    }

    /// Waveform for current and future notes.
    pub fn set_waveform(&self, waveform: Waveform) {
        self.controls.set_waveform(waveform);
    }

    /// Amplitude envelope attack time in seconds, clamped to [0.01, 1.5].
    pub fn set_attack(&self, value: f64) {
        self.control(1, clamp_adsr(value));
    }

    /// Amplitude envelope decay time in seconds, clamped to [0.01, 1.5].
    pub fn set_decay(&self, value: f64) {
        self.control(2, clamp_adsr(value));
    }

    /// Amplitude envelope sustain level, clamped to [0.01, 1.5].
    pub fn set_sustain(&self, value: f64) {
        self.control(3, clamp_adsr(value));
    }

    /// Amplitude envelope release time in seconds, clamped to [0.01, 1.5].
    pub fn set_release(&self, value: f64) {
        self.control(4, clamp_adsr(value));
    }

    /// Filter cutoff, clamped to [0.0, 0.99].
    pub fn set_cutoff(&self, value: f64) {
        self.control(5, value.clamp(0.0, 0.99));
    }

    /// Filter resonance, clamped to [0.0, 0.99].
    pub fn set_resonance(&self, value: f64) {
        self.control(6, value.clamp(0.0, 0.99));
    }

    /// Filter envelope attack time in seconds, clamped to [0.01, 1.5].
    pub fn set_filter_attack(&self, value: f64) {
        self.control(7, clamp_adsr(value));
    }

    /// Filter envelope decay time in seconds, clamped to [0.01, 1.5].
    pub fn set_filter_decay(&self, value: f64) {
        self.control(8, clamp_adsr(value));
    }

    /// Filter envelope sustain level, clamped to [0.01, 1.5].
    pub fn set_filter_sustain(&self, value: f64) {
        self.control(9, clamp_adsr(value));
    }

    /// Filter envelope release time in seconds, clamped to [0.01, 1.5].
    pub fn set_filter_release(&self, value: f64) {
        self.control(10, clamp_adsr(value));
    }

    /// Play a note. Velocity is clamped to [0, 1]; notes above 127 are
    /// ignored.
    pub fn note_on(&self, note: u8, velocity: f64) {
        if note < 128 {
            self.events.push(Event::NoteOn {
                note,
                velocity: velocity.clamp(0.0, 1.0),
            });
        }
    }

    /// Release a note. Releasing a note that is not playing is a no-op.
    /// The note keeps sounding through its envelope's release tail.
    pub fn note_off(&self, note: u8) {
        if note < 128 {
            self.events.push(Event::NoteOff { note });
        }
    }

    /// Whether a note was sounding as of the last rendered period.
    pub fn note_active(&self, note: u8) -> bool {
        self.controls.note_active(note)
    }

    fn control(&self, id: u8, value: f64) {
        self.events.push(Event::Control { id, value });
    }
}

fn clamp_adsr(value: f64) -> f64 {
    value.clamp(0.01, 1.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adsr_clamp_bounds() {
        assert_eq!(clamp_adsr(-1.0), 0.01);
        assert_eq!(clamp_adsr(0.0), 0.01);
        assert_eq!(clamp_adsr(0.5), 0.5);
        assert_eq!(clamp_adsr(2.0), 1.5);
    }
}
