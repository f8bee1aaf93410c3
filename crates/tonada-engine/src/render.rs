//! The render loop and the thread that runs it.
//!
//! Per period the renderer pulls one event per output frame, dispatches it
//! to the voice pool, mixes a mono sample, scales it by the master volume,
//! clips to 16-bit and duplicates it into both stereo slots. The finished
//! block goes to the PCM sink, whose blocking `play` paces the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tonada_dsp::{EnvelopeStage, Polyphonic};

use crate::event::{Event, EventReceiver};
use crate::shared::Controls;
use crate::sink::PcmSink;
use crate::{Error, Result};

/// Convert a mono sample to a signed 16-bit value, clipping out-of-range
/// input to full scale.
#[inline]
pub fn clip(x: f64) -> i16 {
    (32767.0 * x.clamp(-1.0, 1.0)).round() as i16
}

/// One render thread's worth of state: the voice pool, the consumer side of
/// the event queue, and the shared controls.
///
/// [`Renderer::render_period`] is the whole audio path; [`RenderEngine`]
/// merely runs it on a thread against a [`PcmSink`]. Keeping the two apart
/// lets tests drive the renderer synchronously.
pub struct Renderer {
    poly: Polyphonic,
    events: EventReceiver,
    controls: Arc<Controls>,
    /// Waveform last applied to the pool, to detect façade changes.
    waveform: tonada_dsp::Waveform,
}

impl Renderer {
    pub fn new(sample_rate: f64, events: EventReceiver, controls: Arc<Controls>) -> Self {
        let waveform = controls.waveform();
        let mut poly = Polyphonic::new(sample_rate);
        poly.set_waveform(waveform);
        Self {
            poly,
            events,
            controls,
            waveform,
        }
    }

    /// Fill one period of interleaved stereo frames.
    ///
    /// `frames.len()` must be even; each mono sample is written to both
    /// channels of its frame.
    pub fn render_period(&mut self, frames: &mut [i16]) {
        let waveform = self.controls.waveform();
        if waveform != self.waveform {
            self.waveform = waveform;
            self.poly.set_waveform(waveform);
        }

        for frame in frames.chunks_exact_mut(2) {
            let event = self.events.pop();
            self.dispatch(event);
            let sample = clip(self.controls.volume() * self.poly.process());
            frame[0] = sample;
            frame[1] = sample;
        }

        let mask = self.poly.active_mask();
        if mask != self.controls.active_notes() {
            tracing::debug!(voices = self.poly.active_voice_count(), "voice set changed");
        }
        self.controls.publish_active_notes(mask);
    }

    /// Throw away anything left in the event queue. Called once on
    /// shutdown so a dying engine does not strand events.
    pub fn drain_events(&self) {
        self.events.drain();
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::NoteOn { note, velocity } => self.poly.note_on(note, velocity),
            Event::NoteOff { note } => self.poly.note_off(note),
            Event::PitchBend { pitch } => self.poly.set_pitch(pitch),
            Event::Control { id, value } => self.dispatch_control(id, value),
            Event::Empty => {}
        }
    }

    fn dispatch_control(&mut self, id: u8, value: f64) {
        match id {
            1..=4 => self.poly.set_adsr(stage_for(id - 1), value),
            5 => self.poly.set_filter_cutoff(value),
            6 => self.poly.set_filter_resonance(value),
            7..=10 => self.poly.set_filter_adsr(stage_for(id - 7), value),
            // Unknown controller ids are spurious input, ignored
            _ => {}
        }
    }
}

fn stage_for(index: u8) -> EnvelopeStage {
    match index {
        0 => EnvelopeStage::Attack,
        1 => EnvelopeStage::Decay,
        2 => EnvelopeStage::Sustain,
        _ => EnvelopeStage::Release,
    }
}

/// Owns the render thread.
///
/// The loop checks a shared running flag at every period boundary;
/// [`RenderEngine::stop`] clears the flag and joins, and dropping the
/// engine does the same.
pub struct RenderEngine {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RenderEngine {
    /// Spawn the render thread. The sink's period size fixes the buffer
    /// length for the thread's lifetime; nothing allocates after this.
    pub fn start(mut renderer: Renderer, mut sink: Box<dyn PcmSink + Send>) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let thread = thread::Builder::new()
            .name("tonada-render".into())
            .spawn(move || {
                let period = sink.period_samples();
                tracing::info!(rate = sink.rate(), period, "render thread started");
                let mut frames = vec![0i16; period];

                while flag.load(Ordering::Acquire) {
                    renderer.render_period(&mut frames);
                    if let Err(err) = sink.play(&frames) {
                        tracing::error!(%err, "PCM sink failed, stopping render thread");
                        break;
                    }
                }

                renderer.drain_events();
                tracing::info!("render thread stopped");
            })
            .map_err(Error::Thread)?;

        Ok(Self {
            running,
            thread: Some(thread),
        })
    }

    /// Clear the running flag and join the render thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
