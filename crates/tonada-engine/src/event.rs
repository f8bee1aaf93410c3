//! Control events and the producer/consumer queue between the MIDI thread
//! and the render thread.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// Queue depth. MIDI runs at a few hundred events per second against a
/// drain rate of one event per output frame, so this is effectively
/// bottomless; note events are never dropped in practice.
pub const QUEUE_CAPACITY: usize = 1024;

/// A control event, applied at frame granularity by the render loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Start or retrigger a note. Velocity is normalised to [0, 1].
    NoteOn { note: u8, velocity: f64 },
    /// Release a note.
    NoteOff { note: u8 },
    /// Pitch-bend all sounding notes, normalised to [-1, 1].
    PitchBend { pitch: f64 },
    /// Continuous controller: ids 1-4 set the amplitude ADSR, 5 the filter
    /// cutoff, 6 the resonance, 7-10 the filter ADSR. Value in [0, 1].
    Control { id: u8, value: f64 },
    /// Nothing to do this frame.
    Empty,
}

/// Create a connected producer/consumer pair.
pub fn event_queue() -> (EventSender, EventReceiver) {
    let (tx, rx) = bounded(QUEUE_CAPACITY);
    (
        EventSender {
            tx,
            overflow_rx: rx.clone(),
        },
        EventReceiver { rx },
    )
}

/// Producer handle. Cloneable; both the MIDI thread and the façade hold one.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<Event>,
    /// Used only to discard the oldest event when the queue overflows.
    overflow_rx: Receiver<Event>,
}

impl EventSender {
    /// Enqueue an event. Never blocks: if the consumer has stalled long
    /// enough to fill the queue, the oldest queued event is discarded to
    /// make room.
    pub fn push(&self, event: Event) {
        if let Err(TrySendError::Full(event)) = self.tx.try_send(event) {
            let dropped = self.overflow_rx.try_recv().ok();
            tracing::warn!(?dropped, "event queue full, dropped oldest event");
            let _ = self.tx.try_send(event);
        }
    }
}

/// Consumer handle, owned by the render thread.
pub struct EventReceiver {
    rx: Receiver<Event>,
}

impl EventReceiver {
    /// Dequeue the next event, or [`Event::Empty`] if none is waiting.
    /// Never blocks.
    #[inline]
    pub fn pop(&self) -> Event {
        self.rx.try_recv().unwrap_or(Event::Empty)
    }

    /// Discard everything still queued. Called on shutdown.
    pub fn drain(&self) {
        while self.rx.try_recv().is_ok() {}
    }
}
