//! MIDI input via midir.
//!
//! midir runs its callback on a platform thread; that thread is the
//! engine's producer. Raw MIDI bytes are parsed into engine [`Event`]s and
//! pushed straight into the queue — no state is kept here.

use midir::{MidiInput, MidiInputConnection};
use tonada_engine::{Event, EventSender};

use crate::{Error, Result};

const CLIENT_NAME: &str = "tonada";

/// An open MIDI input connection. Dropping it disconnects.
pub struct MidiSource {
    _connection: MidiInputConnection<()>,
}

impl MidiSource {
    /// Enumerate the names of available MIDI input ports.
    pub fn ports() -> Vec<String> {
        let Ok(midi_in) = MidiInput::new(CLIENT_NAME) else {
            return Vec::new();
        };
        midi_in
            .ports()
            .iter()
            .filter_map(|p| midi_in.port_name(p).ok())
            .collect()
    }

    /// Connect to a MIDI input port and feed parsed events into `events`.
    ///
    /// `port` is matched as a case-insensitive substring of the port name;
    /// `None` takes the first available port.
    pub fn connect(port: Option<&str>, events: EventSender) -> Result<Self> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;
        let ports = midi_in.ports();

        let port_handle = match port {
            Some(search) => {
                let search_lower = search.to_lowercase();
                ports
                    .iter()
                    .find(|p| {
                        midi_in
                            .port_name(p)
                            .is_ok_and(|n| n.to_lowercase().contains(&search_lower))
                    })
                    .ok_or_else(|| Error::MidiPortNotFound(search.to_string()))?
            }
            None => ports.first().ok_or(Error::NoMidiPort)?,
        };
        let name = midi_in.port_name(port_handle).unwrap_or_default();

        let connection = midi_in
            .connect(
                port_handle,
                "tonada:in",
                move |_timestamp, bytes, _| {
                    if let Some(event) = parse_midi(bytes) {
                        events.push(event);
                    }
                },
                (),
            )
            .map_err(|e| Error::MidiConnect(e.to_string()))?;

        tracing::info!(port = %name, "MIDI input connected");
        Ok(Self {
            _connection: connection,
        })
    }
}

/// Parse one raw MIDI message into an engine event.
///
/// NoteOn velocity is normalised as `raw/127`, pitch bend as a centred
/// 14-bit value over 8192. Zero-velocity NoteOns, controllers outside the
/// engine's 1..=10 map, and every other status byte are dropped.
fn parse_midi(bytes: &[u8]) -> Option<Event> {
    let status = bytes.first()? & 0xF0;
    match status {
        0x90 if bytes.len() >= 3 && bytes[2] > 0 => Some(Event::NoteOn {
            note: bytes[1] & 0x7F,
            velocity: bytes[2] as f64 / 127.0,
        }),
        0x80 if bytes.len() >= 3 => Some(Event::NoteOff {
            note: bytes[1] & 0x7F,
        }),
        0xE0 if bytes.len() >= 3 => {
            let raw = ((bytes[2] as i32 & 0x7F) << 7) | (bytes[1] as i32 & 0x7F);
            Some(Event::PitchBend {
                pitch: (raw - 8192) as f64 / 8192.0,
            })
        }
        0xB0 if bytes.len() >= 3 && (1..=10).contains(&bytes[1]) => Some(Event::Control {
            id: bytes[1],
            value: bytes[2] as f64 / 127.0,
        }),
        _ => None,
    }
}
