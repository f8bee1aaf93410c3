//! cpal-backed PCM output with blocking `play` semantics.
//!
//! cpal pulls audio through a callback; the render loop pushes blocks.
//! The two meet over a bounded channel of recycled i16 period buffers:
//! [`CpalSink::play`] copies a period into a buffer and sends it, blocking
//! when the device is ahead — which is exactly what paces the render
//! thread. The callback drains buffers into the device and emits silence
//! (counting an underrun) when none is ready.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, bounded};
use tonada_engine::PcmSink;

use crate::{Error, Result};

/// Fixed output sample rate.
pub const SAMPLE_RATE: u32 = 44_100;
/// Stereo output; the render loop duplicates its mono signal.
pub const CHANNELS: u16 = 2;
/// Frames per render period (~11.6 ms at 44.1 kHz).
pub const PERIOD_FRAMES: usize = 512;

/// Periods buffered between the render thread and the device. Two in
/// flight plus the one being filled keeps latency low without starving
/// the callback.
const QUEUE_PERIODS: usize = 3;

/// The device half: owns the cpal stream.
///
/// cpal streams are not `Send`, so this half stays on the thread that
/// opened it (keep it alive for the duration of playback) while the
/// [`CpalSink`] half moves into the render thread.
pub struct CpalOutput {
    underruns: Arc<AtomicU64>,
    _stream: cpal::Stream,
}

impl CpalOutput {
    /// Open the default output device, or the first one whose name
    /// contains `device_name`, and start the stream.
    ///
    /// Returns the device half and the [`CpalSink`] to hand to the engine.
    pub fn open(device_name: Option<&str>) -> Result<(Self, CpalSink)> {
        let host = cpal::default_host();
        let device = find_output_device(&host, device_name)?;
        let name = device.name().unwrap_or_else(|_| "<unknown>".into());

        let config = cpal::StreamConfig {
            channels: CHANNELS,
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        let (filled_tx, filled_rx) = bounded::<Vec<i16>>(QUEUE_PERIODS);
        let (free_tx, free_rx) = bounded::<Vec<i16>>(QUEUE_PERIODS + 1);

        let underruns = Arc::new(AtomicU64::new(0));
        let callback_underruns = Arc::clone(&underruns);

        let mut feeder = CallbackFeeder {
            filled_rx,
            free_tx,
            pending: None,
            started: false,
            underruns: callback_underruns,
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| feeder.fill(data),
                move |err| tracing::warn!(%err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;

        tracing::info!(
            device = %name,
            rate = SAMPLE_RATE,
            channels = CHANNELS,
            period_frames = PERIOD_FRAMES,
            "output stream started"
        );

        let output = Self {
            underruns,
            _stream: stream,
        };
        let sink = CpalSink {
            filled_tx,
            free_rx,
        };
        Ok((output, sink))
    }

    /// Number of callback underruns since the stream started.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        let underruns = self.underruns();
        if underruns > 0 {
            tracing::warn!(underruns, "output stream had underruns");
        }
    }
}

/// The engine half: implements the blocking [`PcmSink`] contract.
pub struct CpalSink {
    filled_tx: Sender<Vec<i16>>,
    free_rx: Receiver<Vec<i16>>,
}

impl PcmSink for CpalSink {
    fn rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn period_samples(&self) -> usize {
        PERIOD_FRAMES * CHANNELS as usize
    }

    fn play(&mut self, samples: &[i16]) -> tonada_engine::Result<()> {
        // Reuse a returned buffer when one is available; the pool warms up
        // over the first few periods and is allocation-free after that.
        let mut block = self
            .free_rx
            .try_recv()
            .unwrap_or_else(|_| Vec::with_capacity(samples.len()));
        block.clear();
        block.extend_from_slice(samples);

        self.filled_tx
            .send(block)
            .map_err(|_| tonada_engine::Error::Sink("output stream closed".into()))
    }
}

/// Callback-side state: the block currently being drained into the device.
struct CallbackFeeder {
    filled_rx: Receiver<Vec<i16>>,
    free_tx: Sender<Vec<i16>>,
    pending: Option<(Vec<i16>, usize)>,
    /// Set once the first block arrives; silence before that is stream
    /// warm-up, not an underrun.
    started: bool,
    underruns: Arc<AtomicU64>,
}

impl CallbackFeeder {
    fn fill(&mut self, data: &mut [f32]) {
        let mut i = 0;
        while i < data.len() {
            if self.pending.is_none() {
                match self.filled_rx.try_recv() {
                    Ok(block) => {
                        self.started = true;
                        self.pending = Some((block, 0));
                    }
                    Err(_) => {
                        for sample in &mut data[i..] {
                            *sample = 0.0;
                        }
                        if self.started {
                            self.underruns.fetch_add(1, Ordering::Relaxed);
                        }
                        return;
                    }
                }
            }

            let finished = if let Some((block, offset)) = &mut self.pending {
                while i < data.len() && *offset < block.len() {
                    data[i] = block[*offset] as f32 / 32768.0;
                    i += 1;
                    *offset += 1;
                }
                *offset >= block.len()
            } else {
                false
            };

            if finished && let Some((block, _)) = self.pending.take() {
                // Recycle; if the pool is full the buffer just dies
                let _ = self.free_tx.try_send(block);
            }
        }
    }
}

fn find_output_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    match name {
        Some(search) => {
            let search_lower = search.to_lowercase();
            let devices = host
                .output_devices()
                .map_err(|e| Error::Stream(e.to_string()))?;
            for device in devices {
                if let Ok(device_name) = device.name()
                    && device_name.to_lowercase().contains(&search_lower)
                {
                    return Ok(device);
                }
            }
            Err(Error::DeviceNotFound(search.to_string()))
        }
        None => host.default_output_device().ok_or(Error::NoDevice),
    }
}

/// List the names of all output devices.
pub fn list_output_devices() -> Vec<String> {
    let host = cpal::default_host();
    match host.output_devices() {
        Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_is_stereo_frame_count() {
        // period_samples must be frames * channels and even
        assert_eq!(PERIOD_FRAMES * CHANNELS as usize, 1024);
        assert_eq!((PERIOD_FRAMES * CHANNELS as usize) % 2, 0);
    }

    #[test]
    fn feeder_drains_blocks_and_counts_underruns() {
        let (filled_tx, filled_rx) = bounded::<Vec<i16>>(4);
        let (free_tx, free_rx) = bounded::<Vec<i16>>(4);
        let underruns = Arc::new(AtomicU64::new(0));
        let mut feeder = CallbackFeeder {
            filled_rx,
            free_tx,
            pending: None,
            started: false,
            underruns: Arc::clone(&underruns),
        };

        // Warm-up silence is not an underrun
        let mut out = [1.0f32; 8];
        feeder.fill(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(underruns.load(Ordering::Relaxed), 0);

        // One block of full-scale samples, drained across two callbacks
        filled_tx.send(vec![16384i16; 16]).expect("queue open");
        let mut first = [0.0f32; 8];
        feeder.fill(&mut first);
        assert!(first.iter().all(|&s| (s - 0.5).abs() < 1e-6));

        let mut second = [0.0f32; 8];
        feeder.fill(&mut second);
        assert!(second.iter().all(|&s| (s - 0.5).abs() < 1e-6));

        // Block finished: it must come back on the free channel
        assert_eq!(free_rx.try_recv().map(|b| b.len()), Ok(16));

        // Now the queue is empty and the stream has started: underrun
        let mut starved = [1.0f32; 8];
        feeder.fill(&mut starved);
        assert!(starved.iter().all(|&s| s == 0.0));
        assert_eq!(underruns.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn feeder_spans_callback_larger_than_block() {
        let (filled_tx, filled_rx) = bounded::<Vec<i16>>(4);
        let (free_tx, _free_rx) = bounded::<Vec<i16>>(4);
        let mut feeder = CallbackFeeder {
            filled_rx,
            free_tx,
            pending: None,
            started: false,
            underruns: Arc::new(AtomicU64::new(0)),
        };

        filled_tx.send(vec![16384i16; 4]).expect("queue open");
        filled_tx.send(vec![-16384i16; 4]).expect("queue open");

        let mut out = [0.0f32; 8];
        feeder.fill(&mut out);
        assert!(out[..4].iter().all(|&s| (s - 0.5).abs() < 1e-6));
        assert!(out[4..].iter().all(|&s| (s + 0.5).abs() < 1e-6));
    }
}
