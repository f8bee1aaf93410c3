//! The PCM consumer the render loop feeds.

use crate::Result;

/// A blocking sink for interleaved signed 16-bit stereo frames.
///
/// The render thread calls [`PcmSink::play`] once per period;
/// implementations block until the device has accepted the block, which is
/// what paces the render loop. The real implementation lives in
/// `tonada-io`; tests substitute their own.
pub trait PcmSink: Send {
    /// Samples per second.
    fn rate(&self) -> u32;

    /// Render-buffer length in interleaved samples (frames × channels).
    /// Always even: the render loop writes stereo pairs.
    fn period_samples(&self) -> usize;

    /// Hand one period of interleaved samples to the device, blocking until
    /// it has been accepted.
    fn play(&mut self, samples: &[i16]) -> Result<()>;
}
