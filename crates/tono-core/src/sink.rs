//! Playback sink abstraction.
//!
//! An [`AudioBackend`] opens a [`PlaybackSink`] per session. The producer
//! thread owns the sink: it writes mono blocks and finally consumes the sink
//! with [`PlaybackSink::close`], so a closed handle cannot be written again.
//!
//! `write` blocks until the device has room for the block. That blocking is
//! the engine's only clock; nothing else paces the producer. A blocked
//! `write` must return once the session's cancel flag is set, even if the
//! device never drains.

use crate::error::DeviceError;
use crate::lockfree::AtomicFlag;
use std::sync::Arc;

/// Stream parameters requested when opening a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames the sink may queue ahead of the device.
    pub buffer_frames: usize,
}

impl StreamSpec {
    /// Playback time of `frames` at this sample rate.
    pub fn duration_of(&self, frames: usize) -> std::time::Duration {
        std::time::Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}

/// Source of playback sinks (an audio host, a capture buffer, ...).
pub trait AudioBackend: Send + Sync {
    /// Open a stream as close to `spec` as the device allows.
    ///
    /// `cancel` is set when the session stops; the sink checks it while
    /// waiting for room.
    fn open(
        &self,
        spec: &StreamSpec,
        cancel: Arc<AtomicFlag>,
    ) -> Result<Box<dyn PlaybackSink>, DeviceError>;

    /// Human-readable name of the device `open` would use.
    fn device_name(&self) -> Result<String, DeviceError> {
        Ok(String::from("unnamed"))
    }
}

/// An open output stream.
pub trait PlaybackSink: Send {
    /// Parameters the stream actually runs at (rate and channels may differ
    /// from the request).
    fn stream_spec(&self) -> StreamSpec;

    /// Queue one block of mono samples, blocking until the sink accepts it
    /// or the cancel flag is set.
    fn write(&mut self, block: &[f32]) -> Result<(), DeviceError>;

    /// Let queued audio play out (bounded wait), then release the device.
    fn close(self: Box<Self>);
}
