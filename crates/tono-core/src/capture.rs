//! In-memory playback backend.
//!
//! Blocks travel over a bounded channel to a [`CaptureReceiver`]. A full
//! channel blocks the producer the way a full device buffer would. If nobody
//! drains it for longer than one device buffer, the block is dropped and
//! counted as an overrun so the producer can still observe a stop request.
//! Once the session's cancel flag is set, writes are discarded immediately.
//!
//! Failure injection (`set_fail_open`, `fail_after_blocks`) and open/close
//! counters make device faults and handle leaks observable in tests.

use crate::error::DeviceError;
use crate::lockfree::AtomicFlag;
use crate::sink::{AudioBackend, PlaybackSink, StreamSpec};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const NEVER: usize = usize::MAX;

/// Counters shared by a backend and every sink it opened.
#[derive(Debug, Default)]
pub struct CaptureStats {
    opens: AtomicUsize,
    closes: AtomicUsize,
    blocks_written: AtomicU64,
    blocks_dropped: AtomicU64,
    last_spec: Mutex<Option<StreamSpec>>,
}

impl CaptureStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::Acquire)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::Acquire)
    }

    /// Sinks opened but not yet closed.
    pub fn live_sinks(&self) -> usize {
        self.opens().saturating_sub(self.closes())
    }

    pub fn blocks_written(&self) -> u64 {
        self.blocks_written.load(Ordering::Relaxed)
    }

    /// Blocks discarded because the receiver stalled.
    pub fn blocks_dropped(&self) -> u64 {
        self.blocks_dropped.load(Ordering::Relaxed)
    }

    pub fn last_spec(&self) -> Option<StreamSpec> {
        *self.last_spec.lock()
    }
}

/// Backend whose sinks deliver blocks to a [`CaptureReceiver`].
pub struct CaptureBackend {
    tx: Sender<Vec<f32>>,
    stats: Arc<CaptureStats>,
    fail_open: AtomicFlag,
    fail_after: AtomicUsize,
}

impl CaptureBackend {
    /// `capacity_blocks` blocks can be queued before writes start to block.
    pub fn new(capacity_blocks: usize) -> (Self, CaptureReceiver) {
        let (tx, rx) = bounded(capacity_blocks.max(1));
        let backend = Self {
            tx,
            stats: Arc::new(CaptureStats::default()),
            fail_open: AtomicFlag::new(false),
            fail_after: AtomicUsize::new(NEVER),
        };
        (backend, CaptureReceiver { rx })
    }

    pub fn stats(&self) -> &Arc<CaptureStats> {
        &self.stats
    }

    /// Make `open` fail with [`DeviceError::NoDevice`] while set.
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.set(fail);
    }

    /// Sinks opened from now on fail after accepting `blocks` blocks.
    pub fn fail_after_blocks(&self, blocks: usize) {
        self.fail_after.store(blocks, Ordering::Release);
    }

    /// Sinks opened from now on never fail.
    pub fn clear_failures(&self) {
        self.fail_open.set(false);
        self.fail_after.store(NEVER, Ordering::Release);
    }
}

impl AudioBackend for CaptureBackend {
    fn open(
        &self,
        spec: &StreamSpec,
        cancel: Arc<AtomicFlag>,
    ) -> Result<Box<dyn PlaybackSink>, DeviceError> {
        if self.fail_open.get() {
            return Err(DeviceError::NoDevice);
        }

        self.stats.opens.fetch_add(1, Ordering::AcqRel);
        *self.stats.last_spec.lock() = Some(*spec);

        Ok(Box::new(CaptureSink {
            tx: self.tx.clone(),
            stats: Arc::clone(&self.stats),
            remaining: self.fail_after.load(Ordering::Acquire),
            stall: spec.duration_of(spec.buffer_frames),
            spec: *spec,
            cancel,
        }))
    }

    fn device_name(&self) -> Result<String, DeviceError> {
        Ok(String::from("capture"))
    }
}

struct CaptureSink {
    tx: Sender<Vec<f32>>,
    stats: Arc<CaptureStats>,
    remaining: usize,
    stall: Duration,
    spec: StreamSpec,
    cancel: Arc<AtomicFlag>,
}

impl PlaybackSink for CaptureSink {
    fn stream_spec(&self) -> StreamSpec {
        self.spec
    }

    fn write(&mut self, block: &[f32]) -> Result<(), DeviceError> {
        if self.cancel.get() {
            return Ok(());
        }
        if self.remaining == 0 {
            return Err(DeviceError::Stream("simulated device failure".into()));
        }
        if self.remaining != NEVER {
            self.remaining -= 1;
        }

        match self.tx.send_timeout(block.to_vec(), self.stall) {
            Ok(()) => {
                self.stats.blocks_written.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(SendTimeoutError::Timeout(_)) => {
                self.stats.blocks_dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(SendTimeoutError::Disconnected(_)) => Err(DeviceError::Disconnected),
        }
    }

    fn close(self: Box<Self>) {
        self.stats.closes.fetch_add(1, Ordering::AcqRel);
    }
}

/// Receiving end of a [`CaptureBackend`].
pub struct CaptureReceiver {
    rx: Receiver<Vec<f32>>,
}

impl CaptureReceiver {
    /// Next block, or `None` if none arrives within `timeout`.
    pub fn recv_block(&self, timeout: Duration) -> Option<Vec<f32>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Gather at least `samples` samples (whole blocks), giving up at `timeout`.
    pub fn collect(&self, samples: usize, timeout: Duration) -> Vec<f32> {
        let deadline = Instant::now() + timeout;
        let mut out = Vec::with_capacity(samples);

        while out.len() < samples {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(block) => out.extend_from_slice(&block),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }

        out
    }

    /// Everything queued right now.
    pub fn drain(&self) -> Vec<f32> {
        self.rx.try_iter().flatten().collect()
    }
}
