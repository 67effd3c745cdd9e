//! Lock-free taps on the produced signal for oscilloscope and level displays.
//!
//! The producer publishes each finished block here before handing it to the
//! sink. Display code reads at its own pace; a reader racing a write may see
//! a mix of the two blocks in the overlapping region, which only affects
//! what is drawn, never the audio.

use crate::lockfree::AtomicFloat;
use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Ring of the most recently produced samples.
pub struct ScopeBuffer {
    samples: Box<[AtomicF32]>,
    /// Total samples ever written; the ring position is this modulo capacity.
    written: AtomicUsize,
}

impl ScopeBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: (0..capacity).map(|_| AtomicF32::new(0.0)).collect(),
            written: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Total samples written since creation or the last [`clear`](Self::clear).
    pub fn write_index(&self) -> usize {
        self.written.load(Ordering::Acquire)
    }

    /// Producer side. Allocation-free.
    #[inline]
    pub fn push_block(&self, block: &[f32]) {
        let capacity = self.samples.len();
        let start = self.written.load(Ordering::Relaxed);

        // Only the tail of an oversized block survives anyway
        let skip = block.len().saturating_sub(capacity);
        for (offset, &sample) in block.iter().enumerate().skip(skip) {
            self.samples[(start + offset) % capacity].store(sample, Ordering::Relaxed);
        }

        self.written
            .store(start.wrapping_add(block.len()), Ordering::Release);
    }

    /// Copy the whole history into `out`, oldest sample first.
    pub fn snapshot_into(&self, out: &mut Vec<f32>) {
        self.latest_into(self.capacity(), out);
    }

    /// The newest `count` samples (fewer if not yet produced), oldest first.
    pub fn latest(&self, count: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(count.min(self.capacity()));
        self.latest_into(count, &mut out);
        out
    }

    fn latest_into(&self, count: usize, out: &mut Vec<f32>) {
        out.clear();

        let capacity = self.samples.len();
        let end = self.written.load(Ordering::Acquire);
        let count = count.min(capacity).min(end);

        out.extend(
            (end - count..end).map(|i| self.samples[i % capacity].load(Ordering::Relaxed)),
        );
    }

    pub fn clear(&self) {
        for sample in self.samples.iter() {
            sample.store(0.0, Ordering::Relaxed);
        }
        self.written.store(0, Ordering::Release);
    }
}

/// Peak and RMS of the most recent block.
#[derive(Default)]
pub struct LevelMeter {
    peak: AtomicFloat,
    rms: AtomicFloat,
    blocks: AtomicU64,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&self, block: &[f32]) {
        if block.is_empty() {
            return;
        }

        let mut peak = 0.0f32;
        let mut sum_sq = 0.0f32;
        for &sample in block {
            peak = peak.max(sample.abs());
            sum_sq += sample * sample;
        }

        self.peak.set(peak);
        self.rms.set((sum_sq / block.len() as f32).sqrt());
        self.blocks.fetch_add(1, Ordering::Relaxed);
    }

    /// `(peak, rms)` of the last block.
    #[inline]
    pub fn levels(&self) -> (f32, f32) {
        (self.peak.get(), self.rms.get())
    }

    /// Blocks produced so far.
    pub fn blocks(&self) -> u64 {
        self.blocks.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.peak.set(0.0);
        self.rms.set(0.0);
    }
}
