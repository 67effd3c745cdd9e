//! Test helpers and fixtures for tono integration tests
//!
//! Engines are built on the in-memory [`CaptureBackend`] so every test runs
//! without audio hardware and can inspect exactly what the device received.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (gain, clamping)
//! - `DSP_EPSILON` (1e-4): Oscillator vs. reference sine
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tono::prelude::*;
use tono::{CaptureBackend, CaptureReceiver};

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: u32 = 48_000;

/// Producer block size used by test engines
pub const TEST_BLOCK_FRAMES: usize = 512;

/// How long tests wait for audio or state changes before failing
pub const TEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Engine wired to a capture backend, plus handles to inspect it.
pub struct CaptureFixture {
    pub engine: ToneEngine,
    pub backend: Arc<CaptureBackend>,
    pub rx: CaptureReceiver,
}

/// Test engine whose capture queue holds `capacity_blocks` blocks.
pub fn capture_engine_with(capacity_blocks: usize, builder: ToneEngineBuilder) -> CaptureFixture {
    let (backend, rx) = CaptureBackend::new(capacity_blocks);
    let backend = Arc::new(backend);
    let engine = builder
        .sample_rate(TEST_SAMPLE_RATE)
        .block_frames(TEST_BLOCK_FRAMES)
        .device_buffer_frames(TEST_BLOCK_FRAMES * 2)
        .backend(backend.clone())
        .build()
        .expect("Failed to create test engine");

    CaptureFixture {
        engine,
        backend,
        rx,
    }
}

/// Test engine with default parameters and a roomy capture queue.
pub fn capture_engine() -> CaptureFixture {
    capture_engine_with(64, ToneEngine::builder())
}

/// Generate a reference sine: `amplitude * sin(2*pi*f*n/sr)`.
pub fn generate_sine(frequency: f64, amplitude: f64, sample_rate: u32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            (amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()) as f32
        })
        .collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Estimate frequency from rising zero crossings.
pub fn estimate_frequency(samples: &[f32], sample_rate: u32) -> f64 {
    let crossings: Vec<usize> = samples
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] < 0.0 && w[1] >= 0.0)
        .map(|(i, _)| i)
        .collect();

    if crossings.len() < 2 {
        return 0.0;
    }

    let cycles = (crossings.len() - 1) as f64;
    let span = (crossings[crossings.len() - 1] - crossings[0]) as f64;
    cycles * sample_rate as f64 / span
}

/// Largest absolute difference between consecutive samples.
pub fn max_step(samples: &[f32]) -> f32 {
    samples
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(0.0_f32, f32::max)
}

/// Check if audio is silent (all samples below threshold).
pub fn is_silent(samples: &[f32], threshold: f32) -> bool {
    samples.iter().all(|&s| s.abs() <= threshold)
}

/// Result of comparing two audio buffers.
#[derive(Debug, Clone)]
pub struct AudioComparisonResult {
    /// Whether all samples are within tolerance.
    pub equal: bool,
    /// Maximum absolute difference between any two samples.
    pub max_diff: f32,
    /// Index of first sample that exceeds tolerance (if any).
    pub first_diff_sample: Option<usize>,
    /// Number of samples that exceed tolerance.
    pub num_diffs: usize,
}

/// Compare two audio buffers with epsilon tolerance.
pub fn compare_audio(a: &[f32], b: &[f32], epsilon: f32) -> AudioComparisonResult {
    if a.len() != b.len() {
        return AudioComparisonResult {
            equal: false,
            max_diff: f32::MAX,
            first_diff_sample: Some(0),
            num_diffs: a.len().max(b.len()),
        };
    }

    let mut max_diff: f32 = 0.0;
    let mut first_diff = None;
    let mut num_diffs = 0;

    for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
        let diff = (x - y).abs();
        max_diff = max_diff.max(diff);
        if diff > epsilon {
            num_diffs += 1;
            first_diff.get_or_insert(i);
        }
    }

    AudioComparisonResult {
        equal: num_diffs == 0,
        max_diff,
        first_diff_sample: first_diff,
        num_diffs,
    }
}

/// Assert two signals are equal within tolerance, with detailed error message.
pub fn assert_signals_equal(a: &[f32], b: &[f32], epsilon: f32, context: &str) {
    let result = compare_audio(a, b, epsilon);
    assert!(
        result.equal,
        "{}: Signals differ - first diff at sample {:?}, max_diff={:.6}, num_diffs={}",
        context, result.first_diff_sample, result.max_diff, result.num_diffs
    );
}

/// Assert signal is silent within threshold.
pub fn assert_is_silent(samples: &[f32], threshold: f32, context: &str) {
    let max_val = peak(samples);
    assert!(
        max_val <= threshold,
        "{}: Expected silence (threshold {}), but peak was {}",
        context,
        threshold,
        max_val
    );
}

/// Assert signal is NOT silent (has content above threshold).
pub fn assert_not_silent(samples: &[f32], min_peak: f32, context: &str) {
    let max_val = peak(samples);
    assert!(
        max_val >= min_peak,
        "{}: Expected audio (min_peak {}), but peak was only {}",
        context,
        min_peak,
        max_val
    );
}

/// Wait until the engine reaches `expected`.
pub fn wait_for_state(engine: &ToneEngine, expected: SessionState, max_wait: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < max_wait {
        if engine.state() == expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

/// Receive and discard `blocks` blocks (queued audio rendered with old parameters).
pub fn skip_blocks(rx: &CaptureReceiver, blocks: usize) {
    for _ in 0..blocks {
        if rx.recv_block(TEST_TIMEOUT).is_none() {
            break;
        }
    }
}
