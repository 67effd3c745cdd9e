//! Phase-accumulator sine oscillator.
//!
//! Phase is kept in cycles (`[0, 1)`) rather than radians so the wrap is a
//! plain `fract()` and precision does not decay over long sessions.

use core::f64::consts::TAU;

/// Advance `phase` by one sample of `frequency_hz` at `sample_rate`.
///
/// The result is always in `[0, 1)`, also for increments larger than one
/// cycle per sample.
#[inline]
pub fn advance_phase(phase: f64, frequency_hz: f64, sample_rate: f64) -> f64 {
    let next = (phase + frequency_hz / sample_rate).fract();
    if next < 0.0 {
        next + 1.0
    } else {
        next
    }
}

/// Sine oscillator state. Owned by the producer thread only.
#[derive(Debug, Clone)]
pub struct Oscillator {
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_phase(sample_rate, 0.0)
    }

    /// Start from an arbitrary phase (in cycles, wrapped into `[0, 1)`).
    pub fn with_phase(sample_rate: f64, phase: f64) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        Self {
            phase: advance_phase(phase, 0.0, sample_rate),
            sample_rate,
        }
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Current sample at `amplitude`, then step the phase by `frequency_hz`.
    #[inline]
    pub fn next_sample(&mut self, frequency_hz: f64, amplitude: f64) -> f32 {
        let value = amplitude * (TAU * self.phase).sin();
        self.phase = advance_phase(self.phase, frequency_hz, self.sample_rate);
        value as f32
    }

    /// Fill `block` with constant frequency and amplitude.
    #[inline]
    pub fn fill(&mut self, block: &mut [f32], frequency_hz: f64, amplitude: f64) {
        for sample in block.iter_mut() {
            *sample = self.next_sample(frequency_hz, amplitude);
        }
    }
}
