//! Magnitude spectrum of the produced signal for spectrum displays.
//!
//! Runs on the display side over the newest samples of a [`ScopeBuffer`]:
//! Hann window, forward FFT, magnitudes of the bins from DC up to 20 kHz.

use crate::monitor::ScopeBuffer;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

pub const DEFAULT_FFT_SIZE: usize = 4096;

/// Highest frequency reported.
pub const MAX_DISPLAY_HZ: f64 = 20_000.0;

/// Floor of [`Spectrum::relative_db`].
pub const MIN_DB: f32 = -120.0;

/// One analysis frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    sample_rate: u32,
    fft_size: usize,
    magnitudes: Vec<f32>,
}

impl Spectrum {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Bin magnitudes, DC first, up to the last bin at or below 20 kHz.
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Width of one bin in Hz.
    pub fn bin_hz(&self) -> f64 {
        self.sample_rate as f64 / self.fft_size as f64
    }

    pub fn frequency_of(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_hz()
    }

    /// Strongest bin above DC, `None` for silence.
    pub fn peak_bin(&self) -> Option<usize> {
        self.magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, m)| **m > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(bin, _)| bin)
    }

    pub fn peak_frequency(&self) -> Option<f64> {
        self.peak_bin().map(|bin| self.frequency_of(bin))
    }

    /// Magnitudes in dB relative to the strongest bin above DC, clamped to
    /// `MIN_DB..=0`.
    pub fn relative_db(&self) -> Vec<f32> {
        let max = self
            .magnitudes
            .iter()
            .skip(1)
            .fold(1e-9f32, |max, &m| max.max(m));

        self.magnitudes
            .iter()
            .map(|&m| {
                let db = 20.0 * (m / max).log10();
                if db.is_finite() {
                    db.clamp(MIN_DB, 0.0)
                } else {
                    MIN_DB
                }
            })
            .collect()
    }
}

/// Reusable FFT plan, window and work buffer.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    /// `fft_size` is rounded up to a power of two.
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(2).next_power_of_two();

        Self {
            fft: FftPlanner::new().plan_fft_forward(fft_size),
            window: create_hann_window(fft_size),
            buffer: Vec::with_capacity(fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    /// Spectrum of the last `fft_size` samples. Shorter input is zero-padded
    /// in front.
    pub fn analyze(&mut self, samples: &[f32], sample_rate: u32) -> Spectrum {
        let fft_size = self.fft_size();
        let tail = &samples[samples.len().saturating_sub(fft_size)..];
        let pad = fft_size - tail.len();

        self.buffer.clear();
        self.buffer
            .extend(std::iter::repeat(Complex::new(0.0, 0.0)).take(pad));
        self.buffer.extend(
            tail.iter()
                .zip(&self.window[pad..])
                .map(|(s, w)| Complex::new(s * w, 0.0)),
        );

        self.fft.process(&mut self.buffer);

        let bins = display_bins(fft_size, sample_rate);
        Spectrum {
            sample_rate,
            fft_size,
            magnitudes: self.buffer[..bins].iter().map(|c| c.norm()).collect(),
        }
    }

    /// Spectrum of the newest samples in `scope`.
    pub fn analyze_scope(&mut self, scope: &ScopeBuffer, sample_rate: u32) -> Spectrum {
        let samples = scope.latest(self.fft_size());
        self.analyze(&samples, sample_rate)
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_FFT_SIZE)
    }
}

fn create_hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let angle = 2.0 * core::f32::consts::PI * i as f32 / (size - 1) as f32;
            0.5 * (1.0 - angle.cos())
        })
        .collect()
}

/// Bins from DC through the last one at or below [`MAX_DISPLAY_HZ`].
fn display_bins(fft_size: usize, sample_rate: u32) -> usize {
    let bin_hz = sample_rate as f64 / fft_size as f64;
    let last = (MAX_DISPLAY_HZ / bin_hz).floor() as usize;
    (last + 1).min(fft_size / 2)
}
