//! Builder for configuring and constructing a `ToneEngine`.

use crate::core::{AudioBackend, EngineConfig, ToneSystemBuilder};
use crate::{Result, ToneEngine};
use std::sync::Arc;

/// The engine is built stopped; call [`ToneEngine::start`] to open the device.
///
/// # Example
///
/// ```ignore
/// use tono::prelude::*;
///
/// let engine = ToneEngine::builder()
///     .sample_rate(48_000)
///     .channels(2)
///     .frequency(261.63)
///     .amplitude_percent(30.0)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ToneEngineBuilder {
    core: ToneSystemBuilder,
}

impl ToneEngineBuilder {
    /// Replace the whole configuration (e.g. one loaded from JSON).
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.core = self.core.config(config);
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.core = self.core.sample_rate(rate);
        self
    }

    /// Preferred device channels. Default: 1
    pub fn channels(mut self, count: u16) -> Self {
        self.core = self.core.channels(count);
        self
    }

    /// Default: 1024
    pub fn block_frames(mut self, frames: usize) -> Self {
        self.core = self.core.block_frames(frames);
        self
    }

    /// Default: 2048
    pub fn device_buffer_frames(mut self, frames: usize) -> Self {
        self.core = self.core.device_buffer_frames(frames);
        self
    }

    /// Default: true
    pub fn smoothing(mut self, enabled: bool) -> Self {
        self.core = self.core.smoothing(enabled);
        self
    }

    pub fn ramp_frames(mut self, frames: usize) -> Self {
        self.core = self.core.ramp_frames(frames);
        self
    }

    /// Default: 2.0
    pub fn scope_seconds(mut self, seconds: f32) -> Self {
        self.core = self.core.scope_seconds(seconds);
        self
    }

    /// Default: 440.0
    pub fn frequency(mut self, frequency_hz: f64) -> Self {
        self.core = self.core.frequency(frequency_hz);
        self
    }

    /// Default: 0.5
    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.core = self.core.amplitude(amplitude);
        self
    }

    pub fn amplitude_percent(self, percent: f64) -> Self {
        self.amplitude(percent / 100.0)
    }

    pub fn output_device(mut self, index: usize) -> Self {
        self.core = self.core.output_device(index);
        self
    }

    /// Play through a custom backend instead of the default device.
    pub fn backend(mut self, backend: Arc<dyn AudioBackend>) -> Self {
        self.core = self.core.backend(backend);
        self
    }

    pub fn build(self) -> Result<ToneEngine> {
        Ok(ToneEngine::from_core(self.core.build()?))
    }
}
