//! Tone engine configuration.

use crate::params::ToneParams;
use crate::sink::StreamSpec;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a [`ToneSystem`](crate::ToneSystem).
///
/// Fixed for the lifetime of the system; parameters that change while audio
/// plays live in the [`ParameterStore`](crate::ParameterStore) instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Preferred device channel count. The device may grant another layout;
    /// the mono tone is copied to every channel it has.
    pub channels: u16,
    /// Frames generated per producer iteration; parameters change only at block boundaries.
    pub block_frames: usize,
    /// Frames the device sink may queue ahead of playback.
    pub device_buffer_frames: usize,
    /// Ramp frequency/amplitude changes instead of jumping.
    pub smoothing: bool,
    /// Ramp length in frames. `None` ramps over one block.
    pub ramp_frames: Option<usize>,
    /// Length of the scope history kept for display.
    pub scope_seconds: f32,
    pub initial: ToneParams,
    /// Output device index. `None` uses the host default.
    pub output_device: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            block_frames: 1024,
            device_buffer_frames: 2048,
            smoothing: true,
            ramp_frames: None,
            scope_seconds: 2.0,
            initial: ToneParams::default(),
            output_device: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8_000..=384_000).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !(1..=8).contains(&self.channels) {
            return Err(Error::InvalidConfig(format!(
                "channels {} out of range (1-8)",
                self.channels
            )));
        }
        if !(16..=16_384).contains(&self.block_frames) {
            return Err(Error::InvalidConfig(format!(
                "block_frames {} out of range (16-16384)",
                self.block_frames
            )));
        }
        if self.device_buffer_frames < self.block_frames {
            return Err(Error::InvalidConfig(format!(
                "device_buffer_frames {} smaller than block_frames {}",
                self.device_buffer_frames, self.block_frames
            )));
        }
        if self.ramp_frames == Some(0) {
            return Err(Error::InvalidConfig("ramp_frames must be positive".into()));
        }
        if !(self.scope_seconds > 0.0 && self.scope_seconds <= 30.0) {
            return Err(Error::InvalidConfig(format!(
                "scope_seconds {} out of range (0-30 s)",
                self.scope_seconds
            )));
        }
        Ok(())
    }

    pub fn stream_spec(&self) -> StreamSpec {
        StreamSpec {
            sample_rate: self.sample_rate,
            channels: self.channels,
            buffer_frames: self.device_buffer_frames,
        }
    }

    /// Frames over which a parameter change is ramped.
    pub fn ramp_len(&self) -> usize {
        self.ramp_frames.unwrap_or(self.block_frames)
    }

    /// Samples held by the scope ring.
    pub fn scope_capacity(&self) -> usize {
        ((self.scope_seconds as f64 * self.sample_rate as f64) as usize).max(self.block_frames)
    }
}
