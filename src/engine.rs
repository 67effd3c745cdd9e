//! ToneEngine: the control surface handed to UI code.

use crate::core::{
    DeviceError, EngineConfig, LevelMeter, ScopeBuffer, SessionState, Spectrum, StreamSpec,
    ToneParams, ToneSystem, FREQUENCY_RANGE,
};
use crate::Result;
use std::sync::Arc;

/// Main tone engine.
///
/// ToneEngine wraps tono-core's ToneSystem and adds the conversions a control
/// panel needs: percentage amplitude, normalized (logarithmic) frequency
/// sliders and a start/stop toggle.
///
/// # Example
///
/// ```ignore
/// use tono::prelude::*;
///
/// let engine = ToneEngine::builder().frequency(440.0).build()?;
///
/// engine.start()?;
/// engine.set_amplitude_percent(25.0).set_frequency(880.0);
/// engine.stop();
/// ```
pub struct ToneEngine {
    /// Core tone system (always present)
    core: ToneSystem,
}

impl ToneEngine {
    /// Create a new engine builder
    pub fn builder() -> crate::ToneEngineBuilder {
        crate::ToneEngineBuilder::default()
    }

    pub(crate) fn from_core(core: ToneSystem) -> Self {
        Self { core }
    }

    /// Access the underlying core system.
    pub fn core(&self) -> &ToneSystem {
        &self.core
    }

    pub fn config(&self) -> &EngineConfig {
        self.core.config()
    }

    /// Sample rate the device runs at (the configured one before the first start)
    pub fn sample_rate(&self) -> u32 {
        self.core.sample_rate()
    }

    /// Rate and channel layout the device granted for the latest stream.
    pub fn stream_spec(&self) -> Option<StreamSpec> {
        self.core.stream_spec()
    }

    /// Open the output device and start the tone.
    pub fn start(&self) -> Result<()> {
        Ok(self.core.start()?)
    }

    /// Stop the tone and release the output device.
    pub fn stop(&self) {
        self.core.stop();
    }

    /// Start when stopped, stop otherwise. Returns whether audio is now running.
    pub fn toggle(&self) -> Result<bool> {
        if self.core.state().is_active() {
            self.core.stop();
        } else {
            self.core.start()?;
        }
        Ok(self.core.is_running())
    }

    /// Check if audio is running
    pub fn is_running(&self) -> bool {
        self.core.is_running()
    }

    pub fn state(&self) -> SessionState {
        self.core.state()
    }

    /// Set frequency in Hz (clamped to 20..=20000).
    pub fn set_frequency(&self, frequency_hz: f64) -> &Self {
        self.core.set_frequency(frequency_hz);
        self
    }

    /// Set amplitude as a linear gain (clamped to 0..=1).
    pub fn set_amplitude(&self, amplitude: f64) -> &Self {
        self.core.set_amplitude(amplitude);
        self
    }

    /// Set amplitude from a 0-100 percentage.
    pub fn set_amplitude_percent(&self, percent: f64) -> &Self {
        self.core.set_amplitude(percent / 100.0);
        self
    }

    /// Set frequency from a slider position in `0.0..=1.0` (logarithmic).
    pub fn set_frequency_normalized(&self, position: f64) -> &Self {
        self.core.set_frequency(FREQUENCY_RANGE.denormalize(position));
        self
    }

    /// Current frequency as a slider position in `0.0..=1.0`.
    pub fn frequency_normalized(&self) -> f64 {
        FREQUENCY_RANGE.normalize(self.core.params().frequency_hz)
    }

    pub fn frequency(&self) -> f64 {
        self.core.params().frequency_hz
    }

    pub fn amplitude(&self) -> f64 {
        self.core.params().amplitude
    }

    /// Amplitude as a 0-100 percentage.
    pub fn amplitude_percent(&self) -> f64 {
        self.core.params().amplitude * 100.0
    }

    /// Mute/unmute the tone without closing the device.
    pub fn set_enabled(&self, enabled: bool) -> &Self {
        self.core.set_enabled(enabled);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    /// Latest parameter snapshot (for redrawing controls).
    pub fn params(&self) -> ToneParams {
        self.core.params()
    }

    /// Recently produced samples for an oscilloscope view.
    pub fn scope(&self) -> &Arc<ScopeBuffer> {
        self.core.scope()
    }

    /// Peak/RMS of the latest block.
    pub fn meter(&self) -> &Arc<LevelMeter> {
        self.core.meter()
    }

    /// FFT magnitude spectrum of the newest scope samples, for a spectrum view.
    pub fn spectrum(&self) -> Spectrum {
        self.core.spectrum()
    }

    /// Device error that ended the last session, if any.
    pub fn take_last_error(&self) -> Option<DeviceError> {
        self.core.take_last_error()
    }

    /// List available output devices
    #[cfg(feature = "cpal")]
    pub fn list_output_devices() -> Result<Vec<String>> {
        Ok(crate::core::CpalBackend::list_output_devices()?)
    }

    /// Get current output device name
    pub fn current_output_device_name(&self) -> Result<String> {
        Ok(self.core.device_name()?)
    }
}
