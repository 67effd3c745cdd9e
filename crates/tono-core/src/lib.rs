//! Real-time sine tone core: oscillator, parameter snapshots, producer thread
//! and playback sinks.
//!
//! # Primary API
//!
//! - [`ToneSystem`] / [`ToneSystemBuilder`]: Main entry point
//! - [`ParameterStore`]: Lock-free frequency/amplitude snapshots
//! - [`AudioBackend`] / [`PlaybackSink`]: Output abstraction
//! - [`ScopeBuffer`] / [`LevelMeter`]: Monitor taps for displays
//! - [`SpectrumAnalyzer`]: FFT magnitude spectrum over the scope history
//!
//! # Feature-gated APIs
//!
//! - `"cpal"`: [`CpalBackend`] device output (enabled by default)
//!
//! # Example
//!
//! ```ignore
//! use tono_core::ToneSystem;
//!
//! let system = ToneSystem::builder().frequency(440.0).build()?;
//! system.start()?;
//! system.set_frequency(880.0);
//! system.set_amplitude(0.25);
//! system.stop();
//! ```

pub mod error;
pub use error::{DeviceError, Error, Result};

mod system;
pub use system::{ToneSystem, ToneSystemBuilder};

pub mod config;
pub use config::EngineConfig;

pub mod session;
pub use session::{AtomicSession, SessionState};

pub mod oscillator;
pub use oscillator::{advance_phase, Oscillator};

pub mod params;
pub use params::{ParameterStore, ToneParams};

pub mod producer;
pub use producer::Producer;

pub mod sink;
pub use sink::{AudioBackend, PlaybackSink, StreamSpec};

pub mod capture;
pub use capture::{CaptureBackend, CaptureReceiver, CaptureStats};

#[cfg(feature = "cpal")]
pub mod output;

#[cfg(feature = "cpal")]
pub use output::CpalBackend;

pub mod monitor;
pub use monitor::{LevelMeter, ScopeBuffer};

pub mod spectrum;
pub use spectrum::{Spectrum, SpectrumAnalyzer};

pub(crate) mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat};

pub mod parameter;
pub use parameter::{ParameterRange, ParameterScale, AMPLITUDE_RANGE, FREQUENCY_RANGE};

pub mod smooth;
pub use smooth::SmoothedValue;
