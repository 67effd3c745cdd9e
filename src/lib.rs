//! # Tono - Real-time Sine Tone Engine
//!
//! One continuously running sine generator whose frequency and amplitude can
//! be changed from a UI thread while audio plays.
//!
//! ## Architecture
//!
//! Tono is an umbrella crate over:
//! - **tono-core** - Oscillator, parameter store, producer thread, playback sinks
//!
//! A dedicated producer thread reads the latest parameter snapshot once per
//! block, renders the block and blocks on the output device until it has room.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tono::prelude::*;
//!
//! let engine = ToneEngine::builder().build()?;
//!
//! engine.start()?;
//! engine.set_frequency(880.0).set_amplitude(0.3);
//! engine.stop();
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - CPAL device output
//! - `cpal` - CPAL device output (disable to build without system audio libraries)

/// Re-export of tono-core for direct access
pub use tono_core as core;

// Core types
pub use tono_core::{
    AudioBackend,
    CaptureBackend,
    CaptureReceiver,
    DeviceError,
    EngineConfig,
    LevelMeter,
    ParameterRange,
    PlaybackSink,
    ScopeBuffer,
    SessionState,
    Spectrum,
    StreamSpec,
    ToneParams,
    ToneSystem,
    AMPLITUDE_RANGE,
    FREQUENCY_RANGE,
};

#[cfg(feature = "cpal")]
pub use tono_core::CpalBackend;

mod builder;
mod engine;
mod error;

pub use builder::ToneEngineBuilder;
pub use engine::ToneEngine;
pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{ToneEngine, ToneEngineBuilder};

    // Essential types
    pub use crate::core::{EngineConfig, SessionState, ToneParams};

    // Errors
    pub use crate::{Error, Result};
}
