//! Error types for tono-core.

use thiserror::Error;

/// Error type for tono-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(#[from] DeviceError),

    #[error("Failed to spawn producer thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl Error {
    /// True for failures of the output device (open or mid-stream).
    pub fn is_device_unavailable(&self) -> bool {
        matches!(self, Error::DeviceUnavailable(_))
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Failures reported by a playback sink or its backend.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("No output device available")]
    NoDevice,

    #[error("Device index {index} out of range ({count} available)")]
    DeviceIndexOutOfRange { index: usize, count: usize },

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Playback sink disconnected")]
    Disconnected,

    #[error("Stream error: {0}")]
    Stream(String),

    #[cfg(feature = "cpal")]
    #[error("Failed to query default stream config")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to enumerate devices")]
    Devices(#[from] cpal::DevicesError),

    #[cfg(feature = "cpal")]
    #[error("Failed to get device name")]
    DeviceName(#[from] cpal::DeviceNameError),
}
