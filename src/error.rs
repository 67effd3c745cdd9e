//! Centralized error type for the tono umbrella crate.
//!
//! Wraps core errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tono_core::Error),

    #[error(transparent)]
    Device(#[from] tono_core::DeviceError),
}

impl Error {
    /// True when the output device could not be opened or failed mid-stream.
    pub fn is_device_unavailable(&self) -> bool {
        match self {
            Error::Core(e) => e.is_device_unavailable(),
            Error::Device(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
