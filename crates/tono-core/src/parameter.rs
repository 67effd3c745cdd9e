//! Parameter ranges for the tone controls.
//!
//! Maps normalized control positions (0.0-1.0) to real parameter values and
//! clamps incoming values to the audible range.
//!
//! # Example
//!
//! ```
//! use tono_core::FREQUENCY_RANGE;
//!
//! // A slider at the halfway point lands on the geometric mean of 20 Hz..20 kHz
//! let hz = FREQUENCY_RANGE.denormalize(0.5); // ~632 Hz
//! let back = FREQUENCY_RANGE.normalize(hz); // ~0.5
//! # assert!((back - 0.5).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

/// How a parameter value is scaled between normalized (0-1) and real values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParameterScale {
    /// `real = min + normalized * (max - min)`
    #[default]
    Linear,

    /// `real = min * (max/min)^normalized`
    ///
    /// Requires `min > 0`. Frequency controls use this so each octave gets
    /// the same share of the slider.
    Logarithmic,
}

/// Valid range, default, and scaling of a tone parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub scale: ParameterScale,
}

/// Audible frequency range in Hz, logarithmic, 440 Hz default.
pub const FREQUENCY_RANGE: ParameterRange = ParameterRange {
    min: 20.0,
    max: 20_000.0,
    default: 440.0,
    scale: ParameterScale::Logarithmic,
};

/// Linear amplitude range, 0.5 default.
pub const AMPLITUDE_RANGE: ParameterRange = ParameterRange {
    min: 0.0,
    max: 1.0,
    default: 0.5,
    scale: ParameterScale::Linear,
};

impl ParameterRange {
    /// Convert a real value to normalized (0.0-1.0).
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        let value = self.clamp(value);
        let range = self.max - self.min;

        if range <= 0.0 {
            return 0.0;
        }

        match self.scale {
            ParameterScale::Linear => (value - self.min) / range,
            ParameterScale::Logarithmic if self.min > 0.0 => {
                let log_min = self.min.ln();
                (value.ln() - log_min) / (self.max.ln() - log_min)
            }
            ParameterScale::Logarithmic => (value - self.min) / range,
        }
    }

    /// Convert a normalized value (0.0-1.0) to a real value.
    #[inline]
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = normalized.clamp(0.0, 1.0);

        let value = match self.scale {
            ParameterScale::Linear => self.min + normalized * (self.max - self.min),
            ParameterScale::Logarithmic if self.min > 0.0 => {
                let log_min = self.min.ln();
                (log_min + normalized * (self.max.ln() - log_min)).exp()
            }
            ParameterScale::Logarithmic => self.min + normalized * (self.max - self.min),
        };

        // exp/ln can land a hair outside the endpoints
        self.clamp(value)
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for ParameterRange {
    fn default() -> Self {
        AMPLITUDE_RANGE
    }
}
