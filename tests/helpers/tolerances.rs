//! Tolerance constants for audio testing.
//!
//! Different checks require different precision levels.

/// Floating point rounding errors (for exact gain, clamping).
/// Use for operations that should be mathematically exact.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Oscillator output vs. a closed-form reference sine.
/// Accounts for f64 phase accumulation and the final f32 conversion.
pub const DSP_EPSILON: f32 = 1e-4;

/// Audio perceptual tolerance (~-60dB, inaudible differences).
pub const PERCEPTUAL_EPSILON: f32 = 0.001;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Level meter readings over a block that holds a non-integer number of cycles.
pub const METER_EPSILON: f32 = 0.02;
