//! Tone parameter snapshots shared between the control thread and the producer.
//!
//! ```text
//! ┌──────────────┐   publish (RCU)   ┌──────────────────┐   load    ┌──────────┐
//! │ ToneSystem   │──────────────────▶│ ArcSwap<Params>  │──────────▶│ Producer │
//! │ (UI thread)  │                   │ (one snapshot)   │ per block │          │
//! └──────────────┘                   └──────────────────┘           └──────────┘
//! ```
//!
//! Every write publishes a whole new [`ToneParams`], so a reader can never
//! see a new frequency paired with an old amplitude.

use crate::parameter::{AMPLITUDE_RANGE, FREQUENCY_RANGE};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// One immutable set of tone controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneParams {
    pub frequency_hz: f64,
    pub amplitude: f64,
    /// Tone switched on. A disabled tone keeps the device running and outputs silence.
    pub enabled: bool,
    /// Bumped by every publish.
    #[serde(skip)]
    pub version: u64,
}

impl ToneParams {
    pub fn new(frequency_hz: f64, amplitude: f64) -> Self {
        Self {
            frequency_hz,
            amplitude,
            enabled: true,
            version: 0,
        }
    }

    /// Clamp frequency and amplitude into their ranges.
    pub fn clamped(self) -> Self {
        Self {
            frequency_hz: FREQUENCY_RANGE.clamp(self.frequency_hz),
            amplitude: AMPLITUDE_RANGE.clamp(self.amplitude),
            ..self
        }
    }

    /// Amplitude the producer should aim for (zero when disabled).
    #[inline]
    pub fn effective_amplitude(&self) -> f64 {
        if self.enabled {
            self.amplitude
        } else {
            0.0
        }
    }
}

impl Default for ToneParams {
    fn default() -> Self {
        Self::new(FREQUENCY_RANGE.default, AMPLITUDE_RANGE.default)
    }
}

/// Latest-value store for [`ToneParams`].
///
/// Readers are lock-free. Writers clamp, then publish with read-copy-update;
/// only the newest snapshot is kept.
#[derive(Debug)]
pub struct ParameterStore {
    current: ArcSwap<ToneParams>,
}

impl ParameterStore {
    pub fn new(initial: ToneParams) -> Self {
        let mut initial = sanitize(initial);
        initial.version = 0;
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Latest published snapshot.
    #[inline]
    pub fn read(&self) -> ToneParams {
        **self.current.load()
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Publish frequency and amplitude together.
    pub fn set(&self, frequency_hz: f64, amplitude: f64) {
        if !finite_or_warn("frequency", frequency_hz) || !finite_or_warn("amplitude", amplitude) {
            return;
        }
        let frequency_hz = FREQUENCY_RANGE.clamp(frequency_hz);
        let amplitude = AMPLITUDE_RANGE.clamp(amplitude);
        self.publish(|params| {
            params.frequency_hz = frequency_hz;
            params.amplitude = amplitude;
        });
    }

    pub fn set_frequency(&self, frequency_hz: f64) {
        if !finite_or_warn("frequency", frequency_hz) {
            return;
        }
        let frequency_hz = FREQUENCY_RANGE.clamp(frequency_hz);
        self.publish(|params| params.frequency_hz = frequency_hz);
    }

    pub fn set_amplitude(&self, amplitude: f64) {
        if !finite_or_warn("amplitude", amplitude) {
            return;
        }
        let amplitude = AMPLITUDE_RANGE.clamp(amplitude);
        self.publish(|params| params.amplitude = amplitude);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.publish(|params| params.enabled = enabled);
    }

    fn publish(&self, update: impl Fn(&mut ToneParams)) {
        self.current.rcu(|current| {
            let mut next = **current;
            update(&mut next);
            next.version = current.version.wrapping_add(1);
            next
        });
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(ToneParams::default())
    }
}

fn sanitize(params: ToneParams) -> ToneParams {
    let defaults = ToneParams::default();
    ToneParams {
        frequency_hz: if params.frequency_hz.is_finite() {
            params.frequency_hz
        } else {
            defaults.frequency_hz
        },
        amplitude: if params.amplitude.is_finite() {
            params.amplitude
        } else {
            defaults.amplitude
        },
        ..params
    }
    .clamped()
}

fn finite_or_warn(name: &str, value: f64) -> bool {
    if value.is_finite() {
        true
    } else {
        tracing::warn!("Ignoring non-finite {}: {}", name, value);
        false
    }
}
