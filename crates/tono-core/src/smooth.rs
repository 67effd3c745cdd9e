//! Linear parameter ramps for click-free frequency and amplitude changes.
//!
//! The producer retargets a ramp at each block boundary and pulls one value
//! per sample, so a new control value glides in over `ramp_frames` samples
//! instead of jumping.
//!
//! # Example
//!
//! ```
//! use tono_core::SmoothedValue;
//!
//! let mut gain = SmoothedValue::new(0.0, 4);
//! gain.set_target(1.0);
//!
//! let ramp: Vec<f64> = (0..4).map(|_| gain.next_sample()).collect();
//! assert_eq!(ramp, vec![0.25, 0.5, 0.75, 1.0]);
//! ```

/// Value that moves linearly toward its target over a fixed number of samples.
#[derive(Debug, Clone)]
pub struct SmoothedValue {
    current: f64,
    target: f64,
    step: f64,
    samples_remaining: u32,
    ramp_samples: u32,
}

impl SmoothedValue {
    pub fn new(initial: f64, ramp_samples: u32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            samples_remaining: 0,
            ramp_samples: ramp_samples.max(1),
        }
    }

    #[inline]
    pub fn set_target(&mut self, target: f64) {
        if target == self.target {
            return;
        }

        self.target = target;
        self.samples_remaining = self.ramp_samples;
        self.step = (self.target - self.current) / self.samples_remaining as f64;
    }

    #[inline]
    pub fn set_immediate(&mut self, value: f64) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.samples_remaining = 0;
    }

    /// Call once per sample.
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        if self.samples_remaining > 0 {
            self.current += self.step;
            self.samples_remaining -= 1;

            // Snap to target when done to avoid floating point drift
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }

        self.current
    }

    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.samples_remaining > 0
    }
}
