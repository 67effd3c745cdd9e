//! Producer loop: parameters -> oscillator -> block -> sink.
//!
//! Runs on the dedicated producer thread. Each iteration reads one parameter
//! snapshot, renders `block_frames` samples, publishes them to the monitor
//! taps and blocks in [`PlaybackSink::write`] until the device takes them.
//! The stop flag is checked once per iteration, so a stop request is seen
//! within one block. The oscillator runs at the rate the sink negotiated,
//! which may differ from the configured one.

use crate::config::EngineConfig;
use crate::error::DeviceError;
use crate::lockfree::AtomicFlag;
use crate::monitor::{LevelMeter, ScopeBuffer};
use crate::oscillator::Oscillator;
use crate::params::ParameterStore;
use crate::sink::PlaybackSink;
use crate::smooth::SmoothedValue;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Block renderer that owns the oscillator and the open sink.
pub struct Producer {
    oscillator: Oscillator,
    sink: Box<dyn PlaybackSink>,
    params: Arc<ParameterStore>,
    stop: Arc<AtomicFlag>,
    scope: Option<Arc<ScopeBuffer>>,
    meter: Option<Arc<LevelMeter>>,
    block: Vec<f32>,
    frequency: SmoothedValue,
    amplitude: SmoothedValue,
    smoothing: bool,
    primed: bool,
}

impl Producer {
    pub fn new(
        config: &EngineConfig,
        sink: Box<dyn PlaybackSink>,
        params: Arc<ParameterStore>,
        stop: Arc<AtomicFlag>,
    ) -> Self {
        let ramp = u32::try_from(config.ramp_len()).unwrap_or(u32::MAX);
        let initial = params.read();

        Self {
            oscillator: Oscillator::new(sink.stream_spec().sample_rate as f64),
            sink,
            params,
            stop,
            scope: None,
            meter: None,
            block: vec![0.0; config.block_frames],
            frequency: SmoothedValue::new(initial.frequency_hz, ramp),
            amplitude: SmoothedValue::new(initial.effective_amplitude(), ramp),
            smoothing: config.smoothing,
            primed: false,
        }
    }

    /// Publish every block to a scope ring and a level meter.
    pub fn with_monitor(mut self, scope: Arc<ScopeBuffer>, meter: Arc<LevelMeter>) -> Self {
        self.scope = Some(scope);
        self.meter = Some(meter);
        self
    }

    /// Run until the stop flag is set or the sink fails. The sink is closed
    /// on every path before this returns, a panic while rendering included.
    pub fn run(mut self) -> Result<(), DeviceError> {
        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.pump())) {
            Ok(result) => result,
            Err(_) => Err(DeviceError::Stream(String::from("producer panicked"))),
        };
        self.sink.close();
        result
    }

    fn pump(&mut self) -> Result<(), DeviceError> {
        while !self.stop.get() {
            self.fill_block();
            self.sink.write(&self.block)?;
        }
        Ok(())
    }

    /// Render the next block from the latest parameter snapshot.
    pub fn fill_block(&mut self) -> &[f32] {
        let params = self.params.read();
        let frequency = params.frequency_hz;
        let amplitude = params.effective_amplitude();

        if self.primed && self.smoothing {
            self.frequency.set_target(frequency);
            self.amplitude.set_target(amplitude);
        } else {
            self.frequency.set_immediate(frequency);
            self.amplitude.set_immediate(amplitude);
            self.primed = true;
        }

        if self.frequency.is_smoothing() || self.amplitude.is_smoothing() {
            for sample in self.block.iter_mut() {
                let frequency = self.frequency.next_sample();
                let amplitude = self.amplitude.next_sample();
                *sample = self.oscillator.next_sample(frequency, amplitude);
            }
        } else {
            self.oscillator.fill(
                &mut self.block,
                self.frequency.current(),
                self.amplitude.current(),
            );
        }

        sanitize(&mut self.block);

        if let Some(scope) = &self.scope {
            scope.push_block(&self.block);
        }
        if let Some(meter) = &self.meter {
            meter.update(&self.block);
        }

        &self.block
    }
}

/// Keep the device input in `[-1, 1]` and free of NaN/inf.
#[inline]
fn sanitize(block: &mut [f32]) {
    for sample in block.iter_mut() {
        *sample = if sample.is_finite() {
            sample.clamp(-1.0, 1.0)
        } else {
            0.0
        };
    }
}
