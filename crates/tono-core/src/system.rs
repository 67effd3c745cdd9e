//! Tone system - control facade over the parameter store and playback session.

use crate::config::EngineConfig;
use crate::error::{DeviceError, Error, Result};
use crate::lockfree::AtomicFlag;
use crate::monitor::{LevelMeter, ScopeBuffer};
use crate::params::{ParameterStore, ToneParams};
use crate::producer::Producer;
use crate::session::{AtomicSession, SessionState};
use crate::sink::{AudioBackend, StreamSpec};
use crate::spectrum::{Spectrum, SpectrumAnalyzer};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thread_priority::ThreadPriority;

#[cfg(feature = "cpal")]
use crate::output::CpalBackend;

/// Slack on top of the sink's own bounded waits before `stop` gives up on
/// the producer thread.
const STOP_GRACE: Duration = Duration::from_millis(500);

/// A running producer thread and its stop flag.
struct Session {
    stop: Arc<AtomicFlag>,
    thread: JoinHandle<()>,
    /// Disconnects when the producer thread exits.
    done: Receiver<()>,
    timeout: Duration,
}

impl Session {
    /// Signal the producer and wait for it to close its sink.
    ///
    /// A producer still stuck after `timeout` is detached. Its stop flag
    /// stays set, so it never touches the session state again.
    fn join(self) {
        self.stop.set(true);
        self.thread.thread().unpark();

        match self.done.recv_timeout(self.timeout) {
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Producer thread did not exit in time, detaching it"
                );
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.thread.join().is_err() {
                    tracing::error!("Producer thread panicked");
                }
            }
        }
    }
}

/// Single tone generator: one parameter store, at most one playback session.
///
/// All methods take `&self`; lifecycle calls are serialized internally, and
/// parameter setters never block on the audio path.
pub struct ToneSystem {
    config: EngineConfig,
    backend: Arc<dyn AudioBackend>,
    params: Arc<ParameterStore>,
    state: Arc<AtomicSession>,
    scope: Arc<ScopeBuffer>,
    meter: Arc<LevelMeter>,
    analyzer: Mutex<SpectrumAnalyzer>,
    last_error: Arc<Mutex<Option<DeviceError>>>,
    stream_spec: Mutex<Option<StreamSpec>>,
    session: Mutex<Option<Session>>,
}

impl ToneSystem {
    /// Create a new tone system builder.
    pub fn builder() -> ToneSystemBuilder {
        ToneSystemBuilder::default()
    }

    /// Open the output and start producing audio.
    ///
    /// No-op while a session is already starting or running. On failure to
    /// open the device the state returns to [`SessionState::Stopped`].
    pub fn start(&self) -> Result<()> {
        let mut session = self.session.lock();

        if self.state.get().is_active() {
            return Ok(());
        }

        // A producer that died on a device error has already closed its sink
        if let Some(stale) = session.take() {
            stale.join();
        }

        self.state.set(SessionState::Starting);

        let stop = Arc::new(AtomicFlag::new(false));
        let sink = match self
            .backend
            .open(&self.config.stream_spec(), Arc::clone(&stop))
        {
            Ok(sink) => sink,
            Err(e) => {
                self.state.set(SessionState::Stopped);
                tracing::error!("Failed to open output: {e}");
                return Err(Error::DeviceUnavailable(e));
            }
        };
        self.last_error.lock().take();

        let spec = sink.stream_spec();
        *self.stream_spec.lock() = Some(spec);

        let producer = Producer::new(&self.config, sink, Arc::clone(&self.params), Arc::clone(&stop))
            .with_monitor(Arc::clone(&self.scope), Arc::clone(&self.meter));

        let state = Arc::clone(&self.state);
        let last_error = Arc::clone(&self.last_error);
        let thread_stop = Arc::clone(&stop);
        let (done_tx, done) = crossbeam_channel::bounded::<()>(0);

        let spawned = thread::Builder::new()
            .name("tono-producer".into())
            .spawn(move || {
                let _done = done_tx;
                let _ = thread_priority::set_current_thread_priority(ThreadPriority::Max);

                match producer.run() {
                    Ok(()) => tracing::debug!("Producer thread exited"),
                    // Stop owns the state once requested
                    Err(error) if thread_stop.get() => {
                        tracing::debug!("Producer exited after stop: {error}");
                    }
                    Err(error) => {
                        tracing::error!("Playback stopped: {error}");
                        *last_error.lock() = Some(error);
                        state.set(SessionState::Stopped);
                    }
                }
            });

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                self.state.set(SessionState::Stopped);
                return Err(Error::Spawn(e));
            }
        };

        *session = Some(Session {
            stop,
            thread,
            done,
            timeout: self.stop_timeout(&spec),
        });

        if self.state.transition(SessionState::Starting, SessionState::Running) {
            tracing::info!(
                sample_rate = spec.sample_rate,
                channels = spec.channels,
                block_frames = self.config.block_frames,
                "Session started"
            );
        }

        Ok(())
    }

    /// Stop producing audio and release the output.
    ///
    /// No-op when stopped. Returns once the producer has exited and the sink
    /// is closed, or after a bounded wait if the sink ignores cancellation.
    pub fn stop(&self) {
        let mut session = self.session.lock();

        let Some(current) = session.take() else {
            return;
        };

        let was_running = self.state.transition(SessionState::Running, SessionState::Stopping);
        current.join();
        self.state.set(SessionState::Stopped);
        self.meter.reset();

        if was_running {
            tracing::info!("Session stopped");
        }
    }

    /// One write wait, the close drain (two buffers) and one block, plus slack.
    fn stop_timeout(&self, spec: &StreamSpec) -> Duration {
        spec.duration_of(spec.buffer_frames * 3 + self.config.block_frames) + STOP_GRACE
    }

    /// True while a session is producing audio.
    pub fn is_running(&self) -> bool {
        self.state.get() == SessionState::Running
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Set the tone frequency in Hz (clamped to the audible range).
    pub fn set_frequency(&self, frequency_hz: f64) {
        self.params.set_frequency(frequency_hz);
    }

    /// Set the tone amplitude (clamped to `0.0..=1.0`).
    pub fn set_amplitude(&self, amplitude: f64) {
        self.params.set_amplitude(amplitude);
    }

    /// Mute or unmute the tone without closing the device.
    pub fn set_enabled(&self, enabled: bool) {
        self.params.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.params.read().enabled
    }

    /// Latest parameter snapshot.
    pub fn params(&self) -> ToneParams {
        self.params.read()
    }

    /// The shared parameter store (advanced use - prefer the setters).
    pub fn parameter_store(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rate of the most recently opened stream, or the configured rate
    /// before the first start.
    pub fn sample_rate(&self) -> u32 {
        self.stream_spec()
            .map_or(self.config.sample_rate, |spec| spec.sample_rate)
    }

    /// Parameters the device granted for the most recently opened stream.
    pub fn stream_spec(&self) -> Option<StreamSpec> {
        *self.stream_spec.lock()
    }

    /// Take the device error that ended the last session, if any.
    pub fn take_last_error(&self) -> Option<DeviceError> {
        self.last_error.lock().take()
    }

    /// Recently produced samples, for oscilloscope displays.
    pub fn scope(&self) -> &Arc<ScopeBuffer> {
        &self.scope
    }

    /// Peak/RMS of the latest block.
    pub fn meter(&self) -> &Arc<LevelMeter> {
        &self.meter
    }

    /// Magnitude spectrum of the newest scope samples.
    pub fn spectrum(&self) -> Spectrum {
        let sample_rate = self.sample_rate();
        self.analyzer.lock().analyze_scope(&self.scope, sample_rate)
    }

    /// Name of the output device the backend opens.
    pub fn device_name(&self) -> Result<String> {
        Ok(self.backend.device_name()?)
    }
}

impl Drop for ToneSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builder for ToneSystem.
#[derive(Default)]
pub struct ToneSystemBuilder {
    config: EngineConfig,
    backend: Option<Arc<dyn AudioBackend>>,
}

impl ToneSystemBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.config.sample_rate = rate;
        self
    }

    /// Preferred number of device channels (default: 1). The tone is copied to each.
    pub fn channels(mut self, count: u16) -> Self {
        self.config.channels = count;
        self
    }

    pub fn block_frames(mut self, frames: usize) -> Self {
        self.config.block_frames = frames;
        self
    }

    pub fn device_buffer_frames(mut self, frames: usize) -> Self {
        self.config.device_buffer_frames = frames;
        self
    }

    /// Ramp parameter changes (default: true).
    pub fn smoothing(mut self, enabled: bool) -> Self {
        self.config.smoothing = enabled;
        self
    }

    pub fn ramp_frames(mut self, frames: usize) -> Self {
        self.config.ramp_frames = Some(frames);
        self
    }

    pub fn scope_seconds(mut self, seconds: f32) -> Self {
        self.config.scope_seconds = seconds;
        self
    }

    /// Initial frequency in Hz.
    pub fn frequency(mut self, frequency_hz: f64) -> Self {
        self.config.initial.frequency_hz = frequency_hz;
        self
    }

    /// Initial amplitude.
    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.config.initial.amplitude = amplitude;
        self
    }

    /// Set output device index (CPAL backend).
    pub fn output_device(mut self, index: usize) -> Self {
        self.config.output_device = Some(index);
        self
    }

    /// Use a custom backend instead of the default device output.
    pub fn backend(mut self, backend: Arc<dyn AudioBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Validate the configuration and build the system (not started).
    pub fn build(self) -> Result<ToneSystem> {
        self.config.validate()?;

        let backend = match self.backend {
            Some(backend) => backend,
            None => default_backend(&self.config)?,
        };

        Ok(ToneSystem {
            params: Arc::new(ParameterStore::new(self.config.initial)),
            scope: Arc::new(ScopeBuffer::new(self.config.scope_capacity())),
            meter: Arc::new(LevelMeter::new()),
            analyzer: Mutex::new(SpectrumAnalyzer::default()),
            state: Arc::new(AtomicSession::new()),
            last_error: Arc::new(Mutex::new(None)),
            stream_spec: Mutex::new(None),
            session: Mutex::new(None),
            backend,
            config: self.config,
        })
    }
}

#[cfg(feature = "cpal")]
fn default_backend(config: &EngineConfig) -> Result<Arc<dyn AudioBackend>> {
    Ok(Arc::new(CpalBackend::new(config.output_device)))
}

#[cfg(not(feature = "cpal"))]
fn default_backend(_config: &EngineConfig) -> Result<Arc<dyn AudioBackend>> {
    Err(Error::InvalidConfig(
        "no audio backend configured (enable the `cpal` feature or call `backend`)".into(),
    ))
}
