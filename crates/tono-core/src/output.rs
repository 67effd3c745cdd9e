//! CPAL audio output backend.
//!
//! The producer thread pushes mono blocks into an SPSC ring; the device
//! callback pops them, fans each sample out to every device channel and
//! converts to the device sample format. After each callback the writer is
//! unparked, so a full ring parks the producer until the device has consumed
//! audio. Underruns play silence.
//!
//! The stream runs at the requested sample rate when the device supports it,
//! with the device's channel count; otherwise the device default config is
//! used and reported back through [`PlaybackSink::stream_spec`].

use crate::error::DeviceError;
use crate::lockfree::AtomicFlag;
use crate::sink::{AudioBackend, PlaybackSink, StreamSpec};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

/// Extra time granted to `close` beyond two device buffers.
const CLOSE_GRACE: Duration = Duration::from_millis(50);

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. This is safe because
/// the stream is built and started on the thread calling `open`, then moved
/// inside the `CpalSink` to the producer thread, which pauses and drops it.
/// Only one thread holds it at any time.
struct StreamHandle(cpal::Stream);

unsafe impl Send for StreamHandle {}

/// Output through the host's audio devices.
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    device_index: Option<usize>,
}

impl CpalBackend {
    /// `None` uses the host default output device.
    pub fn new(device_index: Option<usize>) -> Self {
        Self { device_index }
    }

    pub fn device_index(&self) -> Option<usize> {
        self.device_index
    }

    /// Output devices of the default host as `"index: name"`.
    pub fn list_output_devices() -> Result<Vec<String>, DeviceError> {
        cpal::default_host()
            .output_devices()?
            .enumerate()
            .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
            .collect()
    }
}

impl AudioBackend for CpalBackend {
    fn open(
        &self,
        spec: &StreamSpec,
        cancel: Arc<AtomicFlag>,
    ) -> Result<Box<dyn PlaybackSink>, DeviceError> {
        let device = get_device(self.device_index)?;
        let (config, format) = negotiate(&device, spec)?;

        let actual = StreamSpec {
            sample_rate: config.sample_rate.0,
            channels: config.channels,
            buffer_frames: spec.buffer_frames,
        };

        let (producer, consumer) = HeapRb::<f32>::new(actual.buffer_frames.max(1)).split();
        let shared = Arc::new(SinkShared::default());

        let stream = match format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, consumer, Arc::clone(&shared))?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, consumer, Arc::clone(&shared))?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, consumer, Arc::clone(&shared))?
            }
            format => return Err(DeviceError::UnsupportedFormat(format!("{format:?}"))),
        };

        stream.play()?;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| String::from("unknown")),
            sample_rate = actual.sample_rate,
            channels = actual.channels,
            format = ?format,
            "Output stream opened"
        );

        Ok(Box::new(CpalSink {
            producer,
            shared,
            cancel,
            stream: StreamHandle(stream),
            spec: actual,
            buffer_time: actual.duration_of(actual.buffer_frames),
        }))
    }

    fn device_name(&self) -> Result<String, DeviceError> {
        Ok(get_device(self.device_index)?.name()?)
    }
}

fn get_device(index: Option<usize>) -> Result<cpal::Device, DeviceError> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices
                .into_iter()
                .nth(i)
                .ok_or(DeviceError::DeviceIndexOutOfRange { index: i, count })
        }
        None => host.default_output_device().ok_or(DeviceError::NoDevice),
    }
}

/// One supported output config range, as far as selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConfigCandidate {
    channels: u16,
    min_rate: u32,
    max_rate: u32,
    format: cpal::SampleFormat,
}

impl From<cpal::SupportedStreamConfigRange> for ConfigCandidate {
    fn from(range: cpal::SupportedStreamConfigRange) -> Self {
        Self {
            channels: range.channels(),
            min_rate: range.min_sample_rate().0,
            max_rate: range.max_sample_rate().0,
            format: range.sample_format(),
        }
    }
}

fn is_writable_format(format: cpal::SampleFormat) -> bool {
    matches!(
        format,
        cpal::SampleFormat::F32 | cpal::SampleFormat::I16 | cpal::SampleFormat::U16
    )
}

/// Pick the range that runs `spec.sample_rate` in a writable format.
///
/// Prefers the requested channel count, then the closest wider layout, then
/// f32 samples.
fn select_config(candidates: &[ConfigCandidate], spec: &StreamSpec) -> Option<ConfigCandidate> {
    candidates
        .iter()
        .copied()
        .filter(|c| {
            c.channels > 0
                && is_writable_format(c.format)
                && (c.min_rate..=c.max_rate).contains(&spec.sample_rate)
        })
        .min_by_key(|c| {
            let layout = match c.channels.cmp(&spec.channels) {
                Ordering::Equal => 0,
                Ordering::Greater => 1,
                Ordering::Less => 2,
            };
            (
                layout,
                c.channels.abs_diff(spec.channels),
                c.format != cpal::SampleFormat::F32,
            )
        })
}

/// Stream config for `spec` on `device`, falling back to the device default.
fn negotiate(
    device: &cpal::Device,
    spec: &StreamSpec,
) -> Result<(cpal::StreamConfig, cpal::SampleFormat), DeviceError> {
    let candidates: Vec<ConfigCandidate> = match device.supported_output_configs() {
        Ok(ranges) => ranges.map(ConfigCandidate::from).collect(),
        Err(e) => {
            tracing::debug!("Querying supported output configs failed: {e}");
            Vec::new()
        }
    };

    if let Some(chosen) = select_config(&candidates, spec) {
        let config = cpal::StreamConfig {
            channels: chosen.channels,
            sample_rate: cpal::SampleRate(spec.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        return Ok((config, chosen.format));
    }

    let default_config = device.default_output_config()?;
    tracing::warn!(
        requested = spec.sample_rate,
        using = default_config.sample_rate().0,
        "Requested sample rate not supported, using device default config"
    );
    Ok((default_config.config(), default_config.sample_format()))
}

/// State shared between the writer and the device callbacks.
#[derive(Default)]
struct SinkShared {
    /// Registered on the first write; the callback unparks it.
    writer: OnceLock<Thread>,
    failed: AtomicFlag,
    error: Mutex<Option<String>>,
}

impl SinkShared {
    fn register_writer(&self) {
        self.writer.get_or_init(thread::current);
    }

    #[inline]
    fn wake_writer(&self) {
        if let Some(writer) = self.writer.get() {
            writer.unpark();
        }
    }

    fn fail(&self, message: String) {
        *self.error.lock() = Some(message);
        self.failed.set(true);
        self.wake_writer();
    }

    fn check(&self) -> Result<(), DeviceError> {
        if !self.failed.get() {
            return Ok(());
        }
        let message = self
            .error
            .lock()
            .clone()
            .unwrap_or_else(|| String::from("stream error"));
        Err(DeviceError::Stream(message))
    }
}

/// Push all of `block` into the ring, parking while it is full.
///
/// Returns `Ok` without queueing the rest once `cancel` is set, so a device
/// that stops pulling audio cannot hold the writer.
fn push_blocking(
    producer: &mut HeapProd<f32>,
    shared: &SinkShared,
    cancel: &AtomicFlag,
    block: &[f32],
    wait: Duration,
) -> Result<(), DeviceError> {
    let mut offset = 0;
    while offset < block.len() {
        shared.check()?;
        if cancel.get() {
            return Ok(());
        }

        offset += producer.push_slice(&block[offset..]);
        if offset < block.len() {
            // Woken by the next callback or by stop; the timeout re-checks both flags
            thread::park_timeout(wait);
        }
    }

    Ok(())
}

struct CpalSink {
    producer: HeapProd<f32>,
    shared: Arc<SinkShared>,
    cancel: Arc<AtomicFlag>,
    stream: StreamHandle,
    spec: StreamSpec,
    buffer_time: Duration,
}

impl PlaybackSink for CpalSink {
    fn stream_spec(&self) -> StreamSpec {
        self.spec
    }

    fn write(&mut self, block: &[f32]) -> Result<(), DeviceError> {
        self.shared.register_writer();
        push_blocking(
            &mut self.producer,
            &self.shared,
            &self.cancel,
            block,
            self.buffer_time,
        )
    }

    fn close(self: Box<Self>) {
        self.shared.register_writer();

        let deadline = Instant::now() + self.buffer_time * 2 + CLOSE_GRACE;
        while !self.producer.is_empty() && !self.shared.failed.get() {
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    queued = self.producer.occupied_len(),
                    "Output stream did not drain in time, discarding queued audio"
                );
                break;
            }
            thread::park_timeout((deadline - now).min(self.buffer_time));
        }

        if let Err(e) = self.stream.0.pause() {
            tracing::debug!("Pausing output stream failed: {e}");
        }
        tracing::info!("Output stream closed");
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: HeapCons<f32>,
    shared: Arc<SinkShared>,
) -> Result<cpal::Stream, DeviceError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let error_shared = Arc::clone(&shared);

    // Pre-allocated mono buffer (grows on first callback, then stable)
    let mut mono = Vec::<f32>::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let frames = data.len() / channels;
                if mono.len() < frames {
                    mono.resize(frames, 0.0);
                }

                let read = consumer.pop_slice(&mut mono[..frames]);
                mono[read..frames].fill(0.0);

                write_output(data, channels, &mono[..frames]);
            }));

            if result.is_err() {
                output_silence(data);
            }

            shared.wake_writer();
        },
        move |err| {
            tracing::error!("Output stream error: {err}");
            error_shared.fail(err.to_string());
        },
        None,
    )?;

    Ok(stream)
}

/// Copy each mono sample to every channel of its frame, converting format.
#[inline]
fn write_output<T: cpal::SizedSample + cpal::FromSample<f32>>(
    data: &mut [T],
    channels: usize,
    mono: &[f32],
) {
    for (frame, &value) in data.chunks_mut(channels).zip(mono) {
        frame.fill(T::from_sample(value));
    }
}

/// Output silence (panic recovery).
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
