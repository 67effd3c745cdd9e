//! Session lifecycle integration tests
//!
//! Start/stop semantics, device failures and handle accounting, observed
//! through the capture backend's open/close counters.

use crate::helpers::*;
use std::time::{Duration, Instant};
use tono::prelude::*;
use tono::DeviceError;

#[test]
fn test_engine_builds_stopped() {
    let fx = capture_engine();

    assert_eq!(fx.engine.state(), SessionState::Stopped);
    assert!(!fx.engine.is_running());
    assert_eq!(fx.backend.stats().opens(), 0);
}

#[test]
fn test_start_opens_requested_stream() {
    let fx = capture_engine_with(8, ToneEngine::builder().channels(2));

    fx.engine.start().unwrap();
    assert!(fx.engine.is_running());

    let spec = fx.backend.stats().last_spec().unwrap();
    assert_eq!(spec.sample_rate, TEST_SAMPLE_RATE);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.buffer_frames, TEST_BLOCK_FRAMES * 2);

    let block = fx.rx.recv_block(TEST_TIMEOUT).unwrap();
    assert_eq!(block.len(), TEST_BLOCK_FRAMES);

    fx.engine.stop();
}

#[test]
fn test_double_start_keeps_one_session() {
    let fx = capture_engine();

    fx.engine.start().unwrap();
    fx.engine.start().unwrap();

    assert!(fx.engine.is_running());
    assert_eq!(fx.backend.stats().opens(), 1);
    assert_eq!(fx.backend.stats().live_sinks(), 1);

    fx.engine.stop();
    assert_eq!(fx.backend.stats().live_sinks(), 0);
}

#[test]
fn test_concurrent_start_opens_once() {
    let fx = capture_engine();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| fx.engine.start().unwrap());
        }
    });

    assert!(fx.engine.is_running());
    assert_eq!(fx.backend.stats().opens(), 1);

    fx.engine.stop();
    assert_eq!(fx.backend.stats().closes(), 1);
}

#[test]
fn test_stop_when_stopped_is_noop() {
    let fx = capture_engine();

    fx.engine.stop();
    fx.engine.stop();

    assert_eq!(fx.engine.state(), SessionState::Stopped);
    assert_eq!(fx.backend.stats().opens(), 0);
    assert_eq!(fx.backend.stats().closes(), 0);
}

#[test]
fn test_stop_returns_promptly_when_device_stalls() {
    // Nobody drains the queue: every write waits out the device buffer
    let fx = capture_engine_with(1, ToneEngine::builder());

    fx.engine.start().unwrap();
    std::thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    fx.engine.stop();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(fx.engine.state(), SessionState::Stopped);
    assert_eq!(fx.backend.stats().live_sinks(), 0);
}

#[test]
fn test_open_failure_is_device_unavailable() {
    let fx = capture_engine();
    fx.backend.set_fail_open(true);

    let err = fx.engine.start().unwrap_err();

    assert!(err.is_device_unavailable());
    assert_eq!(fx.engine.state(), SessionState::Stopped);
    assert!(!fx.engine.is_running());
    assert_eq!(fx.backend.stats().live_sinks(), 0);
}

#[test]
fn test_sink_failure_stops_session_then_restart() {
    let fx = capture_engine();
    fx.backend.fail_after_blocks(5);

    fx.engine.start().unwrap();
    assert!(wait_for_state(&fx.engine, SessionState::Stopped, TEST_TIMEOUT));

    // Sink closed before the state became observable
    assert_eq!(fx.backend.stats().live_sinks(), 0);
    assert!(matches!(
        fx.engine.take_last_error(),
        Some(DeviceError::Stream(_))
    ));
    assert_eq!(fx.rx.drain().len(), 5 * TEST_BLOCK_FRAMES);

    fx.backend.clear_failures();
    fx.engine.start().unwrap();
    assert!(fx.engine.is_running());
    assert!(fx.rx.recv_block(TEST_TIMEOUT).is_some());

    fx.engine.stop();
    assert_eq!(fx.backend.stats().opens(), 2);
    assert_eq!(fx.backend.stats().closes(), 2);
    assert!(fx.engine.take_last_error().is_none());
}

#[test]
fn test_dropped_receiver_ends_session() {
    let CaptureFixture {
        engine,
        backend,
        rx,
    } = capture_engine();

    engine.start().unwrap();
    drop(rx);

    assert!(wait_for_state(&engine, SessionState::Stopped, TEST_TIMEOUT));
    assert!(matches!(
        engine.take_last_error(),
        Some(DeviceError::Disconnected)
    ));
    assert_eq!(backend.stats().live_sinks(), 0);
}

#[test]
fn test_toggle_flips_running_state() {
    let fx = capture_engine();

    assert!(fx.engine.toggle().unwrap());
    assert!(fx.engine.is_running());

    assert!(!fx.engine.toggle().unwrap());
    assert_eq!(fx.engine.state(), SessionState::Stopped);

    assert_eq!(fx.backend.stats().opens(), 1);
    assert_eq!(fx.backend.stats().live_sinks(), 0);
}

#[test]
fn test_toggle_reports_open_failure() {
    let fx = capture_engine();
    fx.backend.set_fail_open(true);

    assert!(fx.engine.toggle().is_err());
    assert!(!fx.engine.is_running());
}

#[test]
fn test_engine_drop_releases_device() {
    let fx = capture_engine();
    let backend = fx.backend.clone();

    fx.engine.start().unwrap();
    drop(fx);

    assert_eq!(backend.stats().opens(), 1);
    assert_eq!(backend.stats().live_sinks(), 0);
}

#[test]
fn test_sequential_sessions() {
    let fx = capture_engine();

    for _ in 0..3 {
        fx.engine.start().unwrap();
        assert!(fx.rx.recv_block(TEST_TIMEOUT).is_some());
        fx.engine.stop();
    }

    assert_eq!(fx.backend.stats().opens(), 3);
    assert_eq!(fx.backend.stats().live_sinks(), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let (backend, _rx) = tono::CaptureBackend::new(1);
    let result = ToneEngine::builder()
        .block_frames(0)
        .backend(std::sync::Arc::new(backend))
        .build();

    assert!(matches!(
        result,
        Err(Error::Core(tono::core::Error::InvalidConfig(_)))
    ));
}

#[test]
fn test_device_name_from_backend() {
    let fx = capture_engine();
    assert_eq!(fx.engine.current_output_device_name().unwrap(), "capture");
}
