//! Parameter control integration tests
//!
//! Clamping, the control-panel conversions (percent, log slider) and
//! snapshot consistency under concurrent writers.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_relative_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tono::prelude::*;

#[test]
fn test_defaults() {
    let fx = capture_engine();

    assert_eq!(fx.engine.frequency(), 440.0);
    assert_eq!(fx.engine.amplitude(), 0.5);
    assert!(fx.engine.is_enabled());
}

#[test]
fn test_out_of_range_values_are_clamped() {
    let fx = capture_engine();

    fx.engine.set_frequency(5.0).set_amplitude(-0.5);
    assert_eq!(fx.engine.frequency(), 20.0);
    assert_eq!(fx.engine.amplitude(), 0.0);

    fx.engine.set_frequency(96_000.0).set_amplitude(3.0);
    assert_eq!(fx.engine.frequency(), 20_000.0);
    assert_eq!(fx.engine.amplitude(), 1.0);
}

#[test]
fn test_non_finite_values_are_ignored() {
    let fx = capture_engine();
    fx.engine.set_frequency(1_000.0).set_amplitude(0.7);
    let version = fx.engine.core().parameter_store().version();

    fx.engine.set_frequency(f64::NAN).set_amplitude(f64::INFINITY);

    assert_eq!(fx.engine.frequency(), 1_000.0);
    assert_eq!(fx.engine.amplitude(), 0.7);
    assert_eq!(fx.engine.core().parameter_store().version(), version);
}

#[test]
fn test_amplitude_percent() {
    let fx = capture_engine();

    fx.engine.set_amplitude_percent(25.0);
    assert_relative_eq!(fx.engine.amplitude(), 0.25);
    assert_relative_eq!(fx.engine.amplitude_percent(), 25.0);

    fx.engine.set_amplitude_percent(150.0);
    assert_eq!(fx.engine.amplitude(), 1.0);
}

#[test]
fn test_frequency_slider_is_logarithmic() {
    let fx = capture_engine();

    fx.engine.set_frequency_normalized(0.0);
    assert_relative_eq!(fx.engine.frequency(), 20.0, max_relative = 1e-9);

    fx.engine.set_frequency_normalized(1.0);
    assert_relative_eq!(fx.engine.frequency(), 20_000.0, max_relative = 1e-9);

    // Geometric mean of the range sits at the slider midpoint
    fx.engine.set_frequency_normalized(0.5);
    assert_relative_eq!(
        fx.engine.frequency(),
        (20.0f64 * 20_000.0).sqrt(),
        max_relative = 1e-9
    );
    assert_relative_eq!(fx.engine.frequency_normalized(), 0.5, max_relative = 1e-9);
}

#[test]
fn test_builder_initial_params() {
    let fx = capture_engine_with(
        8,
        ToneEngine::builder()
            .frequency(261.63)
            .amplitude_percent(30.0),
    );

    assert_eq!(fx.engine.frequency(), 261.63);
    assert_relative_eq!(fx.engine.amplitude(), 0.3);
}

#[test]
fn test_enable_toggles_params_only() {
    let fx = capture_engine();

    fx.engine.set_enabled(false);
    assert!(!fx.engine.is_enabled());
    assert_eq!(fx.engine.params().amplitude, 0.5);

    fx.engine.set_enabled(true);
    assert!(fx.engine.is_enabled());
}

#[test]
fn test_every_publish_bumps_version() {
    let fx = capture_engine();
    let store = fx.engine.core().parameter_store();
    let start = store.version();

    fx.engine
        .set_frequency(300.0)
        .set_amplitude(0.2)
        .set_enabled(false);

    assert_eq!(store.version(), start + 3);
}

/// Readers only ever see one of the pairs that were written together.
#[test]
fn test_concurrent_writes_are_never_torn() {
    let fx = capture_engine();
    let store = Arc::clone(fx.engine.core().parameter_store());
    store.set(440.0, 0.5);

    let done = Arc::new(AtomicBool::new(false));
    let writer = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            let mut flip = false;
            while !done.load(Ordering::Relaxed) {
                if flip {
                    store.set(440.0, 0.5);
                } else {
                    store.set(880.0, 0.8);
                }
                flip = !flip;
            }
        })
    };

    for _ in 0..100_000 {
        let params = store.read();
        let pair = (params.frequency_hz, params.amplitude);
        assert!(
            pair == (440.0, 0.5) || pair == (880.0, 0.8),
            "torn read: {pair:?}"
        );
    }

    done.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}

#[test]
fn test_frequency_change_while_running_is_heard() {
    let fx = capture_engine_with(64, ToneEngine::builder().amplitude(1.0));

    fx.engine.start().unwrap();
    let before = fx.rx.collect(TEST_SAMPLE_RATE as usize / 4, TEST_TIMEOUT);

    fx.engine.set_frequency(1_000.0);
    // Full queue, the block in flight and the ramp block
    skip_blocks(&fx.rx, 67);
    let after = fx.rx.collect(TEST_SAMPLE_RATE as usize / 4, TEST_TIMEOUT);

    fx.engine.stop();

    assert!((estimate_frequency(&before, TEST_SAMPLE_RATE) - 440.0).abs() < 2.0);
    assert!((estimate_frequency(&after, TEST_SAMPLE_RATE) - 1_000.0).abs() < 2.0);
    assert!(peak(&after) <= 1.0 + FLOAT_EPSILON);
}
