//! # Interactive Tone
//!
//! Terminal control panel for the tone engine: type commands while the tone
//! plays and hear the change immediately.
//!
//! **Concepts:** Engine setup, start/stop toggle, live parameter changes, level meter,
//! spectrum
//!
//! ```bash
//! cargo run --example interactive_tone
//! ```
//!
//! Commands: `f <hz>`, `a <percent>`, `s <0..1>` (log frequency slider),
//! `e` (enable/disable), `t` (start/stop), `m` (meter), `p` (spectrum peak),
//! `d` (devices), `q`.

use std::io::{self, BufRead, Write};
use tono::prelude::*;

fn main() -> tono::Result<()> {
    tracing_subscriber::fmt::init();

    let engine = ToneEngine::builder().frequency(440.0).amplitude_percent(30.0).build()?;
    tracing::info!(
        device = %engine.current_output_device_name().unwrap_or_else(|_| "unknown".into()),
        "Engine ready"
    );

    engine.start()?;
    print_status(&engine);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        let value = parts.next().and_then(|v| v.parse::<f64>().ok());

        match (command, value) {
            ("f", Some(hz)) => {
                engine.set_frequency(hz);
            }
            ("a", Some(percent)) => {
                engine.set_amplitude_percent(percent);
            }
            ("s", Some(position)) => {
                engine.set_frequency_normalized(position);
            }
            ("e", _) => {
                engine.set_enabled(!engine.is_enabled());
            }
            ("t", _) => match engine.toggle() {
                Ok(running) => println!("{}", if running { "started" } else { "stopped" }),
                Err(e) => println!("start failed: {e}"),
            },
            ("m", _) => {
                let (peak, rms) = engine.meter().levels();
                println!("peak {peak:.3}  rms {rms:.3}");
            }
            ("p", _) => {
                let spectrum = engine.spectrum();
                match spectrum.peak_frequency() {
                    Some(hz) => println!(
                        "spectrum peak {hz:.1} Hz ({} bins of {:.2} Hz at {} Hz)",
                        spectrum.magnitudes().len(),
                        spectrum.bin_hz(),
                        spectrum.sample_rate()
                    ),
                    None => println!("spectrum: silence"),
                }
            }
            ("d", _) => match ToneEngine::list_output_devices() {
                Ok(devices) => devices.iter().for_each(|d| println!("{d}")),
                Err(e) => println!("device list failed: {e}"),
            },
            ("q", _) => break,
            ("", _) => {}
            _ => println!("unknown command: {line}"),
        }

        if let Some(error) = engine.take_last_error() {
            println!("playback stopped: {error}");
        }
        print_status(&engine);
    }

    engine.stop();
    Ok(())
}

fn print_status(engine: &ToneEngine) {
    let params = engine.params();
    print!(
        "[{:?}] {:.1} Hz ({:.2} on slider), {:.0}%{} > ",
        engine.state(),
        params.frequency_hz,
        engine.frequency_normalized(),
        engine.amplitude_percent(),
        if params.enabled { "" } else { " (muted)" }
    );
    let _ = io::stdout().flush();
}
