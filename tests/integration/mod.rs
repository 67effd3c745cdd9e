//! Integration test modules for tono
//!
//! - lifecycle: session state machine, device open/stream failures, handle leaks
//! - parameters: clamping, percent/normalized controls, torn-read freedom
//! - monitor: scope buffer and level meter

pub mod lifecycle;
pub mod parameters;
