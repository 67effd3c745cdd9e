//! Playback session lifecycle.
//!
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`, plus
//! `Running -> Stopped` when the producer dies on a device failure.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Starting,
            2 => SessionState::Running,
            3 => SessionState::Stopping,
            _ => SessionState::Stopped,
        }
    }

    /// Starting or Running: a session exists and owns (or is acquiring) the device.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Starting | SessionState::Running)
    }
}

/// Session state readable from any thread.
#[derive(Debug)]
pub struct AtomicSession {
    state: AtomicU8,
}

impl AtomicSession {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Stopped as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move `from -> to` only if the current state is `from`.
    #[inline]
    pub fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for AtomicSession {
    fn default() -> Self {
        Self::new()
    }
}
