//! Single-shot readiness signal for the speech device.
//!
//! The worker publishes exactly once, either the voice list or the init
//! failure.  Anyone else (the UI wanting the voice picker, the producer
//! deciding whether to drop requests) reads it without blocking, or waits
//! for it with a bounded timeout.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use super::device::Voice;

/// Lifecycle of the speech device as seen from outside the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceState {
    /// The worker has not finished initialising the device yet.
    Pending,
    /// The device is up; these are its voices.
    Ready(Vec<Voice>),
    /// Initialisation failed with this message.
    Failed(String),
}

#[derive(Debug)]
pub struct Readiness {
    state: Mutex<DeviceState>,
    changed: Condvar,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DeviceState::Pending),
            changed: Condvar::new(),
        }
    }

    /// Publish the outcome.  Later calls are ignored.
    pub fn publish(&self, outcome: DeviceState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != DeviceState::Pending || outcome == DeviceState::Pending {
            return;
        }
        *state = outcome;
        self.changed.notify_all();
    }

    /// Current state without waiting.
    pub fn state(&self) -> DeviceState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Failure message if initialisation failed.
    pub fn failure(&self) -> Option<String> {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            DeviceState::Failed(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    /// Block until the outcome is published or `timeout` elapses.
    ///
    /// Returns [`DeviceState::Pending`] on timeout.
    pub fn wait(&self, timeout: Duration) -> DeviceState {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |state| *state == DeviceState::Pending)
            .unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
