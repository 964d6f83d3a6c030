//! Cross-thread synchronization primitives.
//!
//! The renderer's UI-facing operations must not touch render-thread state
//! before device setup has finished. `ReadySignal` is the manual-reset
//! event they park on: raised exactly once by the render thread, observed
//! by any number of waiters, in any order relative to the raise.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A one-shot, manual-reset readiness signal.
///
/// Once set it stays set; late waiters return immediately.
#[derive(Debug, Default)]
pub struct ReadySignal {
    ready: Mutex<bool>,
    condvar: Condvar,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal, waking all current and future waiters.
    pub fn set(&self) {
        let mut ready = self.ready.lock();
        *ready = true;
        self.condvar.notify_all();
    }

    /// Block until the signal is raised.
    pub fn wait(&self) {
        let mut ready = self.ready.lock();
        while !*ready {
            self.condvar.wait(&mut ready);
        }
    }

    /// Block until the signal is raised or the timeout elapses.
    /// Returns whether the signal was raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut ready = self.ready.lock();
        if *ready {
            return true;
        }
        self.condvar.wait_for(&mut ready, timeout);
        *ready
    }

    pub fn is_set(&self) -> bool {
        *self.ready.lock()
    }
}
