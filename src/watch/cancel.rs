//! Cooperative cancellation.

use crate::error::{EcceError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest stretch a [`CancelFlag::sleep`] goes without checking the flag.
const SLEEP_SLICE: Duration = Duration::from_millis(25);

/// Shared stop request. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns false when the sleep was cut short by cancellation.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }

    /// Cancel on Ctrl-C (SIGINT/SIGTERM where supported).
    ///
    /// Only one handler can be installed per process.
    pub fn cancel_on_interrupt(&self) -> Result<()> {
        let flag = self.clone();
        ctrlc::set_handler(move || flag.cancel()).map_err(|e| {
            EcceError::UserError(format!("failed to install interrupt handler: {}", e))
        })
    }
}
