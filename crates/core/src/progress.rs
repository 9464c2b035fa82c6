//! Progress reporting and cooperative cancellation
//!
//! Long-running processes report coarse milestones through a
//! [`ProgressListener`]. Reporting is observational only; the single
//! functional query is [`ProgressListener::is_canceled`].

use crate::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Capability injected into a process to observe and cancel it.
pub trait ProgressListener {
    /// The process has started.
    fn started(&mut self) {}

    /// Describe the current task.
    fn set_task(&mut self, _description: &str) {}

    /// Overall progress in percent (0..=100).
    fn progress(&mut self, _percent: f32) {}

    /// Whether the caller asked the process to stop.
    fn is_canceled(&self) -> bool {
        false
    }

    /// The process finished successfully.
    fn complete(&mut self) {}

    /// The process failed with `error`.
    fn exception_occurred(&mut self, _error: &Error) {}

    /// Release any resources held by the listener. Called on every exit path.
    fn dispose(&mut self) {}
}

/// Listener that ignores everything and is never canceled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressListener for NullProgress {}

/// Listener backed by a shared flag, so another thread can cancel.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag {
    canceled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }
}

impl ProgressListener for CancelFlag {
    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}
