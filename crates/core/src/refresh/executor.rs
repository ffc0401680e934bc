//! Posting work onto the single UI thread.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crate::quotes::RefreshError;

pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// The UI execution context.
///
/// Jobs posted here run one at a time, in order, on the thread that owns the
/// UI. This is the only place refresh results touch the store or the shared
/// portfolio state.
pub trait UiExecutor: Send + Sync {
    fn post(&self, job: UiJob) -> Result<(), RefreshError>;
}

/// Sending half of a channel-backed UI loop.
#[derive(Clone)]
pub struct ChannelUiExecutor {
    sender: Sender<UiJob>,
}

impl UiExecutor for ChannelUiExecutor {
    fn post(&self, job: UiJob) -> Result<(), RefreshError> {
        self.sender
            .send(job)
            .map_err(|_| RefreshError::Internal("UI event loop has shut down".to_string()))
    }
}

/// Receiving half, driven by the UI thread.
pub struct UiEventLoop {
    receiver: Receiver<UiJob>,
}

impl UiEventLoop {
    /// Run jobs until every executor has been dropped.
    pub fn run(self) {
        for job in self.receiver {
            job();
        }
    }

    /// Run whatever is queued right now without waiting.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Run jobs until `done` holds or `timeout` passes. Returns `done()`.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while !done() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.receiver.recv_timeout(remaining) {
                Ok(job) => job(),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return done()
                }
            }
        }
        true
    }
}

/// A connected executor and event loop.
pub fn ui_channel() -> (ChannelUiExecutor, UiEventLoop) {
    let (sender, receiver) = mpsc::channel();
    (ChannelUiExecutor { sender }, UiEventLoop { receiver })
}
