//! Batch progress tracking.
//!
//! The completed counter and the last published percent share one mutex with
//! the stream sender, so values reach the caller in the order they were
//! computed and each distinct percent is sent once.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;

/// Completed/total counts of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Number of tasks in the batch, fixed at start
    pub total: usize,
    /// Number of tasks whose outcome is known
    pub completed: usize,
}

impl BatchProgress {
    /// `floor(completed / total * 100)`, clamped to `[0, 100]`.
    ///
    /// An empty batch is complete by definition.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = self.completed.min(self.total) * 100 / self.total;
        pct as u8
    }

    /// True once every task has an outcome.
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

struct ProgressState {
    progress: BatchProgress,
    last_sent: Option<u8>,
    tx: Option<mpsc::UnboundedSender<u8>>,
}

/// Shared handle that advances a batch's progress.
#[derive(Clone)]
pub struct ProgressReporter {
    state: Arc<Mutex<ProgressState>>,
}

impl ProgressReporter {
    /// Creates a reporter for `total` tasks and the stream its updates go to.
    pub fn new(total: usize) -> (Self, ProgressStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Self {
            state: Arc::new(Mutex::new(ProgressState {
                progress: BatchProgress {
                    total,
                    completed: 0,
                },
                last_sent: None,
                tx: Some(tx),
            })),
        };
        (reporter, ProgressStream { rx, guard: None })
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        // Counters stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records one finished task and returns the new percent.
    ///
    /// Calls beyond `total` are ignored.
    pub fn advance(&self) -> u8 {
        let mut state = self.lock();
        if state.progress.completed < state.progress.total {
            state.progress.completed += 1;
        }
        let pct = state.progress.percent();
        // Nothing is published until the batch reaches 1%
        if pct > state.last_sent.unwrap_or(0) {
            state.last_sent = Some(pct);
            if let Some(tx) = &state.tx {
                // Receiver gone means nobody is listening any more
                let _ = tx.send(pct);
            }
        }
        pct
    }

    /// Current counts.
    pub fn snapshot(&self) -> BatchProgress {
        self.lock().progress
    }

    /// Closes the stream. Further `advance` calls still count.
    pub fn finish(&self) {
        self.lock().tx = None;
    }
}

/// Stream of non-decreasing percentages for one batch.
///
/// Ends when the batch finishes. If created with a cancel guard, dropping the
/// stream cancels the batch.
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<u8>,
    guard: Option<DropGuard>,
}

impl ProgressStream {
    /// Attaches a guard that fires when the stream is dropped.
    pub(crate) fn with_guard(mut self, guard: DropGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Keeps the batch running even if this stream is dropped.
    pub fn detach(&mut self) {
        if let Some(guard) = self.guard.take() {
            guard.disarm();
        }
    }
}

impl Stream for ProgressStream {
    type Item = u8;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<u8>> {
        self.rx.poll_recv(cx)
    }
}
