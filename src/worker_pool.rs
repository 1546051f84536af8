//! Bounded-concurrency task pool with a join barrier.
//!
//! Admission takes an owned semaphore permit that travels into the spawned task,
//! so a slot is released whenever the task ends: success, failure, panic or
//! cancellation alike.

use std::future::Future;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use log::{debug, error};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::error_handling::PoolError;

/// Counts reported by [`WorkerPool::wait`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    /// Tasks admitted over the pool's lifetime
    pub submitted: usize,
    /// Tasks whose panic escaped to the runtime
    pub panicked: usize,
    /// Whether the pool's token was cancelled
    pub cancelled: bool,
}

/// Runs at most `capacity` tasks at once.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    tasks: FuturesUnordered<JoinHandle<()>>,
    cancel: CancellationToken,
    submitted: usize,
    panicked: usize,
}

impl WorkerPool {
    /// Creates a pool with `capacity` slots (minimum 1) tied to `cancel`.
    pub fn new(capacity: usize, cancel: CancellationToken) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            tasks: FuturesUnordered::new(),
            cancel,
            submitted: 0,
            panicked: 0,
        }
    }

    /// Maximum number of concurrently running tasks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Admits `task`, waiting for a free slot if all are taken.
    ///
    /// The task future is dropped if the pool is cancelled while it runs.
    ///
    /// # Errors
    ///
    /// `PoolError::Cancelled` once the token is cancelled (including while
    /// waiting for a slot); `PoolError::Closed` if the semaphore was closed.
    pub async fn submit<F>(&mut self, task: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(PoolError::Cancelled),
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                permit.map_err(|_| PoolError::Closed)?
            }
        };

        let cancel = self.cancel.clone();
        self.tasks.push(tokio::spawn(async move {
            let _permit = permit;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = task => {}
            }
        }));
        self.submitted += 1;

        self.reap_finished();
        Ok(())
    }

    /// Waits until every admitted task has finished.
    pub async fn wait(&mut self) -> PoolSummary {
        while let Some(result) = self.tasks.next().await {
            self.record(result);
        }
        let summary = PoolSummary {
            submitted: self.submitted,
            panicked: self.panicked,
            cancelled: self.cancel.is_cancelled(),
        };
        debug!("Worker pool drained: {summary:?}");
        summary
    }

    /// Drops handles of tasks that already finished so long batches do not
    /// accumulate them.
    fn reap_finished(&mut self) {
        while let Some(Some(result)) = self.tasks.next().now_or_never() {
            self.record(result);
        }
    }

    fn record(&mut self, result: Result<(), JoinError>) {
        if let Err(e) = result {
            if e.is_panic() {
                self.panicked += 1;
                error!("Worker task panicked: {e}");
            } else {
                debug!("Worker task aborted: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_never_exceeds_capacity() {
        let mut pool = WorkerPool::new(3, CancellationToken::new());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pool.submit(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .await
            .expect("submit should succeed");
        }

        let summary = pool.wait().await;
        assert_eq!(summary.submitted, 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_wait_is_join_barrier() {
        let mut pool = WorkerPool::new(4, CancellationToken::new());
        let done = Arc::new(AtomicUsize::new(0));
        for i in 0..10u64 {
            let done = Arc::clone(&done);
            pool.submit(async move {
                tokio::time::sleep(Duration::from_millis(i)).await;
                done.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .expect("submit should succeed");
        }
        pool.wait().await;
        assert_eq!(done.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_panicking_task_releases_slot() {
        let mut pool = WorkerPool::new(1, CancellationToken::new());
        pool.submit(async {
            panic!("boom");
        })
        .await
        .expect("submit should succeed");

        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);
        // Only admitted once the panicked task gave its permit back
        pool.submit(async move { ran_clone.store(true, Ordering::SeqCst) })
            .await
            .expect("submit should succeed");

        let summary = pool.wait().await;
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(summary.panicked, 1);
        assert_eq!(summary.submitted, 2);
    }

    #[tokio::test]
    async fn test_submit_after_cancel_is_rejected() {
        let cancel = CancellationToken::new();
        let mut pool = WorkerPool::new(2, cancel.clone());
        cancel.cancel();

        let result = pool.submit(async {}).await;
        assert_eq!(result, Err(PoolError::Cancelled));
        assert!(pool.wait().await.cancelled);
    }

    #[tokio::test]
    async fn test_blocked_submit_returns_on_cancel() {
        let cancel = CancellationToken::new();
        let mut pool = WorkerPool::new(1, cancel.clone());
        pool.submit(tokio::time::sleep(Duration::from_secs(30)))
            .await
            .expect("first submit should succeed");

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(5), pool.submit(async {}))
            .await
            .expect("submit must not hang after cancellation");
        assert_eq!(result, Err(PoolError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_drops_in_flight_tasks() {
        let cancel = CancellationToken::new();
        let mut pool = WorkerPool::new(2, cancel.clone());
        let finished = Arc::new(AtomicBool::new(false));
        let finished_clone = Arc::clone(&finished);
        pool.submit(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            finished_clone.store(true, Ordering::SeqCst);
        })
        .await
        .expect("submit should succeed");

        cancel.cancel();
        let summary = tokio::time::timeout(Duration::from_secs(5), pool.wait())
            .await
            .expect("wait must return promptly after cancellation");
        assert!(summary.cancelled);
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let pool = WorkerPool::new(0, CancellationToken::new());
        assert_eq!(pool.capacity(), 1);
    }
}
