//! Background task queue
//!
//! Single-consumer queue for deferred work (artwork generation and other
//! non-interactive jobs): submitted tasks run one at a time in submission
//! order on a dedicated worker, and teardown cancels everything still
//! pending. Nothing on the interactive path ever waits on this queue.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle to a single-consumer background worker
pub struct TaskQueue {
    tx: mpsc::Sender<Job>,
    worker: JoinHandle<()>,
}

impl TaskQueue {
    /// Spawn the worker with the given queue capacity
    pub fn spawn(capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(capacity);
        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
            debug!("Task queue drained, worker exiting");
        });
        Self { tx, worker }
    }

    /// Queue a job behind everything already submitted
    ///
    /// Returns false when the worker is gone.
    pub async fn submit<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tx.send(Box::pin(job)).await.is_ok()
    }

    /// Queue a job without waiting for capacity
    ///
    /// Returns false when the queue is full or the worker is gone.
    pub fn try_submit<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tx.try_send(Box::pin(job)).is_ok()
    }

    /// Tear down immediately, cancelling queued and in-flight work
    pub fn shutdown(self) {
        self.worker.abort();
    }

    /// Stop accepting jobs and wait for the queue to drain
    pub async fn drain(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_jobs_run_in_submission_order() {
        let queue = TaskQueue::spawn(8);
        let log = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        for i in 0..5 {
            let log = log.clone();
            assert!(
                queue
                    .submit(async move {
                        log.lock().await.push(i);
                    })
                    .await
            );
        }

        queue.drain().await;
        assert_eq!(*log.lock().await, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_jobs() {
        let queue = TaskQueue::spawn(8);
        let completed = Arc::new(AtomicUsize::new(0));

        let slow = completed.clone();
        queue
            .submit(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                slow.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        let queued = completed.clone();
        queue
            .submit(async move {
                queued.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        queue.shutdown();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_try_submit_full_queue() {
        let queue = TaskQueue::spawn(1);
        let gate = Arc::new(tokio::sync::Notify::new());

        // Park the worker on a job that waits for the gate
        let parked = gate.clone();
        assert!(
            queue
                .submit(async move {
                    parked.notified().await;
                })
                .await
        );

        // One slot buffers, the next try_submit must refuse
        while queue.try_submit(async {}) {}
        assert!(!queue.try_submit(async {}));

        gate.notify_one();
        queue.shutdown();
    }
}
