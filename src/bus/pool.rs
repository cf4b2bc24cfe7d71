//! # Worker pool collaborator for pooled dispatch.
//!
//! [`WorkerPool`] is the minimal capability a bus needs from an externally
//! owned task-submission service: accept or reject a job, and optionally
//! drain on shutdown. [`FixedPool`] is the in-crate implementation — a fixed
//! set of workers consuming a bounded queue.
//!
//! ## Architecture
//! ```text
//! submit(job) ──► [bounded queue] ──► worker 1 ──► job.await
//!      │               │              worker 2 ──► job.await
//!      │               └─ full ──► Err(job)   (handed back, never dropped silently)
//!      │
//! drain() ──► close queue ──► workers finish queued jobs ──► join (bounded by grace)
//! ```
//!
//! ## Panic handling
//! Workers wrap each job in `catch_unwind`: a panicking job is reported via
//! `tracing::warn!` and the worker continues with the next job.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::panic_reason;

/// A unit of pooled work: a boxed future run to completion by one worker.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Contract for an externally owned task-submission service.
///
/// The bus holds a shared handle and only ever submits work through it; pool
/// lifecycle (creation, sizing, teardown) belongs to the pool's owner.
#[async_trait]
pub trait WorkerPool: Send + Sync {
    /// Submits a job for execution.
    ///
    /// Rejected jobs (queue full, pool draining) are handed back to the
    /// caller so nothing is dropped silently.
    fn submit(&self, job: Job) -> Result<(), Job>;

    /// Stops accepting jobs and waits for in-flight ones, per the pool's own
    /// policy. Default: no-op for pools without a drain protocol.
    async fn drain(&self) {}
}

/// Configuration for [`FixedPool`].
///
/// ## Field semantics
/// - `workers`: number of worker tasks (min 1; clamped)
/// - `queue_capacity`: bounded job queue size (min 1; clamped)
/// - `grace`: maximum wait for workers during [`WorkerPool::drain`] before
///   stragglers are aborted
#[derive(Clone, Copy, Debug)]
pub struct PoolConfig {
    /// Number of worker tasks.
    pub workers: usize,
    /// Capacity of the shared job queue.
    pub queue_capacity: usize,
    /// Maximum time `drain` waits for workers before aborting them.
    pub grace: Duration,
}

impl Default for PoolConfig {
    /// Returns a configuration with:
    /// - `workers = 4`;
    /// - `queue_capacity = 256`;
    /// - `grace = 30s`.
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
            grace: Duration::from_secs(30),
        }
    }
}

/// Fixed-size worker pool over a bounded queue.
///
/// Must be created inside a Tokio runtime: workers are spawned eagerly and
/// run until the queue is closed by [`WorkerPool::drain`].
pub struct FixedPool {
    tx: parking_lot::Mutex<Option<mpsc::Sender<Job>>>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    grace: Duration,
}

impl FixedPool {
    /// Creates the pool and spawns its workers.
    #[must_use]
    pub fn new(cfg: PoolConfig) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(cfg.queue_capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let mut workers = Vec::with_capacity(cfg.workers.max(1));
        for _ in 0..cfg.workers.max(1) {
            let rx = Arc::clone(&rx);
            workers.push(tokio::spawn(async move {
                loop {
                    // The receiver lock is held only while idle; it is
                    // released before the job runs, so workers execute
                    // jobs concurrently.
                    let job = { rx.lock().await.recv().await };
                    match job {
                        Some(job) => {
                            if let Err(payload) =
                                std::panic::AssertUnwindSafe(job).catch_unwind().await
                            {
                                tracing::warn!(
                                    reason = %panic_reason(payload),
                                    "pooled job panicked; worker continues"
                                );
                            }
                        }
                        None => break,
                    }
                }
            }));
        }

        Self {
            tx: parking_lot::Mutex::new(Some(tx)),
            workers: parking_lot::Mutex::new(workers),
            grace: cfg.grace,
        }
    }

    /// Creates the pool and returns it as a shared handle.
    #[must_use]
    pub fn arc(cfg: PoolConfig) -> Arc<Self> {
        Arc::new(Self::new(cfg))
    }
}

#[async_trait]
impl WorkerPool for FixedPool {
    fn submit(&self, job: Job) -> Result<(), Job> {
        let tx = self.tx.lock();
        match tx.as_ref() {
            Some(tx) => match tx.try_send(job) {
                Ok(()) => Ok(()),
                Err(mpsc::error::TrySendError::Full(job))
                | Err(mpsc::error::TrySendError::Closed(job)) => Err(job),
            },
            None => Err(job),
        }
    }

    /// Closes the queue, lets workers finish queued jobs, and joins them
    /// within the configured grace period. Stragglers are aborted.
    /// Idempotent.
    async fn drain(&self) {
        drop(self.tx.lock().take());

        let handles = std::mem::take(&mut *self.workers.lock());
        if handles.is_empty() {
            return;
        }
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        let joined = async move {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(self.grace, joined).await.is_err() {
            tracing::warn!(grace = ?self.grace, "pool drain grace exceeded; aborting stuck workers");
            for abort in aborts {
                abort.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[tokio::test]
    async fn submitted_jobs_run() {
        let pool = FixedPool::new(PoolConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(Notify::new());

        let (hits2, done2) = (hits.clone(), done.clone());
        let accepted = pool.submit(Box::pin(async move {
            hits2.fetch_add(1, Ordering::SeqCst);
            done2.notify_one();
        }));
        assert!(accepted.is_ok());

        done.notified().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn full_queue_rejects_submission() {
        let pool = FixedPool::new(PoolConfig {
            workers: 1,
            queue_capacity: 1,
            grace: Duration::from_secs(1),
        });
        let gate = Arc::new(Notify::new());

        // Occupy the single worker.
        let g = gate.clone();
        pool.submit(Box::pin(async move { g.notified().await }))
            .map_err(|_| ())
            .expect("first job accepted");
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Fill the queue, then overflow it.
        pool.submit(Box::pin(async {}))
            .map_err(|_| ())
            .expect("queued job accepted");
        let overflow = pool.submit(Box::pin(async {}));
        assert!(overflow.is_err());

        gate.notify_waiters();
        pool.drain().await;
    }

    #[tokio::test]
    async fn drain_runs_queued_jobs_and_stops_accepting() {
        let pool = FixedPool::new(PoolConfig {
            workers: 2,
            queue_capacity: 16,
            grace: Duration::from_secs(1),
        });
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let hits = hits.clone();
            pool.submit(Box::pin(async move {
                hits.fetch_add(1, Ordering::SeqCst);
            }))
            .map_err(|_| ())
            .expect("job accepted");
        }

        pool.drain().await;
        assert_eq!(hits.load(Ordering::SeqCst), 8);
        assert!(pool.submit(Box::pin(async {})).is_err());
    }
}
