//! # Keyed publish/subscribe bus with pluggable delivery.
//!
//! [`EventBus`] owns a [`ListenerRegistry`] and a [`DeliveryStrategy`].
//! Dispatch resolves the event's key, snapshots the listeners registered for
//! it, and delivers per the strategy.
//!
//! ## Rules
//! - **Per-key ordering**: a single dispatch invokes listeners in
//!   registration-snapshot order. No ordering exists across different keys.
//! - **Isolation**: one failing listener never blocks the rest of the
//!   snapshot. Inline dispatch surfaces the *first* failure to the caller;
//!   pooled dispatch reports callback failures through `tracing` since the
//!   caller has already returned.
//! - **At-least-once**: every listener in the snapshot is invoked (inline)
//!   or submitted (pooled) exactly once per dispatch; duplicate registration
//!   means duplicate invocation.
//! - **Lifecycle**: Open → Closed, one way. Dispatch on a closed bus fails
//!   with [`BusError::Closed`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use fanout::{BoxError, Event, EventBus, ListenerFn};
//!
//! #[derive(Clone, Debug)]
//! struct OrderPlaced { id: u32 }
//!
//! impl Event for OrderPlaced {
//!     type Key = &'static str;
//!     fn key(&self) -> Self::Key { "order_placed" }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = EventBus::inline();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = seen.clone();
//! bus.register("order_placed", ListenerFn::arc("count", move |_ev: OrderPlaced| {
//!     let counter = counter.clone();
//!     async move {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!         Ok::<_, BoxError>(())
//!     }
//! }));
//!
//! bus.dispatch(OrderPlaced { id: 7 }).await?;
//! assert_eq!(seen.load(Ordering::Relaxed), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use futures::FutureExt;

use crate::bus::{DeliveryStrategy, Job, ListenerRegistry, WorkerPool};
use crate::error::{panic_reason, BusError};
use crate::events::{deliver_inline, Event, Listener};

/// Publish/subscribe façade routing events by their type key.
pub struct EventBus<E: Event> {
    registry: ListenerRegistry<E>,
    strategy: DeliveryStrategy,
    closed: AtomicBool,
}

impl<E: Event> EventBus<E> {
    /// Creates a bus that runs listeners on the dispatching task.
    #[must_use]
    pub fn inline() -> Self {
        Self::with_strategy(DeliveryStrategy::Inline)
    }

    /// Creates a bus that submits listener invocations to `pool`.
    ///
    /// The pool is externally owned; the bus only submits work through it and
    /// asks it to drain on [`EventBus::shutdown`].
    #[must_use]
    pub fn pooled(pool: Arc<dyn WorkerPool>) -> Self {
        Self::with_strategy(DeliveryStrategy::Pooled(pool))
    }

    /// Creates a bus with an explicit strategy.
    #[must_use]
    pub fn with_strategy(strategy: DeliveryStrategy) -> Self {
        Self {
            registry: ListenerRegistry::new(),
            strategy,
            closed: AtomicBool::new(false),
        }
    }

    /// Registers a listener for `key`. See [`ListenerRegistry::register`].
    pub fn register(&self, key: E::Key, listener: Arc<dyn Listener<E>>) {
        self.registry.register(key, listener);
    }

    /// Removes the first matching registration for `key`. No-op if absent.
    pub fn remove(&self, key: &E::Key, listener: &Arc<dyn Listener<E>>) {
        self.registry.remove(key, listener);
    }

    /// Returns whether [`EventBus::shutdown`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::Acquire)
    }

    /// Dispatches `event` to every listener registered for its key.
    ///
    /// ## Inline strategy
    /// Suspends until the whole snapshot has run. Listener errors and panics
    /// are isolated; the first failure is returned as
    /// [`BusError::Delivery`].
    ///
    /// ## Pooled strategy
    /// Returns after submitting one job per listener. A rejected submission
    /// degrades only that listener: remaining listeners are still submitted,
    /// every rejection is logged, and the first one is returned as
    /// [`BusError::Rejected`]. Callback failures inside accepted jobs are
    /// reported via `tracing::warn!`.
    pub async fn dispatch(&self, event: E) -> Result<(), BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        let snapshot = self.registry.snapshot_for(&event.key());

        match &self.strategy {
            DeliveryStrategy::Inline => deliver_inline(&snapshot, &event).await,
            DeliveryStrategy::Pooled(pool) => {
                let mut first_rejection: Option<BusError> = None;
                for listener in snapshot {
                    let name = listener.name();
                    let job = Self::pooled_job(listener, event.clone());
                    if pool.submit(job).is_err() {
                        tracing::warn!(listener = name, "worker pool rejected dispatch job");
                        if first_rejection.is_none() {
                            first_rejection = Some(BusError::Rejected { listener: name });
                        }
                    }
                }
                match first_rejection {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            }
        }
    }

    /// Closes the bus: subsequent dispatches fail with [`BusError::Closed`].
    ///
    /// Under the pooled strategy the first call also awaits the pool's drain
    /// protocol (bounded by the pool's own grace policy). Idempotent.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, AtomicOrdering::AcqRel) {
            return;
        }
        if let DeliveryStrategy::Pooled(pool) = &self.strategy {
            pool.drain().await;
        }
    }

    /// Builds one fire-and-forget job delivering `event` to `listener`.
    fn pooled_job(listener: Arc<dyn Listener<E>>, event: E) -> Job {
        let name = listener.name();
        Box::pin(async move {
            let outcome = std::panic::AssertUnwindSafe(listener.on_event(&event))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(listener = name, error = %err, "listener failed during pooled dispatch");
                }
                Err(payload) => {
                    tracing::warn!(
                        listener = name,
                        reason = %panic_reason(payload),
                        "listener panicked during pooled dispatch"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{FixedPool, PoolConfig};
    use crate::error::BoxError;
    use crate::events::ListenerFn;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    #[derive(Clone, Debug)]
    enum ShopEvent {
        Order { id: u32 },
        Refund,
    }

    impl Event for ShopEvent {
        type Key = &'static str;

        fn key(&self) -> Self::Key {
            match self {
                ShopEvent::Order { .. } => "order",
                ShopEvent::Refund => "refund",
            }
        }
    }

    fn recorder(
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn Listener<ShopEvent>> {
        ListenerFn::arc(name, move |_ev: ShopEvent| {
            let log = log.clone();
            async move {
                log.lock().push(name);
                Ok::<_, BoxError>(())
            }
        })
    }

    #[tokio::test]
    async fn inline_dispatch_follows_registration_order() {
        let bus = EventBus::inline();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.register("order", recorder("first", log.clone()));
        bus.register("order", recorder("second", log.clone()));

        bus.dispatch(ShopEvent::Order { id: 1 }).await.unwrap();
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn dispatch_routes_by_key_only() {
        let bus = EventBus::inline();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.register("refund", recorder("refund_only", log.clone()));
        bus.dispatch(ShopEvent::Order { id: 1 }).await.unwrap();
        assert!(log.lock().is_empty());

        bus.dispatch(ShopEvent::Refund).await.unwrap();
        assert_eq!(*log.lock(), vec!["refund_only"]);
    }

    #[tokio::test]
    async fn failing_listener_does_not_stop_the_snapshot() {
        let bus = EventBus::inline();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.register(
            "order",
            ListenerFn::arc("boom", |_ev: ShopEvent| async {
                Err::<(), BoxError>("boom".into())
            }),
        );
        bus.register(
            "order",
            ListenerFn::arc("panicky", |_ev: ShopEvent| async {
                panic!("listener blew up");
            }),
        );
        bus.register("order", recorder("survivor", log.clone()));

        let err = bus.dispatch(ShopEvent::Order { id: 2 }).await.unwrap_err();
        // First failure wins; the rest of the snapshot still ran.
        match err {
            BusError::Delivery { listener, reason } => {
                assert_eq!(listener, "boom");
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*log.lock(), vec!["survivor"]);
    }

    #[tokio::test]
    async fn removed_listener_is_not_invoked() {
        let bus = EventBus::inline();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener = recorder("gone", log.clone());

        bus.register("order", listener.clone());
        bus.remove(&"order", &listener);

        bus.dispatch(ShopEvent::Order { id: 3 }).await.unwrap();
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_and_closes_dispatch() {
        let bus: EventBus<ShopEvent> = EventBus::inline();
        bus.shutdown().await;
        bus.shutdown().await;
        assert!(bus.is_closed());

        let err = bus.dispatch(ShopEvent::Refund).await.unwrap_err();
        assert!(matches!(err, BusError::Closed));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pooled_dispatch_runs_listeners_in_parallel() {
        let pool = FixedPool::arc(PoolConfig {
            workers: 2,
            queue_capacity: 16,
            grace: Duration::from_secs(5),
        });
        let bus = EventBus::pooled(pool);
        let done = Arc::new(AtomicUsize::new(0));

        let counter = done.clone();
        bus.register(
            "order",
            ListenerFn::arc("sleeper", move |_ev: ShopEvent| {
                let counter = counter.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                }
            }),
        );

        let started = Instant::now();
        for id in 0..5 {
            bus.dispatch(ShopEvent::Order { id }).await.unwrap();
        }
        while done.load(Ordering::SeqCst) < 5 {
            assert!(started.elapsed() < Duration::from_secs(1), "pool stalled");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        // Two workers over five 50ms jobs: well under the 250ms serial cost.
        assert!(started.elapsed() < Duration::from_millis(240));

        bus.shutdown().await;
    }

    #[tokio::test]
    async fn pool_rejection_degrades_one_listener_only() {
        struct RejectingPool;

        #[async_trait]
        impl WorkerPool for RejectingPool {
            fn submit(&self, job: Job) -> Result<(), Job> {
                Err(job)
            }
        }

        let bus = EventBus::pooled(Arc::new(RejectingPool));
        bus.register(
            "order",
            ListenerFn::arc("unlucky", |_ev: ShopEvent| async {
                Ok::<_, BoxError>(())
            }),
        );

        let err = bus.dispatch(ShopEvent::Order { id: 9 }).await.unwrap_err();
        match err {
            BusError::Rejected { listener } => assert_eq!(listener, "unlucky"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
