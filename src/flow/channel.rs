//! # Backpressure-aware broadcaster.
//!
//! [`FlowChannel`] delivers published items to any number of subscribers
//! while respecting each subscriber's declared consumption rate. A producer
//! can never overrun a subscriber: items wait in that subscription's buffer
//! until credit arrives.
//!
//! ## Architecture
//! ```text
//! publish(event)
//!     │
//!     ├──► [buffer 1 | credit 1] ──► worker 1 ──► subscriber1.on_next()
//!     │                                  └──────► panic/Err → logged, keep going
//!     ├──► [buffer 2 | credit 2] ──► worker 2 ──► subscriber2.on_next()
//!     └──► [buffer N | credit N] ──► worker N ──► subscriberN.on_next()
//!
//! request(n) ──► credit += n ──► worker wakes, drains while credit > 0
//! ```
//!
//! ## Rules
//! - **Per-subscription FIFO**: items are delivered in publish order.
//! - **Credit conservation**: deliveries never exceed the credit granted;
//!   buffer and credit mutate under one lock.
//! - **No cross-subscription coupling**: a slow subscriber fills only its own
//!   buffer (unless a bounded buffer with [`OverflowPolicy::Block`] is
//!   configured, in which case `publish` waits for *that* subscription).
//! - **Terminal outcomes**: `complete` lets each buffer drain under credit
//!   before `on_complete`; `fail` discards buffers and reports `on_error`
//!   immediately. Cancellation is silent.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use fanout::{BoxError, FlowChannel, FlowSubscriber, Subscription};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl FlowSubscriber<u32> for Printer {
//!     async fn on_subscribed(&self, subscription: Subscription<u32>) {
//!         let _ = subscription.request(1);
//!     }
//!     async fn on_next(&self, item: u32) -> Result<(), BoxError> {
//!         println!("got {item}");
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let channel = FlowChannel::new();
//! let subscription = channel.subscribe(Arc::new(Printer)).await;
//! channel.publish(1).await?;
//! subscription.request(1)?; // one more
//! channel.publish(2).await?;
//! channel.complete();
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{panic_reason, FlowError};
use crate::flow::{FlowConfig, FlowSubscriber, OverflowPolicy, Phase, SubShared, Subscription};

/// Terminal outcome of a channel, remembered for late subscribers.
#[derive(Clone)]
enum Terminal {
    Completed,
    Failed(Arc<str>),
}

struct ChannelState<E> {
    subs: Vec<Arc<SubShared<E>>>,
    terminal: Option<Terminal>,
}

struct ChannelShared<E> {
    state: Mutex<ChannelState<E>>,
    cfg: FlowConfig,
    next_id: AtomicU64,
    /// Cancelled when a non-terminal channel is dropped, releasing workers.
    teardown: CancellationToken,
}

/// Backpressure-aware broadcaster with per-subscription demand credit.
pub struct FlowChannel<E> {
    shared: Arc<ChannelShared<E>>,
}

impl<E: Clone + Send + Sync + 'static> FlowChannel<E> {
    /// Creates a channel with unbounded per-subscription buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FlowConfig::default())
    }

    /// Creates a channel with an explicit buffer policy.
    #[must_use]
    pub fn with_config(cfg: FlowConfig) -> Self {
        Self {
            shared: Arc::new(ChannelShared {
                state: Mutex::new(ChannelState {
                    subs: Vec::new(),
                    terminal: None,
                }),
                cfg,
                next_id: AtomicU64::new(0),
                teardown: CancellationToken::new(),
            }),
        }
    }

    /// Attaches a subscriber and returns its demand handle.
    ///
    /// `on_subscribed` runs before the subscription can receive anything;
    /// request initial credit there, or through the returned handle. On a
    /// terminal channel the subscriber receives `on_subscribed` followed
    /// immediately by the terminal callback, and the handle is revoked.
    pub async fn subscribe(&self, subscriber: Arc<dyn FlowSubscriber<E>>) -> Subscription<E> {
        let id = self.shared.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        let sub = SubShared::new(id, subscriber.name());
        let handle = Subscription::new(&sub);

        subscriber.on_subscribed(handle.clone()).await;

        let raced_terminal = {
            let mut state = self.shared.state.lock();
            let terminal = state.terminal.clone();
            if terminal.is_none() {
                state.subs.push(Arc::clone(&sub));
            }
            terminal
        };
        if let Some(terminal) = raced_terminal {
            match terminal {
                Terminal::Completed => subscriber.on_complete().await,
                Terminal::Failed(reason) => subscriber.on_error(&reason).await,
            }
            sub.cancel();
            return handle;
        }

        spawn_worker(Arc::downgrade(&self.shared), sub, subscriber);
        handle
    }

    /// Enqueues `event` for every active subscription, waking workers with
    /// outstanding credit.
    ///
    /// Suspends only when a bounded buffer is full under
    /// [`OverflowPolicy::Block`], and only for the congested subscription.
    ///
    /// ## Errors
    /// [`FlowError::Closed`] after `complete` or `fail`.
    pub async fn publish(&self, event: E) -> Result<(), FlowError> {
        let snapshot = {
            let state = self.shared.state.lock();
            if state.terminal.is_some() {
                return Err(FlowError::Closed);
            }
            state.subs.clone()
        };
        for sub in snapshot {
            self.offer(&sub, &event).await;
        }
        Ok(())
    }

    /// Marks the channel terminal. Each active subscription drains its buffer
    /// under the credit protocol, then receives one `on_complete`. Idempotent.
    pub fn complete(&self) {
        let subs = match self.seal(Terminal::Completed) {
            Some(subs) => subs,
            None => return,
        };
        for sub in subs {
            {
                let mut state = sub.state.lock();
                if state.phase == Phase::Active {
                    state.phase = Phase::Completed;
                }
            }
            sub.wake.notify_one();
            sub.space.notify_one();
        }
    }

    /// Marks the channel failed. Buffered items are discarded and each active
    /// subscription receives one `on_error(reason)`. Idempotent.
    pub fn fail(&self, reason: impl Into<Arc<str>>) {
        let reason: Arc<str> = reason.into();
        let subs = match self.seal(Terminal::Failed(Arc::clone(&reason))) {
            Some(subs) => subs,
            None => return,
        };
        for sub in subs {
            {
                let mut state = sub.state.lock();
                if state.phase == Phase::Active {
                    state.phase = Phase::Errored;
                    state.reason = Some(Arc::clone(&reason));
                    state.buffer.clear();
                    state.credit = 0;
                }
            }
            sub.wake.notify_one();
            sub.space.notify_one();
        }
    }

    /// Returns whether `complete` or `fail` has been called.
    pub fn is_terminal(&self) -> bool {
        self.shared.state.lock().terminal.is_some()
    }

    /// Returns the number of attached subscriptions (including terminal ones
    /// whose workers have not finished tearing down yet).
    pub fn subscription_count(&self) -> usize {
        self.shared.state.lock().subs.len()
    }

    /// Records the terminal outcome once; returns the subscriptions to notify
    /// or `None` when already terminal.
    fn seal(&self, terminal: Terminal) -> Option<Vec<Arc<SubShared<E>>>> {
        let mut state = self.shared.state.lock();
        if state.terminal.is_some() {
            return None;
        }
        state.terminal = Some(terminal);
        Some(state.subs.clone())
    }

    /// Enqueues one item for one subscription, honoring its buffer policy.
    async fn offer(&self, sub: &Arc<SubShared<E>>, event: &E) {
        let limit = self.shared.cfg.capacity_limit();
        loop {
            {
                let mut state = sub.state.lock();
                if state.phase != Phase::Active {
                    drop(state);
                    // Cascade the wake so other suspended publishers re-check.
                    sub.space.notify_one();
                    return;
                }
                let full = limit.is_some_and(|limit| state.buffer.len() >= limit);
                if !full {
                    state.buffer.push_back(event.clone());
                    drop(state);
                    sub.wake.notify_one();
                    return;
                }
                if self.shared.cfg.overflow == OverflowPolicy::DropOldest {
                    state.buffer.pop_front();
                    state.buffer.push_back(event.clone());
                    drop(state);
                    tracing::debug!(
                        subscriber = sub.name,
                        "buffer full; dropped oldest item for slow subscription"
                    );
                    sub.wake.notify_one();
                    return;
                }
            }
            sub.space.notified().await;
        }
    }
}

impl<E: Clone + Send + Sync + 'static> Default for FlowChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Drop for FlowChannel<E> {
    fn drop(&mut self) {
        let terminal = self.shared.state.lock().terminal.is_some();
        if !terminal {
            // No completion to drain towards; release the workers.
            self.shared.teardown.cancel();
        }
    }
}

/// One scheduling decision for a subscription worker.
enum Step<E> {
    Deliver(E),
    Complete,
    Error(Arc<str>),
    Wait,
    Exit,
}

/// Takes the next decision under the subscription lock.
///
/// Credit is decremented in the same critical section that pops the buffer;
/// this is what makes the conservation invariant hold under races between
/// publish- and request-triggered wakeups.
fn next_step<E>(sub: &SubShared<E>) -> Step<E> {
    let mut state = sub.state.lock();
    match state.phase {
        Phase::Cancelled => Step::Exit,
        Phase::Errored => {
            let reason = state
                .reason
                .take()
                .unwrap_or_else(|| Arc::from("channel failed"));
            Step::Error(reason)
        }
        Phase::Active | Phase::Completed => {
            if state.credit > 0 {
                if let Some(item) = state.buffer.pop_front() {
                    state.credit -= 1;
                    return Step::Deliver(item);
                }
            }
            if state.phase == Phase::Completed && state.buffer.is_empty() {
                Step::Complete
            } else {
                Step::Wait
            }
        }
    }
}

/// Spawns the dedicated delivery worker for one subscription.
fn spawn_worker<E: Clone + Send + Sync + 'static>(
    channel: Weak<ChannelShared<E>>,
    sub: Arc<SubShared<E>>,
    subscriber: Arc<dyn FlowSubscriber<E>>,
) {
    let teardown = match channel.upgrade() {
        Some(shared) => shared.teardown.clone(),
        None => return,
    };
    tokio::spawn(async move {
        loop {
            match next_step(&sub) {
                Step::Deliver(item) => {
                    sub.space.notify_one();
                    let outcome = std::panic::AssertUnwindSafe(subscriber.on_next(item))
                        .catch_unwind()
                        .await;
                    match outcome {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            tracing::warn!(
                                subscriber = sub.name,
                                error = %err,
                                "subscriber failed to process item"
                            );
                        }
                        Err(payload) => {
                            tracing::warn!(
                                subscriber = sub.name,
                                reason = %panic_reason(payload),
                                "subscriber panicked while processing item"
                            );
                        }
                    }
                }
                Step::Complete => {
                    let _ = std::panic::AssertUnwindSafe(subscriber.on_complete())
                        .catch_unwind()
                        .await;
                    break;
                }
                Step::Error(reason) => {
                    let _ = std::panic::AssertUnwindSafe(subscriber.on_error(&reason))
                        .catch_unwind()
                        .await;
                    break;
                }
                Step::Exit => break,
                Step::Wait => {
                    tokio::select! {
                        _ = teardown.cancelled() => break,
                        _ = sub.wake.notified() => {}
                    }
                }
            }
        }
        // Tear down: revoke the handle's phase, leave the roster, and release
        // any publisher still parked on this subscription.
        sub.cancel();
        if let Some(shared) = channel.upgrade() {
            shared.state.lock().subs.retain(|s| s.id != sub.id);
        }
        sub.space.notify_one();
    });
}
