//! # Per-subscriber demand state machine.
//!
//! Each subscription is an explicit state machine:
//!
//! ```text
//!            request(n)                    complete()
//!   Active ◄───────────► Active            ───────────► Completed ──► (buffer drains) ──► on_complete
//!   (no credit)          (credit > 0)
//!      │                     │              fail(r)
//!      │                     │             ───────────► Errored ──► on_error, buffer discarded
//!      └────── cancel() ─────┘
//!                │
//!                ▼
//!            Cancelled  (no further callbacks, buffer discarded)
//! ```
//!
//! Buffer and credit live under one mutex, so a race between a
//! publish-triggered delivery and a request-triggered delivery can neither
//! exceed the granted credit nor skip an item. Credit accumulates with
//! saturating arithmetic and is consumed strictly in publish order.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::FlowError;

/// Lifecycle phase of one subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Accepting items; delivery gated on credit.
    Active,
    /// Detached by the subscriber; terminal, silent.
    Cancelled,
    /// Channel completed; draining the buffer under credit, then `on_complete`.
    Completed,
    /// Channel failed; `on_error` pending, buffer discarded.
    Errored,
}

pub(crate) struct SubState<E> {
    pub(crate) buffer: VecDeque<E>,
    pub(crate) credit: u64,
    pub(crate) phase: Phase,
    /// Failure reason, set when entering [`Phase::Errored`].
    pub(crate) reason: Option<Arc<str>>,
}

/// State shared between the channel, the delivery worker, and the
/// subscriber-held [`Subscription`] handle.
pub(crate) struct SubShared<E> {
    pub(crate) id: u64,
    pub(crate) name: &'static str,
    pub(crate) state: Mutex<SubState<E>>,
    /// Wakes the delivery worker (new item, new credit, phase change).
    pub(crate) wake: Notify,
    /// Wakes publishers suspended on a full bounded buffer.
    pub(crate) space: Notify,
}

impl<E> SubShared<E> {
    pub(crate) fn new(id: u64, name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            name,
            state: Mutex::new(SubState {
                buffer: VecDeque::new(),
                credit: 0,
                phase: Phase::Active,
                reason: None,
            }),
            wake: Notify::new(),
            space: Notify::new(),
        })
    }

    /// Grants `n` credits. Credit saturates rather than overflowing.
    ///
    /// Accepted while [`Phase::Active`] and while draining after completion;
    /// rejected once the subscription is cancelled or errored.
    pub(crate) fn request(&self, n: u64) -> Result<(), FlowError> {
        if n == 0 {
            return Err(FlowError::InvalidDemand { requested: n });
        }
        {
            let mut state = self.state.lock();
            match state.phase {
                Phase::Active | Phase::Completed => {
                    state.credit = state.credit.saturating_add(n);
                }
                Phase::Cancelled | Phase::Errored => return Err(FlowError::Closed),
            }
        }
        self.wake.notify_one();
        Ok(())
    }

    /// Marks the subscription cancelled and discards its buffer. Idempotent;
    /// a no-op once errored (the error outcome already owns the teardown).
    pub(crate) fn cancel(&self) {
        {
            let mut state = self.state.lock();
            if matches!(state.phase, Phase::Cancelled | Phase::Errored) {
                return;
            }
            state.phase = Phase::Cancelled;
            state.buffer.clear();
            state.credit = 0;
        }
        self.wake.notify_one();
        self.space.notify_one();
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state.lock().phase == Phase::Active
    }
}

/// Demand handle held by a subscriber.
///
/// The handle is weak: once the subscription reaches a terminal phase and is
/// torn down, [`Subscription::request`] fails with [`FlowError::Closed`].
pub struct Subscription<E> {
    shared: Weak<SubShared<E>>,
}

impl<E> Subscription<E> {
    pub(crate) fn new(shared: &Arc<SubShared<E>>) -> Self {
        Self {
            shared: Arc::downgrade(shared),
        }
    }

    /// Grants `n` additional delivery credits.
    ///
    /// ## Errors
    /// - [`FlowError::InvalidDemand`] if `n == 0`
    /// - [`FlowError::Closed`] if the subscription is cancelled, errored, or
    ///   already torn down
    pub fn request(&self, n: u64) -> Result<(), FlowError> {
        match self.shared.upgrade() {
            Some(shared) => shared.request(n),
            None => Err(FlowError::Closed),
        }
    }

    /// Detaches the subscriber: buffered items are discarded and no further
    /// callbacks are delivered. Idempotent.
    pub fn cancel(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.cancel();
        }
    }

    /// Returns whether the subscription still accepts items.
    pub fn is_active(&self) -> bool {
        self.shared.upgrade().is_some_and(|shared| shared.is_active())
    }
}

impl<E> Clone for Subscription<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_demand_is_rejected() {
        let shared = SubShared::<u32>::new(1, "test");
        let sub = Subscription::new(&shared);
        assert!(matches!(
            sub.request(0),
            Err(FlowError::InvalidDemand { requested: 0 })
        ));
    }

    #[test]
    fn credit_saturates() {
        let shared = SubShared::<u32>::new(1, "test");
        shared.request(u64::MAX).unwrap();
        shared.request(5).unwrap();
        assert_eq!(shared.state.lock().credit, u64::MAX);
    }

    #[test]
    fn request_after_cancel_is_closed() {
        let shared = SubShared::<u32>::new(1, "test");
        let sub = Subscription::new(&shared);
        sub.cancel();
        sub.cancel(); // idempotent
        assert!(matches!(sub.request(1), Err(FlowError::Closed)));
        assert!(!sub.is_active());
    }

    #[test]
    fn handle_is_revoked_when_subscription_is_torn_down() {
        let shared = SubShared::<u32>::new(1, "test");
        let sub = Subscription::new(&shared);
        drop(shared);
        assert!(matches!(sub.request(1), Err(FlowError::Closed)));
    }
}
