//! # Delivery strategy: where listener callbacks run.
//!
//! [`DeliveryStrategy`] selects the dispatch mode for an
//! [`EventBus`](crate::EventBus):
//!
//! - [`DeliveryStrategy::Inline`] — listeners run on the dispatching task;
//!   `dispatch` returns after the whole snapshot has completed.
//! - [`DeliveryStrategy::Pooled`] — each listener invocation is submitted to
//!   a [`WorkerPool`]; `dispatch` returns after submission.
//!
//! The pool handle is shared but lifecycle-external: the bus submits work and
//! asks the pool to drain on shutdown, nothing more. Creating, sizing, and
//! ultimately dropping the pool is its owner's concern.

use std::fmt;
use std::sync::Arc;

use crate::bus::WorkerPool;

/// How a bus hands events to listeners.
#[derive(Clone)]
pub enum DeliveryStrategy {
    /// Run every listener on the dispatching task, in snapshot order.
    Inline,
    /// Submit each listener invocation to the worker pool, fire-and-forget.
    Pooled(Arc<dyn WorkerPool>),
}

impl fmt::Debug for DeliveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStrategy::Inline => f.write_str("Inline"),
            DeliveryStrategy::Pooled(_) => f.write_str("Pooled"),
        }
    }
}
