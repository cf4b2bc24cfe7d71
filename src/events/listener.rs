//! # Core listener trait and closure adapter.
//!
//! [`Listener`] is the extension point for consuming events from an
//! [`EventBus`](crate::EventBus) or [`EventDispatcher`](crate::EventDispatcher).
//! The delivering component catches both returned errors and panics, so a
//! failing listener degrades only its own delivery, never the dispatch loop.
//!
//! ## Contract
//! - `on_event` is invoked once per dispatched event the listener is
//!   registered for, on the dispatching task (inline) or a pool worker
//!   (pooled).
//! - Implementations registered twice are invoked twice; the bus performs no
//!   duplicate detection.
//!
//! ## Example (skeleton)
//! ```rust
//! use async_trait::async_trait;
//! use fanout::{BoxError, Listener};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Listener<String> for Audit {
//!     async fn on_event(&self, event: &String) -> Result<(), BoxError> {
//!         // write audit record...
//!         let _ = event;
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::{panic_reason, BoxError, BusError};

/// Contract for event consumers.
///
/// Implementations should be fast or offload their own long work; inline
/// dispatch suspends the publishing task until every listener in the snapshot
/// has returned.
#[async_trait]
pub trait Listener<E>: Send + Sync {
    /// Handles a single event.
    ///
    /// Returning `Err` (or panicking) marks this delivery failed without
    /// affecting the remaining listeners in the snapshot.
    async fn on_event(&self, event: &E) -> Result<(), BoxError>;

    /// Human-readable name (for logs and error reports).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Function-backed listener implementation.
///
/// Wraps a closure that *creates* a new future per delivery, receiving an
/// owned clone of the event. This avoids shared mutable state; if state must
/// be shared across deliveries, capture an `Arc<...>` explicitly inside the
/// closure.
///
/// ## Example
/// ```rust
/// use fanout::{BoxError, ListenerFn};
///
/// let l = ListenerFn::arc("greeter", |name: String| async move {
///     println!("hello, {name}");
///     Ok::<_, BoxError>(())
/// });
/// assert_eq!(fanout::Listener::<String>::name(&*l), "greeter");
/// ```
pub struct ListenerFn<F> {
    name: &'static str,
    f: F,
}

impl<F> ListenerFn<F> {
    /// Creates a new function-backed listener.
    ///
    /// Prefer [`ListenerFn::arc`] when you immediately need an
    /// `Arc<dyn Listener<E>>`.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    /// Creates the listener and returns it as a shared handle.
    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<E, F, Fut> Listener<E> for ListenerFn<F>
where
    E: Clone + Send + Sync + 'static,
    F: Fn(E) -> Fut + Send + Sync, // Fn, not FnMut
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn on_event(&self, event: &E) -> Result<(), BoxError> {
        (self.f)(event.clone()).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Runs every listener in the snapshot on the current task, in order.
///
/// Failures (returned errors and panics) are isolated per listener: the loop
/// always finishes the snapshot, and the *first* failure is the one returned.
pub(crate) async fn deliver_inline<E: Send + Sync>(
    listeners: &[Arc<dyn Listener<E>>],
    event: &E,
) -> Result<(), BusError> {
    let mut first_err: Option<BusError> = None;

    for listener in listeners {
        let outcome = std::panic::AssertUnwindSafe(listener.on_event(event))
            .catch_unwind()
            .await;
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err.to_string()),
            Err(payload) => Some(panic_reason(payload)),
        };
        if let Some(reason) = failure {
            tracing::debug!(
                listener = listener.name(),
                %reason,
                "listener failed; continuing with remaining listeners"
            );
            if first_err.is_none() {
                first_err = Some(BusError::Delivery {
                    listener: listener.name(),
                    reason,
                });
            }
        }
    }

    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
