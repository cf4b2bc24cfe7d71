//! # Scoped one-to-many dispatcher (the "megaphone").
//!
//! [`EventDispatcher`] is a per-owner broadcaster for a single event type:
//! the dispatcher instance itself *is* the routing key, so there is no
//! registry lookup. It exists for a component that wants a private,
//! low-overhead broadcast channel — a download manager announcing progress,
//! a watcher announcing file changes — without sharing a bus-wide registry.
//!
//! Delivery is strictly inline, in listener-registration order at the time
//! the dispatch snapshot is taken, with the same isolation and first-error
//! policy as the inline [`EventBus`](crate::EventBus). Two dispatcher
//! instances never cross-deliver.
//!
//! ## Example
//! ```rust
//! use fanout::{BoxError, EventDispatcher, ListenerFn};
//!
//! #[derive(Clone, Debug)]
//! struct Progress { percent: u8 }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = EventDispatcher::new();
//! dispatcher.add_listener(ListenerFn::arc("print", |p: Progress| async move {
//!     println!("{}%", p.percent);
//!     Ok::<_, BoxError>(())
//! }));
//! dispatcher.dispatch(&Progress { percent: 40 }).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::BusError;
use crate::events::{deliver_inline, Listener};

/// Single-event-type broadcaster owned by one component.
pub struct EventDispatcher<E> {
    listeners: RwLock<Vec<Arc<dyn Listener<E>>>>,
}

impl<E: Send + Sync> EventDispatcher<E> {
    /// Creates a dispatcher with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Appends a listener to this dispatcher instance.
    pub fn add_listener(&self, listener: Arc<dyn Listener<E>>) {
        self.listeners.write().push(listener);
    }

    /// Removes the first pointer-equal listener. No-op if absent.
    pub fn remove_listener(&self, listener: &Arc<dyn Listener<E>>) {
        let mut listeners = self.listeners.write();
        if let Some(pos) = listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
            listeners.remove(pos);
        }
    }

    /// Returns how many listeners are currently attached.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Delivers `event` to every listener attached to THIS dispatcher.
    ///
    /// Runs inline on the calling task, in registration-snapshot order.
    /// Failures are isolated per listener; the first one is returned as
    /// [`BusError::Delivery`].
    pub async fn dispatch(&self, event: &E) -> Result<(), BusError> {
        let snapshot = self.listeners.read().clone();
        deliver_inline(&snapshot, event).await
    }
}

impl<E: Send + Sync> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::events::ListenerFn;
    use parking_lot::Mutex;

    #[derive(Clone, Debug)]
    struct Tick(u32);

    fn recorder(name: &'static str, log: Arc<Mutex<Vec<(&'static str, u32)>>>) -> Arc<dyn Listener<Tick>> {
        ListenerFn::arc(name, move |ev: Tick| {
            let log = log.clone();
            async move {
                log.lock().push((name, ev.0));
                Ok::<_, BoxError>(())
            }
        })
    }

    #[tokio::test]
    async fn delivers_in_registration_order() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        dispatcher.add_listener(recorder("a", log.clone()));
        dispatcher.add_listener(recorder("b", log.clone()));
        dispatcher.dispatch(&Tick(1)).await.unwrap();

        assert_eq!(*log.lock(), vec![("a", 1), ("b", 1)]);
    }

    #[tokio::test]
    async fn instances_are_isolated() {
        let left = EventDispatcher::new();
        let right = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        left.add_listener(recorder("left", log.clone()));
        right.add_listener(recorder("right", log.clone()));

        left.dispatch(&Tick(7)).await.unwrap();
        assert_eq!(*log.lock(), vec![("left", 7)]);
    }

    #[tokio::test]
    async fn failure_is_isolated_and_first_error_wins() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        dispatcher.add_listener(ListenerFn::arc("bad", |_ev: Tick| async {
            Err::<(), BoxError>("out of disk".into())
        }));
        dispatcher.add_listener(recorder("good", log.clone()));

        let err = dispatcher.dispatch(&Tick(3)).await.unwrap_err();
        match err {
            BusError::Delivery { listener, .. } => assert_eq!(listener, "bad"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*log.lock(), vec![("good", 3)]);
    }

    #[tokio::test]
    async fn removed_listener_stops_receiving() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener = recorder("transient", log.clone());

        dispatcher.add_listener(listener.clone());
        dispatcher.remove_listener(&listener);
        assert_eq!(dispatcher.listener_count(), 0);

        dispatcher.dispatch(&Tick(9)).await.unwrap();
        assert!(log.lock().is_empty());
    }
}
