//! # Thread-safe listener registry with copy-on-read snapshots.
//!
//! [`ListenerRegistry`] maps an event-type key to an ordered listener list.
//! Dispatch never iterates the live collection: it takes an owned snapshot
//! under a brief read lock, so registration and removal proceed concurrently
//! with an in-flight dispatch.
//!
//! ## Rules
//! - **Insertion order preserved** per key; snapshots reflect it.
//! - **No duplicate detection**: registering the same listener twice yields
//!   two invocations per dispatch.
//! - **Weak consistency under races**: a listener registered while a dispatch
//!   is in flight may or may not see that dispatch's event — the snapshot was
//!   taken at an arbitrary point relative to the registration.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::{Event, Listener};

/// Ordered, thread-safe mapping from event-type key to listeners.
pub struct ListenerRegistry<E: Event> {
    entries: RwLock<HashMap<E::Key, Vec<Arc<dyn Listener<E>>>>>,
}

impl<E: Event> ListenerRegistry<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a listener to the ordered list for `key`, creating the list if
    /// absent. Always succeeds.
    pub fn register(&self, key: E::Key, listener: Arc<dyn Listener<E>>) {
        self.entries.write().entry(key).or_default().push(listener);
    }

    /// Returns a point-in-time ordered snapshot of the listeners for `key`.
    ///
    /// The snapshot is safe to iterate while registration/removal proceeds on
    /// the live collection; it never observes a torn entry.
    pub fn snapshot_for(&self, key: &E::Key) -> Vec<Arc<dyn Listener<E>>> {
        self.entries.read().get(key).cloned().unwrap_or_default()
    }

    /// Removes the first entry for `key` that is pointer-equal to `listener`.
    /// No-op if absent.
    pub fn remove(&self, key: &E::Key, listener: &Arc<dyn Listener<E>>) {
        let mut entries = self.entries.write();
        let mut drop_key = false;
        if let Some(list) = entries.get_mut(key) {
            if let Some(pos) = list.iter().position(|l| Arc::ptr_eq(l, listener)) {
                list.remove(pos);
                drop_key = list.is_empty();
            }
        }
        if drop_key {
            entries.remove(key);
        }
    }

    /// Returns how many listeners are currently registered for `key`.
    pub fn listener_count(&self, key: &E::Key) -> usize {
        self.entries.read().get(key).map_or(0, Vec::len)
    }
}

impl<E: Event> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
