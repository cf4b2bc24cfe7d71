//! # Event contract: a routable value with a stable type key.
//!
//! [`Event`] is implemented by application event families. The associated
//! [`Event::Key`] is the routing identity: two events of the same logical
//! shape must always return equal keys, so a tagged enum (or a `&'static str`
//! tag per variant) is the usual implementation. Keying is explicit — the bus
//! never inspects runtime type identity.
//!
//! ## Example
//! ```rust
//! use fanout::Event;
//!
//! #[derive(Clone, Debug)]
//! enum ShopEvent {
//!     OrderPlaced { id: u32 },
//!     OrderShipped { id: u32 },
//! }
//!
//! impl Event for ShopEvent {
//!     type Key = &'static str;
//!
//!     fn key(&self) -> Self::Key {
//!         match self {
//!             ShopEvent::OrderPlaced { .. } => "order_placed",
//!             ShopEvent::OrderShipped { .. } => "order_shipped",
//!         }
//!     }
//! }
//!
//! assert_eq!(ShopEvent::OrderPlaced { id: 7 }.key(), "order_placed");
//! ```

use std::fmt::Debug;
use std::hash::Hash;

/// Contract for values routable through an [`EventBus`](crate::EventBus).
///
/// Events are treated as opaque immutable payloads: the bus clones them for
/// pooled delivery and hands out shared references for inline delivery, but
/// never inspects anything beyond [`Event::key`].
pub trait Event: Clone + Send + Sync + 'static {
    /// Routing identity distinguishing one logical event shape from another.
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Returns the routing key for this event.
    ///
    /// Must be stable: every event of the same logical shape resolves to the
    /// same key.
    fn key(&self) -> Self::Key;
}
