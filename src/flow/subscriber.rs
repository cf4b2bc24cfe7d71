//! # Subscriber contract for reactive delivery.
//!
//! `FlowSubscriber` is the extension point for consuming a
//! [`FlowChannel`](crate::FlowChannel). Each subscriber is driven by a
//! dedicated worker task; callbacks never run on the publisher's task, and a
//! slow or failing subscriber affects only its own subscription.
//!
//! ## Contract
//! - `on_subscribed` runs once, before any item can be delivered. Request
//!   initial credit here (or keep the [`Subscription`] and request later).
//! - `on_next` runs once per delivered item, in publish order, one at a time.
//! - Exactly one of `on_complete` / `on_error` ends an uncancelled
//!   subscription; a cancelled subscription receives no further callbacks.
//!
//! ## Example (skeleton)
//! ```rust
//! use async_trait::async_trait;
//! use fanout::{BoxError, FlowSubscriber, Subscription};
//!
//! struct OneAtATime;
//!
//! #[async_trait]
//! impl FlowSubscriber<String> for OneAtATime {
//!     async fn on_subscribed(&self, subscription: Subscription<String>) {
//!         let _ = subscription.request(1);
//!     }
//!
//!     async fn on_next(&self, item: String) -> Result<(), BoxError> {
//!         println!("got {item}");
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "one_at_a_time"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::BoxError;
use crate::flow::Subscription;

/// Contract for backpressure-aware event consumers.
#[async_trait]
pub trait FlowSubscriber<E>: Send + Sync {
    /// Called once when the subscription is established, before any delivery.
    ///
    /// The handle is the subscriber's only lever: request credit to receive
    /// items, or cancel to detach.
    async fn on_subscribed(&self, subscription: Subscription<E>);

    /// Handles one delivered item.
    ///
    /// Failures are logged and delivery continues; return errors do not
    /// cancel the subscription.
    async fn on_next(&self, item: E) -> Result<(), BoxError>;

    /// Called once after the channel completed and this subscription's
    /// buffer drained.
    async fn on_complete(&self) {}

    /// Called once when the channel failed; buffered items were discarded.
    async fn on_error(&self, _reason: &str) {}

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
