//! # fanout
//!
//! **Fanout** is a lightweight in-process event delivery library for Rust.
//!
//! It provides three delivery disciplines over one listener abstraction:
//! synchronous (caller-task) dispatch, asynchronous (worker-pool) dispatch,
//! and reactive dispatch with per-subscriber flow control. The crate is
//! designed as a building block for applications that want decoupled
//! components without an external broker.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   producer   │   │   producer   │   │   producer   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus<E>  (keyed routing)                                     │
//! │  - ListenerRegistry (key → ordered listeners, snapshot-on-read)   │
//! │  - DeliveryStrategy (Inline | Pooled)                             │
//! └──────┬──────────────────────────────┬─────────────────────────────┘
//!        ▼ Inline                       ▼ Pooled
//!   listener₁ … listenerₙ          WorkerPool::submit(job) per listener
//!   (on the dispatching task)      (FixedPool: N workers, bounded queue)
//!
//! ┌───────────────────────────────┐  ┌───────────────────────────────────┐
//! │  EventDispatcher<E>           │  │  FlowChannel<E>                   │
//! │  per-owner megaphone:         │  │  backpressure-aware broadcast:    │
//! │  private listener list,       │  │  per-subscription buffer + credit,│
//! │  inline delivery only         │  │  one delivery worker per          │
//! └───────────────────────────────┘  │  subscription                     │
//!                                    └───────────────────────────────────┘
//! ```
//!
//! ## Delivery guarantees
//! - **At-least-once per registered listener**, never exactly-once.
//! - **Per-key ordering** (bus/dispatcher): one dispatch runs listeners in
//!   registration-snapshot order; nothing is guaranteed across keys.
//! - **Per-subscription ordering** (flow): items arrive in publish order and
//!   never exceed the credit the subscriber granted.
//! - **Weak consistency under races**: a listener registered while a
//!   dispatch is in flight may or may not see that dispatch's event.
//! - **Failure isolation**: a failing callback degrades only its own
//!   delivery, never the component's ability to serve others.
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                    |
//! |-------------------|----------------------------------------------------------|---------------------------------------|
//! | **Keyed routing** | Route events to listeners by stable type key.            | [`Event`], [`EventBus`], [`ListenerRegistry`] |
//! | **Strategies**    | Run listeners inline or on a worker pool.                | [`DeliveryStrategy`], [`WorkerPool`], [`FixedPool`] |
//! | **Scoped fan-out**| Private one-to-many broadcast without a shared registry. | [`EventDispatcher`]                   |
//! | **Backpressure**  | Credit-based reactive delivery.                          | [`FlowChannel`], [`FlowSubscriber`], [`Subscription`] |
//! | **Errors**        | Typed errors for dispatch and demand protocol.           | [`BusError`], [`FlowError`]           |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] and [`JournalWriter`]
//!   listeners _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use fanout::{BoxError, Event, EventBus, ListenerFn};
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
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::inline();
//!     let placed = Arc::new(AtomicUsize::new(0));
//!
//!     let counter = placed.clone();
//!     bus.register("order_placed", ListenerFn::arc("count_placed", move |_ev: ShopEvent| {
//!         let counter = counter.clone();
//!         async move {
//!             counter.fetch_add(1, Ordering::Relaxed);
//!             Ok::<_, BoxError>(())
//!         }
//!     }));
//!
//!     bus.dispatch(ShopEvent::OrderPlaced { id: 7 }).await?;
//!     bus.dispatch(ShopEvent::OrderShipped { id: 7 }).await?;
//!     assert_eq!(placed.load(Ordering::Relaxed), 1);
//!
//!     bus.shutdown().await;
//!     Ok(())
//! }
//! ```

mod bus;
mod dispatcher;
mod error;
mod events;
mod flow;

// ---- Public re-exports ----

pub use bus::{DeliveryStrategy, EventBus, FixedPool, Job, ListenerRegistry, PoolConfig, WorkerPool};
pub use dispatcher::EventDispatcher;
pub use error::{BoxError, BusError, FlowError};
pub use events::{Event, Listener, ListenerFn};
pub use flow::{FlowChannel, FlowConfig, FlowSubscriber, OverflowPolicy, Subscription};

// Optional: built-in reference listeners.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod listeners;
#[cfg(feature = "logging")]
pub use listeners::{JournalWriter, LogWriter};
