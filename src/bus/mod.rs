//! Keyed delivery: registry, strategies, worker pool, and the bus façade.
//!
//! ## Contents
//! - [`ListenerRegistry`] — thread-safe key → ordered listener list mapping
//! - [`DeliveryStrategy`] — inline (caller-task) vs pooled (worker) delivery
//! - [`WorkerPool`] / [`FixedPool`] — minimal task-submission collaborator
//! - [`EventBus`] — the façade owning a registry and a strategy
//!
//! ## Architecture
//! ```text
//! dispatch(event)
//!     │
//!     ├─► registry.snapshot_for(event.key())      (copy-on-read)
//!     │
//!     ├─ Inline ──► listener₁ … listenerₙ awaited on the dispatching task
//!     │             (failures isolated, first error returned)
//!     │
//!     └─ Pooled ──► pool.submit(job₁) … pool.submit(jobₙ)
//!                   (fire-and-forget; rejections degrade one listener only)
//! ```

mod event_bus;
mod pool;
mod registry;
mod strategy;

pub use event_bus::EventBus;
pub use pool::{FixedPool, Job, PoolConfig, WorkerPool};
pub use registry::ListenerRegistry;
pub use strategy::DeliveryStrategy;
