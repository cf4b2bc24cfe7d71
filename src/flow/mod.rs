//! Reactive delivery with credit-based backpressure.
//!
//! ## Contents
//! - [`FlowChannel`] — backpressure-aware broadcaster
//! - [`FlowSubscriber`] — subscriber callback contract
//! - [`Subscription`] — per-subscriber demand handle (`request` / `cancel`)
//! - [`FlowConfig`], [`OverflowPolicy`] — per-subscription buffer policy
//!
//! ## The demand protocol
//! A subscriber starts with zero credit; nothing is delivered until it calls
//! [`Subscription::request`]. Each delivered item consumes one credit, in
//! publish order. A producer outpacing a subscriber fills that subscriber's
//! buffer only — other subscriptions and the publisher (unless a bounded
//! buffer says otherwise) are unaffected.

mod channel;
mod config;
mod subscriber;
mod subscription;

pub use channel::FlowChannel;
pub use config::{FlowConfig, OverflowPolicy};
pub use subscriber::FlowSubscriber;
pub use subscription::Subscription;

pub(crate) use subscription::{Phase, SubShared};
