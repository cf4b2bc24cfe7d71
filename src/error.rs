//! Error types surfaced by the delivery components.
//!
//! This module defines two main error enums:
//!
//! - [`BusError`] — errors raised by [`EventBus`](crate::EventBus) and
//!   [`EventDispatcher`](crate::EventDispatcher) dispatch.
//! - [`FlowError`] — errors raised by the [`FlowChannel`](crate::FlowChannel)
//!   demand protocol.
//!
//! Both types provide an `as_label` helper returning a short stable label for
//! logs/metrics. Listener and subscriber callbacks report their own failures
//! as [`BoxError`]; the delivering component wraps them into
//! [`BusError::Delivery`] or logs them, depending on the delivery mode.

use std::any::Any;

use thiserror::Error;

/// Failure type returned by listener and subscriber callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by bus and dispatcher delivery.
///
/// A [`BusError::Delivery`] for one listener never prevents delivery to the
/// remaining listeners in the same snapshot; it is the *first* failure
/// observed, surfaced after the whole snapshot ran.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// Dispatch was attempted after the bus was shut down.
    #[error("bus is closed")]
    Closed,

    /// A listener callback returned an error or panicked.
    #[error("listener {listener} failed: {reason}")]
    Delivery {
        /// Name of the failing listener.
        listener: &'static str,
        /// The underlying failure message.
        reason: String,
    },

    /// The worker pool declined a pooled dispatch job.
    #[error("worker pool rejected work for listener {listener}")]
    Rejected {
        /// Name of the listener whose job was rejected.
        listener: &'static str,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fanout::BusError;
    ///
    /// assert_eq!(BusError::Closed.as_label(), "bus_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Closed => "bus_closed",
            BusError::Delivery { .. } => "listener_failed",
            BusError::Rejected { .. } => "submission_rejected",
        }
    }
}

/// # Errors produced by the reactive demand protocol.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FlowError {
    /// The channel or subscription is terminal (completed, failed, or cancelled).
    #[error("channel is closed")]
    Closed,

    /// `request` was called with zero credit.
    #[error("demand must be positive (got {requested})")]
    InvalidDemand {
        /// The rejected credit amount.
        requested: u64,
    },
}

impl FlowError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fanout::FlowError;
    ///
    /// let err = FlowError::InvalidDemand { requested: 0 };
    /// assert_eq!(err.as_label(), "invalid_demand");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FlowError::Closed => "channel_closed",
            FlowError::InvalidDemand { .. } => "invalid_demand",
        }
    }
}

/// Extracts a printable reason from a caught panic payload.
pub(crate) fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
