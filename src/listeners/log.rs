//! # Simple logging listener for debugging and demos.
//!
//! [`LogWriter`] emits every event it receives at `info` level. Primarily
//! useful for development and the bundled demo programs; implement a custom
//! [`Listener`] for structured application logging.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::events::Listener;

/// Listener that logs each event via `tracing::info!`.
pub struct LogWriter;

#[async_trait]
impl<E> Listener<E> for LogWriter
where
    E: Debug + Send + Sync,
{
    async fn on_event(&self, event: &E) -> Result<(), BoxError> {
        tracing::info!(event = ?event, "event");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
