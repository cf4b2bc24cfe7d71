//! # Built-in listeners (feature `logging`).
//!
//! Reference listeners for demos and simple setups. Both treat the event as
//! an opaque `Debug` payload and plug into any bus or dispatcher like any
//! user-supplied listener — they have no special status.
//!
//! - [`LogWriter`] — emits each event through `tracing`.
//! - [`JournalWriter`] — appends each event to a file.

mod journal;
mod log;

pub use journal::JournalWriter;
pub use log::LogWriter;
