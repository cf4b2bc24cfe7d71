//! # Append-only file journal listener.
//!
//! [`JournalWriter`] appends one `[timestamp-ms] {event:?}` line per event to
//! a file. It is an ordinary listener: attach it to a bus or dispatcher and
//! it records whatever reaches it, with no special status in the delivery
//! path. Writes are serialized through an async mutex and synced to disk per
//! event, so it suits audit trails rather than hot paths.

use std::fmt::Debug;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::BoxError;
use crate::events::Listener;

/// Listener appending events to a file, one line per event.
pub struct JournalWriter {
    file: Mutex<File>,
}

impl JournalWriter {
    /// Opens (or creates) the journal file in append mode.
    pub async fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl<E> Listener<E> for JournalWriter
where
    E: Debug + Send + Sync,
{
    async fn on_event(&self, event: &E) -> Result<(), BoxError> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let line = format!("[{ts}] {event:?}\n");

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "journal_writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Listener;

    #[tokio::test]
    async fn appends_one_line_per_event() {
        let path = std::env::temp_dir().join(format!("fanout-journal-{}", std::process::id()));
        let writer = JournalWriter::create(&path).await.unwrap();

        writer.on_event(&"first").await.unwrap();
        writer.on_event(&"second").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("first"));
        assert!(lines[1].contains("second"));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
