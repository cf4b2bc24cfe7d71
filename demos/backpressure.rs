//! # Example: backpressure
//!
//! Demonstrates reactive delivery with credit-based flow control.
//!
//! Shows how to:
//! - Implement [`FlowSubscriber`] with a one-item-at-a-time consumption rate
//!   (request 1 on subscribe, 1 more after each item).
//! - Publish faster than the subscriber consumes; items wait in the
//!   subscription buffer instead of overrunning it.
//! - Complete the channel and let the buffer drain before `on_complete`.
//!
//! ## Run
//! ```bash
//! cargo run --example backpressure
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fanout::{BoxError, FlowChannel, FlowSubscriber, Subscription};
use parking_lot::Mutex;

/// Consumes one item at a time, re-requesting after each delivery.
struct SlowConsumer {
    name: &'static str,
    subscription: Mutex<Option<Subscription<String>>>,
}

impl SlowConsumer {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            subscription: Mutex::new(None),
        })
    }
}

#[async_trait]
impl FlowSubscriber<String> for SlowConsumer {
    async fn on_subscribed(&self, subscription: Subscription<String>) {
        println!("[{}] subscribed", self.name);
        let _ = subscription.request(1);
        *self.subscription.lock() = Some(subscription);
    }

    async fn on_next(&self, item: String) -> Result<(), BoxError> {
        println!("[{}] received: {item}", self.name);
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Some(subscription) = self.subscription.lock().as_ref() {
            let _ = subscription.request(1);
        }
        Ok(())
    }

    async fn on_complete(&self) {
        println!("[{}] completed", self.name);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let channel = FlowChannel::new();
    channel.subscribe(SlowConsumer::new("consumer-a")).await;
    channel.subscribe(SlowConsumer::new("consumer-b")).await;

    // The producer is much faster than the consumers; surplus items wait in
    // each subscription's buffer until its credit catches up.
    for n in 1..=5 {
        channel.publish(format!("E{n}")).await?;
    }
    println!("[producer] published 5 items without waiting");

    channel.complete();

    // Give the consumers time to drain before the process exits.
    tokio::time::sleep(Duration::from_secs(2)).await;
    Ok(())
}
