//! # Example: basic_bus
//!
//! Demonstrates keyed inline dispatch with failure isolation and a journal
//! sink attached as an ordinary listener.
//!
//! Shows how to:
//! - Implement the [`Event`] trait with a `&'static str` key per variant.
//! - Register closure-backed listeners with [`ListenerFn`].
//! - Attach [`JournalWriter`] so events land in an append-only file.
//!
//! ## Run
//! ```bash
//! cargo run --example basic_bus --features logging
//! ```

use std::sync::Arc;

use fanout::{BoxError, Event, EventBus, JournalWriter, ListenerFn};

#[derive(Clone, Debug)]
enum ShopEvent {
    OrderPlaced { id: u32, user: &'static str },
    OrderShipped { id: u32 },
}

impl Event for ShopEvent {
    type Key = &'static str;

    fn key(&self) -> Self::Key {
        match self {
            ShopEvent::OrderPlaced { .. } => "order_placed",
            ShopEvent::OrderShipped { .. } => "order_shipped",
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let bus = EventBus::inline();

    bus.register(
        "order_placed",
        ListenerFn::arc("billing", |ev: ShopEvent| async move {
            if let ShopEvent::OrderPlaced { id, user } = ev {
                println!("[billing] charging {user} for order {id}");
            }
            Ok::<_, BoxError>(())
        }),
    );
    bus.register(
        "order_placed",
        ListenerFn::arc("fraud_check", |ev: ShopEvent| async move {
            if let ShopEvent::OrderPlaced { user, .. } = ev {
                if user == "mallory" {
                    return Err("suspicious account".into());
                }
            }
            Ok(())
        }),
    );
    bus.register(
        "order_shipped",
        ListenerFn::arc("notify", |ev: ShopEvent| async move {
            if let ShopEvent::OrderShipped { id } = ev {
                println!("[notify] order {id} is on its way");
            }
            Ok::<_, BoxError>(())
        }),
    );

    // The journal is just another listener, registered for both keys.
    let journal: Arc<JournalWriter> = Arc::new(JournalWriter::create("shop-events.log").await?);
    bus.register("order_placed", journal.clone());
    bus.register("order_shipped", journal);

    bus.dispatch(ShopEvent::OrderPlaced { id: 1, user: "alice" }).await?;
    bus.dispatch(ShopEvent::OrderShipped { id: 1 }).await?;

    // A failing listener does not stop the rest of the snapshot; the first
    // failure comes back to the dispatcher.
    if let Err(err) = bus
        .dispatch(ShopEvent::OrderPlaced { id: 2, user: "mallory" })
        .await
    {
        println!("[bus] dispatch reported: {err}");
    }

    bus.shutdown().await;
    Ok(())
}
