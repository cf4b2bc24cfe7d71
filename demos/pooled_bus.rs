//! # Example: pooled_bus
//!
//! Demonstrates fire-and-forget dispatch over a fixed worker pool.
//!
//! Shows how to:
//! - Build a [`FixedPool`] and hand it to [`EventBus::pooled`].
//! - Dispatch without blocking the producer while slow listeners run in
//!   parallel on the pool.
//! - Drain the pool through [`EventBus::shutdown`].
//!
//! ## Run
//! ```bash
//! cargo run --example pooled_bus
//! ```

use std::time::{Duration, Instant};

use fanout::{BoxError, Event, EventBus, FixedPool, ListenerFn, PoolConfig};

#[derive(Clone, Debug)]
struct ImageUploaded {
    id: u32,
}

impl Event for ImageUploaded {
    type Key = &'static str;

    fn key(&self) -> Self::Key {
        "image_uploaded"
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let pool = FixedPool::arc(PoolConfig {
        workers: 2,
        queue_capacity: 64,
        grace: Duration::from_secs(5),
    });
    let bus = EventBus::pooled(pool);

    bus.register(
        "image_uploaded",
        ListenerFn::arc("thumbnailer", |ev: ImageUploaded| async move {
            // Simulate slow work.
            tokio::time::sleep(Duration::from_millis(50)).await;
            println!("[thumbnailer] image {} resized", ev.id);
            Ok::<_, BoxError>(())
        }),
    );

    let started = Instant::now();
    for id in 0..5 {
        bus.dispatch(ImageUploaded { id }).await?;
    }
    println!(
        "dispatched 5 events in {:?} (listeners still running)",
        started.elapsed()
    );

    // Shutdown closes the bus and waits for the pool to drain.
    bus.shutdown().await;
    println!("all listener invocations finished in {:?}", started.elapsed());
    Ok(())
}
