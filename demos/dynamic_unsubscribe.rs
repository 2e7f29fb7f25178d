//! # Example: dynamic_unsubscribe
//!
//! Subscribers join and leave a channel while it is publishing.
//!
//! Shows how to:
//! - Let a subscriber remove itself from inside its own callback.
//! - Observe that the in-flight pass keeps its snapshot.
//! - Use a [`WeakChannel`](channelvisor::WeakChannel) so subscribers do not keep the channel alive.
//!
//! ## Flow
//! ```text
//! publish(1) ─► [one-shot, steady]  one-shot unsubscribes itself, still counted in pass 1
//! publish(2) ─► [steady]
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example dynamic_unsubscribe
//! ```

use std::sync::{Arc, OnceLock};

use channelvisor::{Channel, DeliveryError, Envelope, SubscriberHandle};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let channel: Channel<u64> = Channel::new("ticks");

    let me: Arc<OnceLock<SubscriberHandle>> = Arc::new(OnceLock::new());
    let weak = channel.downgrade();
    let me_cb = Arc::clone(&me);
    let one_shot = channel.subscribe_fn("one-shot", move |env: Envelope<u64>| {
        let weak = weak.clone();
        let me = Arc::clone(&me_cb);
        async move {
            println!("[one-shot] tick {} - leaving", env.event());
            if let (Some(ch), Some(h)) = (weak.upgrade(), me.get()) {
                ch.unsubscribe(*h)
                    .map_err(|e| DeliveryError::fail(e.to_string()))?;
            }
            Ok::<(), DeliveryError>(())
        }
    })?;
    let _ = me.set(one_shot);

    channel.subscribe_fn("steady", |env: Envelope<u64>| async move {
        println!("[steady] tick {}", env.event());
        Ok(())
    })?;

    for tick in 1..=2 {
        let report = channel.publish(tick).await?;
        let names: Vec<&str> = report.deliveries.iter().map(|d| &*d.subscriber).collect();
        println!("pass {} reached {:?}", report.seq, names);
    }

    Ok(())
}
