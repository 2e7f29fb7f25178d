//! # Example: notify
//!
//! A video channel notifies its users whenever a new video is issued.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait for a custom subscriber.
//! - Attach the built-in [`LogWriter`] next to it.
//! - Read the [`PublishReport`](channelvisor::PublishReport) returned by `publish`.
//!
//! ## Run
//! Requires the `logging` feature to export [`LogWriter`].
//! ```bash
//! RUST_LOG=info cargo run --example notify --features logging
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use channelvisor::{Channel, DeliveryError, Envelope, LogWriter, Subscribe};
use tracing_subscriber::EnvFilter;

/// A user that prints every notification it receives.
struct User {
    name: String,
}

#[async_trait]
impl Subscribe<String> for User {
    async fn on_event(&self, env: &Envelope<String>) -> Result<(), DeliveryError> {
        println!(
            "User {} receives notification from {}: {}",
            self.name,
            env.channel(),
            env.event()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let channel: Channel<String> = Channel::new("KL");
    for name in ["user1", "user2", "user3"] {
        channel.subscribe(Arc::new(User { name: name.into() }))?;
    }
    channel.subscribe(Arc::new(LogWriter::named("audit")))?;

    let report = channel
        .publish("A new video has been issued.".to_string())
        .await?;

    println!(
        "seq={} delivered={} failed={}",
        report.seq,
        report.delivered(),
        report.failed()
    );
    Ok(())
}
