//! # Example: timeout_and_cancel
//!
//! Demonstrates per-invocation timeouts and caller-side cancellation.
//!
//! Shows how to:
//! - Configure a default timeout with [`ChannelBuilder`](channelvisor::ChannelBuilder).
//! - Override it for one subscriber with [`SubscribeFn::with_timeout`].
//! - Stop a publish early with a [`CancellationToken`].
//! - Retry failed deliveries from the report (the channel never retries by itself).
//!
//! ## Run
//! ```bash
//! cargo run --example timeout_and_cancel
//! ```

use std::sync::Arc;
use std::time::Duration;

use channelvisor::{Channel, DeliveryError, Envelope, SubscribeFn};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let channel: Channel<&'static str> = Channel::builder("jobs")
        .with_timeout(Duration::from_millis(200))
        .build()?;

    channel.subscribe_fn("fast", |env: Envelope<&'static str>| async move {
        println!("[fast] {}", env.event());
        Ok(())
    })?;
    channel.subscribe_fn("stuck", |_env: Envelope<&'static str>| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    })?;
    channel.subscribe(Arc::new(
        SubscribeFn::new("patient", |env: Envelope<&'static str>| async move {
            tokio::time::sleep(Duration::from_millis(400)).await;
            println!("[patient] {}", env.event());
            Ok::<_, DeliveryError>(())
        })
        .with_timeout(Duration::from_secs(1)),
    ))?;

    // Timeouts are recorded, dispatch continues.
    let report = channel.publish("build #1").await?;
    for d in report.failures() {
        println!(
            "failed: subscriber={} reason={} retryable={}",
            d.subscriber,
            d.error().map(|e| e.as_message()).unwrap_or_default(),
            d.error().is_some_and(|e| e.is_retryable())
        );
    }

    // Cancellation: stop after a short deadline, keep what was delivered.
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });
    let report = channel.publish_with_cancel("build #2", &token).await?;
    println!(
        "cancelled={} attempted={} (snapshot had {})",
        report.cancelled,
        report.attempted(),
        channel.len()
    );

    Ok(())
}
