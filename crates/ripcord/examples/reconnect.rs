//! Reconnect loop demo
//!
//! Simulates a flaky connection: the first few attempts fail, then one
//! succeeds, stays up briefly, and drops. Run with
//! `RUST_LOG=debug cargo run --example reconnect` to watch the backoff
//! schedule in the logs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ripcord::{BackoffConfig, ReconnectSupervisor, RetryScheduler, TracingObserver};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = BackoffConfig {
        min_delay_ms: 500,
        max_delay_ms: 4_000,
        retry_exponent: 2.0,
        jitter_factor: 0.5,
    };
    let scheduler = RetryScheduler::builder()
        .with_config(config)
        .with_observer(TracingObserver::new("demo-reconnect"))
        .build()?;

    let attempts = Arc::new(AtomicU32::new(0));
    let (attempt_tx, mut attempt_rx) = tokio::sync::mpsc::unbounded_channel();

    let counter = Arc::clone(&attempts);
    let supervisor = ReconnectSupervisor::with_scheduler(
        scheduler,
        Duration::from_secs(5),
        move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = attempt_tx.send(attempt);
        },
    );

    supervisor.resume("startup");

    while let Some(attempt) = attempt_rx.recv().await {
        if attempt < 4 {
            tracing::warn!(attempt, "connection attempt failed");
            supervisor.attempt_failed();
            continue;
        }

        tracing::info!(attempt, "connected");
        supervisor.connection_established();

        // Stay up for a while, then drop without a server reset. The
        // supervisor schedules the next attempt; since the connection
        // outlived the healthy threshold, it goes out with zero delay.
        tokio::time::sleep(Duration::from_secs(6)).await;
        tracing::warn!("connection dropped");
        supervisor.connection_lost(false);

        // One demo cycle is enough; tear down.
        supervisor.interrupt("shutdown");
        break;
    }

    tracing::info!(
        total_attempts = attempts.load(Ordering::SeqCst),
        "demo finished"
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
