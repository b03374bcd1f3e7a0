//! Keeps a flaky simulated link alive and shuts it down after a while.
//!
//! Run with: cargo run --example reconnect_basic -p relink --features tracing

use relink::{Connection, Reconnect, ReconnectConfig};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Refuses the first two connects, then drops every established session
/// after a short time until it is closed.
struct FlakyLink {
    connects: AtomicUsize,
    shutdown: Notify,
}

impl Connection for FlakyLink {
    type Error = io::Error;

    async fn connect(&self) -> Result<(), Self::Error> {
        // Pacing is up to the connection; the controller retries immediately.
        tokio::time::sleep(Duration::from_millis(50)).await;
        if self.connects.fetch_add(1, Ordering::SeqCst) < 2 {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "peer not ready",
            ));
        }
        Ok(())
    }

    async fn wait(&self) -> Result<(), Self::Error> {
        tokio::select! {
            _ = self.shutdown.notified() => Ok(()),
            _ = tokio::time::sleep(Duration::from_millis(200)) => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "peer reset the session",
            )),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.shutdown.notify_one();
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = ReconnectConfig::builder()
        .name("flaky-link")
        .max_connect_attempts(5)
        .max_connection_errors(10)
        .on_state_change(|state| println!("state: {}", state))
        .build();

    let link = FlakyLink {
        connects: AtomicUsize::new(0),
        shutdown: Notify::new(),
    };
    let reconnect = Arc::new(Reconnect::new(link, config));

    let runner = Arc::clone(&reconnect);
    let handle = tokio::spawn(async move { runner.start().await });

    tokio::time::sleep(Duration::from_secs(1)).await;

    println!(
        "closing after {} successful connects",
        reconnect.state().total_connects()
    );
    reconnect.close().await?;

    match handle.await? {
        Ok(()) => println!("closed cleanly"),
        Err(error) => println!("gave up: {}", error),
    }
    Ok(())
}
