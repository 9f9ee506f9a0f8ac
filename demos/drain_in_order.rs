//! Serializes a burst of simulated fetches through a bounded queue.
//!
//! Run with: `cargo run --example drain_in_order`
//! Set `RUST_LOG=serialq=trace` to watch admission and drain events.

use std::time::Duration;

use serialq::TaskQueue;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("serialq=debug")),
        )
        .init();

    let queue = TaskQueue::builder()
        .capacity(4)
        .on_error(|failure| tracing::error!(%failure, "item failed"))
        .build();

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    for path in ["/a", "/b", "/c", "/d", "/e", "/f"] {
        let done = done_tx.clone();
        queue
            .submit(
                path,
                |path| async move {
                    // Stand-in for a network round trip.
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    format!("{path} -> 200 OK")
                },
                move |line| {
                    println!("{line}");
                    let _ = done.send(());
                },
            )
            .unwrap();
    }
    drop(done_tx);

    // Wait for every admitted item to finish, then show the ledger.
    while done_rx.recv().await.is_some() {}
    println!("{}", serde_json::to_string_pretty(&queue.stats()).unwrap());

    queue.dispose();
}
