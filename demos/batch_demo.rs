//! Example demonstrating batch fan-out under a shared deadline
//!
//! Run with `RUST_LOG=deadline_batch=debug` to see per-batch events.

use deadline_batch::{work, BatchError, BatchRunner, CancellationToken};
use futures::StreamExt;
use std::error::Error;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

async fn lookup(items: Vec<u32>, token: CancellationToken, cost: Duration) -> deadline_batch::Result<Vec<String>> {
    tokio::select! {
        _ = tokio::time::sleep(cost) => Ok(items.iter().map(|n| format!("item-{n}")).collect()),
        _ = token.cancelled() => Err(BatchError::Cancelled),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deadline_batch=info")),
        )
        .init();

    println!("Deadline Batch - Fan-out Example\n");

    let runner = BatchRunner::new()
        .with_batch_size(25)
        .with_deadline(Duration::from_secs(2));

    // 1. Every batch finishes well inside the deadline
    println!("1. Forty batches of 25, 200ms each:");
    let results = runner
        .collect(
            0..1000u32,
            work::flat(|items: Vec<u32>, token: CancellationToken| {
                lookup(items, token, Duration::from_millis(200))
            }),
            &CancellationToken::new(),
        )
        .await?;
    println!("   Collected {} results, first {:?}, last {:?}\n", results.len(), results.first(), results.last());

    // 2. Work slower than the deadline
    println!("2. Batches that need 5s against a 2s deadline:");
    let err = runner
        .collect(
            0..100u32,
            work::flat(|items: Vec<u32>, token: CancellationToken| {
                lookup(items, token, Duration::from_secs(5))
            }),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    println!("   {err} (deadline exceeded: {})\n", err.is_deadline_exceeded());

    // 3. The caller gives up first
    println!("3. Caller cancels after 300ms:");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });
    let err = runner
        .run(
            0..100u32,
            |_items, token| async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => Ok(()),
                    _ = token.cancelled() => Err(BatchError::Cancelled),
                }
            },
            &cancel,
        )
        .await
        .unwrap_err();
    println!("   {err} (cancelled by caller: {})\n", err.is_cancelled());

    // 4. Results stream back in slice order as batches finish
    println!("4. Streaming results batch by batch:");
    let mut stream = runner.with_batch_size(3).run_batches(
        1..=9u32,
        work::each(|items: Vec<u32>, _token: CancellationToken| async move {
            Ok::<_, BatchError>(items.iter().sum::<u32>())
        }),
        &CancellationToken::new(),
    );
    while let Some(sum) = stream.next().await {
        println!("   batch sum: {}", sum?);
    }

    println!("\nDone.");
    Ok(())
}
