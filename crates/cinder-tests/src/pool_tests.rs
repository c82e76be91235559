//! Tests for the live executable view as the miner and producers share it.

use crate::generators::{origin, transfer};
use crate::harness::{wait_until, TestContext};
use cinder_miner::UNLIMITED_TRANSACTIONS;
use cinder_pool::{Finalization, RejectedExecution};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_arrival_during_build_lands_in_next_block() {
    let ctx = TestContext::new();
    ctx.vm.set_delay(Duration::from_millis(100));
    let early = transfer(0xAA, 0, 10);
    ctx.executables.submit(Arc::clone(&early)).unwrap();
    let mut blocks = ctx.miner.events().subscribe_blocks();

    let miner = Arc::clone(&ctx.miner);
    let genesis = ctx.genesis();
    let build = tokio::spawn(async move {
        miner.mine(genesis, UNLIMITED_TRANSACTIONS, false).await
    });
    // The sweep is past its seed once the engine holds the first run open
    wait_until(|| ctx.vm.executed().contains(&early.hash())).await;

    // Pricier, but it arrived after the sweep was seeded
    let late = transfer(0xBB, 0, 50);
    ctx.executables.submit(Arc::clone(&late)).unwrap();
    build.await.unwrap().unwrap();

    let first = blocks.recv().await.unwrap();
    assert_eq!(first.transactions.len(), 1);
    assert_eq!(first.transactions[0].hash(), early.hash());

    let second = blocks.recv().await.unwrap();
    assert_eq!(second.transactions.len(), 1);
    assert_eq!(second.transactions[0].hash(), late.hash());
}

#[tokio::test]
async fn test_out_of_order_submission_mines_in_nonce_order() {
    let ctx = TestContext::new();
    let third = transfer(0xAA, 2, 30);
    let first = transfer(0xAA, 0, 10);
    let second = transfer(0xAA, 1, 20);
    for tx in [&third, &first, &second] {
        ctx.executables.submit(Arc::clone(tx)).unwrap();
    }

    let accepted = ctx
        .miner
        .mine(ctx.genesis(), UNLIMITED_TRANSACTIONS, false)
        .await
        .unwrap()
        .unwrap();

    let order: Vec<_> = accepted.iter().map(|tx| tx.nonce).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert!(!ctx.executables.pending().contains_key(&origin(0xAA)));
}

#[tokio::test]
async fn test_in_progress_drains_on_either_finalization() {
    let ctx = TestContext::new();
    let confirmed = transfer(0xAA, 0, 10);
    let abandoned = transfer(0xBB, 0, 20);
    ctx.executables.submit(Arc::clone(&confirmed)).unwrap();
    ctx.executables.submit(Arc::clone(&abandoned)).unwrap();

    ctx.miner
        .mine(ctx.genesis(), UNLIMITED_TRANSACTIONS, false)
        .await
        .unwrap();
    assert_eq!(ctx.executables.in_progress_count(), 2);

    confirmed.finalize(Finalization::Confirmed);
    abandoned.finalize(Finalization::Rejected(RejectedExecution::new(
        abandoned.hash(),
        "dropped at persistence",
    )));

    wait_until(|| ctx.executables.in_progress_count() == 0).await;
    assert!(!ctx.executables.is_in_progress(confirmed.hash()));
    assert!(!ctx.executables.is_in_progress(abandoned.hash()));
}

#[tokio::test]
async fn test_stats_follow_the_build() {
    let ctx = TestContext::new();
    ctx.executables.submit(transfer(0xAA, 0, 10)).unwrap();
    ctx.executables.submit(transfer(0xAA, 1, 10)).unwrap();
    ctx.executables.submit(transfer(0xBB, 0, 20)).unwrap();

    let stats = ctx.executables.stats();
    assert_eq!(stats.origins, 2);
    assert_eq!(stats.pending_transactions, 3);
    assert_eq!(stats.in_progress, 0);

    ctx.miner
        .mine(ctx.genesis(), UNLIMITED_TRANSACTIONS, false)
        .await
        .unwrap();

    let stats = ctx.executables.stats();
    assert_eq!(stats.origins, 0);
    assert_eq!(stats.pending_transactions, 0);
    assert_eq!(stats.in_progress, 3);
}
