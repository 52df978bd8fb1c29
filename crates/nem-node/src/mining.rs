use std::sync::Arc;

use nem_miner::MinerError;
use tokio_util::sync::CancellationToken;

use crate::{Node, MINING_TICK};

/// The mining supervisor: on every tick, starts a cancellable mining
/// attempt if there are pending txs and nothing is already mining; on
/// every synced block, archives its txs and cancels any mining attempt
/// in flight. Mirrors the original node's `mine()` event loop.
pub async fn run_mining_supervisor(node: Arc<Node>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(MINING_TICK);
    let mut new_blocks_rx = node.take_synced_blocks_rx().await;
    let mut mining_cancel: Option<CancellationToken> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !node.is_mining() && !node.pending_txs().is_empty() {
                    node.set_mining(true);
                    let child_cancel = cancel.child_token();
                    mining_cancel = Some(child_cancel.clone());

                    let node_for_task = node.clone();
                    tokio::spawn(async move {
                        mine_pending_txs(node_for_task, child_cancel).await;
                    });
                }
            }
            Some(block) = new_blocks_rx.recv() => {
                if node.is_mining() {
                    tracing::info!(hash = %block.hash(), "peer mined next block faster");
                    node.archive_mined_txs(&block);
                    if let Some(c) = mining_cancel.take() {
                        c.cancel();
                    }
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("mining supervisor stopping");
                if let Some(c) = mining_cancel.take() {
                    c.cancel();
                }
                return;
            }
        }
    }
}

async fn mine_pending_txs(node: Arc<Node>, cancel: CancellationToken) {
    let pending = node.build_pending_block();
    let difficulty = node.mining_difficulty();

    match nem_miner::mine(cancel, pending, difficulty).await {
        Ok(block) => {
            node.archive_mined_txs(&block);
            match node.add_block(block) {
                Ok(hash) => tracing::info!(%hash, "mined and persisted new block"),
                Err(err) => tracing::warn!(%err, "failed to persist mined block"),
            }
        }
        Err(MinerError::Cancelled) => {
            tracing::info!("mining cancelled, a peer likely mined first");
        }
        Err(MinerError::EmptyBlock) => {
            tracing::warn!("mining supervisor started mining an empty pending block");
        }
    }

    node.set_mining(false);
}
