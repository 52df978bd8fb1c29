// Copyright 2024 Nemos Contributors.
// This file is part of nemos.

// nemos is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// nemos is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with nemos.  If not, see <http://www.gnu.org/licenses/>.

//! The pull-based peer reconciliation loop: every tick, ask each known
//! peer for its status, register with it, pull any blocks we're missing,
//! merge its known-peers set into ours, and admit its pending txs.
//!
//! This crate knows nothing about `State`/`Mempool` directly — it talks
//! to its host through [`SyncEffects`], so `nem-node` can own locking and
//! actual application while this crate owns only the wire protocol and
//! the tick/peer-iteration shape.

mod client;
mod peer;
mod wire;

pub use client::{fetch_blocks_from_peer, join_known_peers, query_peer_status};
pub use peer::{PeerNode, HTTPS_PORT};
pub use wire::{AddPeerResponse, StatusResponse, SyncBlocksResponse};

use std::time::Duration;

use nem_core::{Block, Hash, SignedTx};
use tokio_util::sync::CancellationToken;

/// Recurring sync tick, per spec.md §5.
pub const SYNC_TICK: Duration = Duration::from_secs(45);

/// Default timeout for outbound peer HTTP calls. Not specified upstream;
/// spec.md §5 suggests 10s as a reasonable default.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("peer request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),
}

/// The effects this crate needs from its host (`nem-node`), kept small
/// and read/write-shaped rather than exposing `State`/`Mempool` types
/// directly — see DESIGN.md on the Node ↔ State ↔ sync ownership split.
#[async_trait::async_trait]
pub trait SyncEffects: Send + Sync {
    fn self_info(&self) -> PeerNode;
    fn known_peers(&self) -> Vec<PeerNode>;
    fn is_known_peer(&self, peer: &PeerNode) -> bool;
    fn add_peer(&self, peer: PeerNode);
    fn remove_peer(&self, peer: &PeerNode);
    fn mark_connected(&self, peer: &PeerNode);
    fn latest_block_hash(&self) -> Hash;
    fn latest_block_number(&self) -> u64;
    async fn apply_synced_block(&self, block: Block);
    async fn add_pending_tx(&self, tx: SignedTx, from_peer: PeerNode);
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .expect("reqwest client builds with a fixed, valid timeout")
}

/// Runs the sync loop until `cancel` fires: once immediately, then every
/// [`SYNC_TICK`].
pub async fn run(effects: impl SyncEffects, cancel: CancellationToken) {
    let client = http_client();

    do_sync(&effects, &client).await;

    let mut ticker = tokio::time::interval(SYNC_TICK);
    ticker.tick().await; // consume the immediate first tick, already ran above

    loop {
        tokio::select! {
            _ = ticker.tick() => do_sync(&effects, &client).await,
            _ = cancel.cancelled() => {
                tracing::info!("sync loop stopping");
                return;
            }
        }
    }
}

async fn do_sync(effects: &impl SyncEffects, client: &reqwest::Client) {
    let self_info = effects.self_info();

    for peer in effects.known_peers() {
        if peer.is_same_as(&self_info) {
            continue;
        }
        if peer.ip.is_empty() {
            continue;
        }

        tracing::info!(peer = %peer.tcp_address(), "searching for new peers and their blocks and peers");

        let status = match query_peer_status(client, &peer).await {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(peer = %peer.tcp_address(), %err, "peer unreachable, removing from known peers");
                effects.remove_peer(&peer);
                continue;
            }
        };

        if !peer.connected {
            match join_known_peers(client, &peer, &self_info).await {
                Ok(res) if res.success => effects.mark_connected(&peer),
                Ok(res) => {
                    tracing::warn!(peer = %peer.tcp_address(), error = %res.error, "peer declined join");
                    continue;
                }
                Err(err) => {
                    tracing::warn!(peer = %peer.tcp_address(), %err, "join request failed");
                    continue;
                }
            }
        }

        if let Err(err) = sync_blocks(effects, client, &peer, &status).await {
            tracing::warn!(peer = %peer.tcp_address(), %err, "block sync failed");
            continue;
        }

        sync_known_peers(effects, &status);
        sync_pending_txs(effects, &peer, status.pending_txs).await;
    }
}

/// Pulls and applies any blocks the peer has that we don't, per spec.md
/// §4.5 step 3. Fork choice is implicit: blocks whose parent doesn't
/// match our tip simply fail `apply_synced_block` and sync moves on to
/// the next peer.
async fn sync_blocks(
    effects: &impl SyncEffects,
    client: &reqwest::Client,
    peer: &PeerNode,
    status: &StatusResponse,
) -> Result<(), SyncError> {
    let local_number = effects.latest_block_number();

    if status.block_hash.is_empty() {
        return Ok(());
    }
    if status.block_number < local_number {
        return Ok(());
    }
    if status.block_number == 0 && !effects.latest_block_hash().is_empty() {
        return Ok(());
    }

    let blocks = fetch_blocks_from_peer(client, peer, effects.latest_block_hash()).await?;
    tracing::info!(peer = %peer.tcp_address(), count = blocks.len(), "importing blocks from peer");

    for block in blocks {
        effects.apply_synced_block(block).await;
    }

    Ok(())
}

fn sync_known_peers(effects: &impl SyncEffects, status: &StatusResponse) {
    for candidate in status.peers_known.values() {
        if !effects.is_known_peer(candidate) {
            tracing::info!(peer = %candidate.tcp_address(), "found new peer");
            effects.add_peer(candidate.clone());
        }
    }
}

async fn sync_pending_txs(effects: &impl SyncEffects, peer: &PeerNode, txs: Vec<SignedTx>) {
    for tx in txs {
        effects.add_pending_tx(tx, peer.clone()).await;
    }
}
