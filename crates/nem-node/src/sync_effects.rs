use std::sync::Arc;

use nem_core::{Block, Hash, SignedTx};
use nem_sync::{PeerNode, SyncEffects};

use crate::Node;

/// Lets `nem-sync`'s loop drive this node without depending on
/// `State`/`Mempool` directly — see DESIGN.md.
#[async_trait::async_trait]
impl SyncEffects for Arc<Node> {
    fn self_info(&self) -> PeerNode {
        Node::self_info(self)
    }

    fn known_peers(&self) -> Vec<PeerNode> {
        Node::known_peers(self)
    }

    fn is_known_peer(&self, peer: &PeerNode) -> bool {
        Node::is_known_peer(self, peer)
    }

    fn add_peer(&self, peer: PeerNode) {
        Node::add_peer(self, peer)
    }

    fn remove_peer(&self, peer: &PeerNode) {
        Node::remove_peer(self, peer)
    }

    fn mark_connected(&self, peer: &PeerNode) {
        Node::mark_connected(self, peer)
    }

    fn latest_block_hash(&self) -> Hash {
        Node::latest_block_hash(self)
    }

    fn latest_block_number(&self) -> u64 {
        Node::latest_block_number(self)
    }

    async fn apply_synced_block(&self, block: Block) {
        match Node::add_block(self, block.clone()) {
            Ok(hash) => {
                tracing::info!(%hash, "applied block from sync");
                // Best-effort: notifies the mining supervisor so it can
                // abort a now-redundant search and archive the block's
                // txs out of its pending set.
                let _ = self.new_synced_blocks_tx.send(block).await;
            }
            Err(err) => {
                tracing::warn!(%err, "rejected block from sync");
            }
        }
    }

    async fn add_pending_tx(&self, tx: SignedTx, from_peer: PeerNode) {
        match Node::add_pending_tx(self, tx) {
            Ok(true) => tracing::info!(peer = %from_peer.tcp_address(), "admitted pending tx from sync"),
            Ok(false) => {}
            Err(err) => tracing::warn!(peer = %from_peer.tcp_address(), %err, "rejected pending tx from sync"),
        }
    }
}
