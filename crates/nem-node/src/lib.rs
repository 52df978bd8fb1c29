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

//! The single-owner coordinator: canonical `State`, the `Mempool` and
//! its advisory pending `Ledger`, the known-peers set, and the mining
//! supervisor. Everything that mutates node-local state goes through
//! `&Node` methods taking a `parking_lot::RwLock` write guard, so the
//! HTTP server, sync loop and mining supervisor can all hold an
//! `Arc<Node>` without a central event-loop actor.

mod mining;
mod sync_effects;

pub use mining::run_mining_supervisor;
pub use nem_sync::{AddPeerResponse, PeerNode, StatusResponse, SyncBlocksResponse, HTTPS_PORT};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nem_core::{Address, Block, Hash, SignedTx};
use nem_mempool::Mempool;
use nem_state::{Ledger, State, StateError};
use parking_lot::RwLock;
use tokio::sync::mpsc;

/// The network-visible placeholder bootstrap peer identity, ported
/// verbatim from the original node's `node.go` constants.
pub const DEFAULT_BOOTSTRAP_IP: &str = "node.nemos.chain.root";
pub const DEFAULT_BOOTSTRAP_ACCOUNT_HEX: &str = "0x09ee50f2f37fcba1845de6fe5c762e83e65e755c";
pub const DEFAULT_MINER_HEX: &str = "0x0000000000000000000000000000000000000000";
pub const DEFAULT_MINING_DIFFICULTY: u32 = nem_core::DEFAULT_MINING_DIFFICULTY;

/// Buffered capacity of the pending-tx notification channel, per
/// spec.md §4.4.
const NEW_PENDING_TXS_CAPACITY: usize = 10_000;
/// Mining supervisor tick, per spec.md §4.4.
pub const MINING_TICK: std::time::Duration = std::time::Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Store(#[from] nem_store::StoreError),
}

struct NodeInner {
    state: State,
    pending_ledger: Ledger,
    mempool: Mempool,
    known_peers: HashMap<String, PeerNode>,
}

pub struct Node {
    data_dir: PathBuf,
    info: PeerNode,
    node_version: String,
    inner: RwLock<NodeInner>,
    is_mining: AtomicBool,
    new_synced_blocks_tx: mpsc::Sender<Block>,
    new_synced_blocks_rx: tokio::sync::Mutex<Option<mpsc::Receiver<Block>>>,
    new_pending_txs_tx: mpsc::Sender<SignedTx>,
}

impl Node {
    /// Loads (or bootstraps) state from `data_dir`, registers `bootstrap`
    /// as a known peer, and returns a ready-to-run, shareable handle.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        ip: impl Into<String>,
        port: u64,
        account: Address,
        bootstrap: PeerNode,
        node_version: impl Into<String>,
        mining_difficulty: u32,
    ) -> Result<Arc<Node>, NodeError> {
        let data_dir = data_dir.into();
        let state = State::new_from_disk(&data_dir, mining_difficulty)?;
        let pending_ledger = state.copy_ledger();

        let node_version = node_version.into();
        let info = PeerNode::new(ip, port, true, account, true, node_version.clone());

        let (new_synced_blocks_tx, new_synced_blocks_rx) = mpsc::channel(1);
        let (new_pending_txs_tx, _new_pending_txs_rx) = mpsc::channel(NEW_PENDING_TXS_CAPACITY);

        let mut known_peers = HashMap::new();
        known_peers.insert(bootstrap.tcp_address(), bootstrap);

        let node = Node {
            data_dir,
            info,
            node_version,
            inner: RwLock::new(NodeInner {
                state,
                pending_ledger,
                mempool: Mempool::new(),
                known_peers,
            }),
            is_mining: AtomicBool::new(false),
            new_synced_blocks_tx,
            new_synced_blocks_rx: tokio::sync::Mutex::new(Some(new_synced_blocks_rx)),
            new_pending_txs_tx,
        };

        Ok(Arc::new(node))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn self_info(&self) -> PeerNode {
        self.info.clone()
    }

    pub fn node_version(&self) -> &str {
        &self.node_version
    }

    pub fn latest_block_hash(&self) -> Hash {
        self.inner.read().state.latest_block_hash()
    }

    pub fn latest_block_number(&self) -> u64 {
        self.inner.read().state.latest_block().map(|b| b.header.number).unwrap_or(0)
    }

    pub fn next_block_number(&self) -> u64 {
        self.inner.read().state.next_block_number()
    }

    pub fn mining_difficulty(&self) -> u32 {
        self.inner.read().state.mining_difficulty()
    }

    pub fn change_mining_difficulty(&self, new_difficulty: u32) {
        self.inner.write().state.change_mining_difficulty(new_difficulty);
    }

    pub fn balances(&self) -> HashMap<Address, u64> {
        self.inner.read().state.ledger().balances().clone()
    }

    pub fn next_account_nonce(&self, account: Address) -> u64 {
        self.inner.read().state.ledger().next_account_nonce(&account)
    }

    pub fn block_by_height(&self, height: u64) -> Result<Option<Block>, NodeError> {
        let inner = self.inner.read();
        let blocks = inner.state.block_log().read_after(Hash::ZERO)?;
        Ok(blocks.into_iter().find(|b| b.header.number == height))
    }

    pub fn block_by_hash(&self, hash: Hash) -> Result<Option<Block>, NodeError> {
        let inner = self.inner.read();
        let blocks = inner.state.block_log().read_after(Hash::ZERO)?;
        Ok(blocks.into_iter().find(|b| b.hash() == hash))
    }

    /// Every block strictly after `from` — `Hash::ZERO` returns the
    /// whole log, matching `BlockLog::read_after`'s empty-sentinel rule.
    pub fn blocks_after(&self, from: Hash) -> Result<Vec<Block>, NodeError> {
        let inner = self.inner.read();
        Ok(inner.state.block_log().read_after(from)?)
    }

    pub fn known_peers(&self) -> Vec<PeerNode> {
        self.inner.read().known_peers.values().cloned().collect()
    }

    pub fn known_peers_map(&self) -> HashMap<String, PeerNode> {
        self.inner.read().known_peers.clone()
    }

    pub fn is_known_peer(&self, peer: &PeerNode) -> bool {
        if peer.is_same_as(&self.info) {
            return true;
        }
        self.inner.read().known_peers.contains_key(&peer.tcp_address())
    }

    pub fn add_peer(&self, peer: PeerNode) {
        self.inner.write().known_peers.insert(peer.tcp_address(), peer);
    }

    pub fn remove_peer(&self, peer: &PeerNode) {
        self.inner.write().known_peers.remove(&peer.tcp_address());
    }

    pub fn mark_connected(&self, peer: &PeerNode) {
        let mut inner = self.inner.write();
        if let Some(known) = inner.known_peers.get_mut(&peer.tcp_address()) {
            known.connected = true;
        }
    }

    pub fn is_mining(&self) -> bool {
        self.is_mining.load(Ordering::SeqCst)
    }

    fn set_mining(&self, value: bool) {
        self.is_mining.store(value, Ordering::SeqCst);
    }

    pub fn pending_txs(&self) -> Vec<SignedTx> {
        self.inner.read().mempool.pending_as_vec()
    }

    pub fn pending_txs_by_hash(&self) -> HashMap<Hash, SignedTx> {
        self.inner.read().mempool.pending_txs().clone()
    }

    /// Validates `tx` against the pending ledger and, if newly admitted,
    /// publishes it on the pending-tx notification channel.
    pub fn add_pending_tx(&self, tx: SignedTx) -> Result<bool, NodeError> {
        let mut inner = self.inner.write();
        let NodeInner { mempool, pending_ledger, .. } = &mut *inner;
        let admitted = mempool.add_pending_tx(tx.clone(), pending_ledger)?;
        drop(inner);

        if admitted {
            let _ = self.new_pending_txs_tx.try_send(tx);
        }
        Ok(admitted)
    }

    /// Validates and persists `block` against canonical state, then
    /// refreshes the pending ledger from the new canonical balances.
    /// Does NOT archive mempool entries — callers that mined or synced
    /// the block decide when archiving happens (see spec.md §4.4).
    pub fn add_block(&self, block: Block) -> Result<Hash, NodeError> {
        let mut inner = self.inner.write();
        let hash = inner.state.add_block(block)?;
        inner.pending_ledger = inner.state.copy_ledger();
        Ok(hash)
    }

    pub fn archive_mined_txs(&self, block: &Block) {
        self.inner.write().mempool.archive_mined_txs(block);
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            block_hash: self.latest_block_hash(),
            block_number: self.latest_block_number(),
            peers_known: self.known_peers_map(),
            pending_txs: self.pending_txs(),
            node_version: self.node_version.clone(),
            account: self.info.account,
        }
    }

    fn build_pending_block(&self) -> nem_miner::PendingBlock {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock is after the Unix epoch")
            .as_secs();
        nem_miner::PendingBlock::new(
            self.latest_block_hash(),
            self.next_block_number(),
            now,
            self.info.account,
            self.pending_txs(),
        )
    }

    async fn take_synced_blocks_rx(&self) -> mpsc::Receiver<Block> {
        self.new_synced_blocks_rx
            .lock()
            .await
            .take()
            .expect("mining supervisor takes the synced-blocks receiver exactly once")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nem_core::Transaction;
    use secp256k1::Secp256k1;
    use tokio_util::sync::CancellationToken;

    /// Writes a genesis funding `account` so tests can sign real
    /// transactions, rather than relying on the baked-in bootstrap
    /// account (whose private key nobody has).
    fn bootstrap_node(account: Address, balance: u64) -> (Arc<Node>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("database")).unwrap();
        let genesis = serde_json::json!({
            "genesis_time": "2024-01-21T00:00:00.000000000Z",
            "chain_id": "nemos-chain",
            "symbol": "NEM",
            "balances": { account.to_hex(): balance },
        });
        std::fs::write(dir.path().join("database").join("genesis.json"), genesis.to_string()).unwrap();

        let bootstrap_peer = PeerNode::new(DEFAULT_BOOTSTRAP_IP, HTTPS_PORT, true, Address::ZERO, false, "v0");
        let node = Node::new(dir.path(), "127.0.0.1", 8080, Address::ZERO, bootstrap_peer, "v0", 0).unwrap();
        (node, dir)
    }

    fn keypair() -> (secp256k1::SecretKey, Address) {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (secret, public) = secp.generate_keypair(&mut rng);
        (secret, Address::from_public_key(&public))
    }

    #[test]
    fn new_registers_bootstrap_peer_and_loads_genesis() {
        let (secret, from) = keypair();
        let _ = secret;
        let (node, _dir) = bootstrap_node(from, 1_000);

        assert_eq!(node.balances().get(&from).copied(), Some(1_000));
        assert_eq!(node.latest_block_number(), 0);
        assert_eq!(node.known_peers().len(), 1);
        assert!(node.known_peers()[0].ip == DEFAULT_BOOTSTRAP_IP);
    }

    #[test]
    fn add_pending_tx_is_idempotent_for_the_same_tx() {
        let (secret, from) = keypair();
        let (node, _dir) = bootstrap_node(from, 1_000);

        let tx = Transaction::base(from, Address::ZERO, 100, 1, "", 1_700_000_000)
            .sign(&secret)
            .unwrap();

        assert!(node.add_pending_tx(tx.clone()).unwrap());
        assert!(!node.add_pending_tx(tx).unwrap());
        assert_eq!(node.pending_txs().len(), 1);
    }

    #[tokio::test]
    async fn mining_a_pending_tx_credits_miner_and_archives_tx() {
        let (secret, from) = keypair();
        let (node, _dir) = bootstrap_node(from, 1_000);

        let tx = Transaction::base(from, Address::ZERO, 100, 1, "", 1_700_000_000)
            .sign(&secret)
            .unwrap();
        node.add_pending_tx(tx.clone()).unwrap();

        let pending = node.build_pending_block();
        let mined = nem_miner::mine(CancellationToken::new(), pending, 0).await.unwrap();

        node.archive_mined_txs(&mined);
        let hash = node.add_block(mined).unwrap();

        assert_eq!(node.latest_block_hash(), hash);
        assert_eq!(node.balances().get(&Address::ZERO).copied().unwrap_or(0), 100 + 100 + 2);
        assert!(node.pending_txs().is_empty());
    }

    #[test]
    fn block_lookup_by_height_and_hash_after_add_block() {
        let (secret, from) = keypair();
        let (node, _dir) = bootstrap_node(from, 1_000);
        let _ = secret;

        let block = Block::new(Hash::ZERO, 0, 0, 1_700_000_000, Address::ZERO, vec![]);
        let hash = node.add_block(block).unwrap();

        assert_eq!(node.block_by_hash(hash).unwrap().map(|b| b.header.number), Some(0));
        assert_eq!(node.block_by_height(0).unwrap().map(|b| b.hash()), Some(hash));
    }
}
