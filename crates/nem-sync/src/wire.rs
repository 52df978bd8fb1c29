use std::collections::HashMap;

use nem_core::{Address, Block, Hash, SignedTx};
use serde::{Deserialize, Serialize};

use crate::peer::PeerNode;

pub const ENDPOINT_STATUS: &str = "/node/status";
pub const ENDPOINT_SYNC: &str = "/node/sync";
pub const ENDPOINT_ADD_PEER: &str = "/node/peer";

/// Mirrors `StatusRes` from the original node's `/node/status` handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub block_hash: Hash,
    pub block_number: u64,
    pub peers_known: HashMap<String, PeerNode>,
    pub pending_txs: Vec<SignedTx>,
    pub node_version: String,
    pub account: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncBlocksResponse {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddPeerResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
}
