use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use nem_core::{Address, Block, Hash, SignedTx, Transaction};
use nem_node::{AddPeerResponse, Node, PeerNode, StatusResponse, SyncBlocksResponse};
use serde::{Deserialize, Serialize};

use crate::error::NodeApiError;

#[derive(Serialize)]
pub struct BalancesResponse {
    block_hash: Hash,
    balances: HashMap<Address, u64>,
}

pub async fn balances_list(State(node): State<Arc<Node>>) -> Json<BalancesResponse> {
    Json(BalancesResponse {
        block_hash: node.latest_block_hash(),
        balances: node.balances(),
    })
}

pub async fn node_status(State(node): State<Arc<Node>>) -> Json<StatusResponse> {
    Json(node.status())
}

#[derive(Deserialize)]
pub struct SyncQuery {
    fromblock: Option<String>,
}

pub async fn node_sync(
    State(node): State<Arc<Node>>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<SyncBlocksResponse>, NodeApiError> {
    let from = match query.fromblock.as_deref() {
        Some(raw) if !raw.is_empty() => {
            Hash::from_hex(raw).map_err(|e| NodeApiError::BadRequest(format!("invalid fromblock hash: {e}")))?
        }
        _ => Hash::ZERO,
    };

    let blocks = node.blocks_after(from)?;
    Ok(Json(SyncBlocksResponse { blocks }))
}

#[derive(Deserialize)]
pub struct AddPeerQuery {
    ip: String,
    port: String,
    miner: String,
    version: String,
}

pub async fn node_peer(State(node): State<Arc<Node>>, Query(query): Query<AddPeerQuery>) -> Json<AddPeerResponse> {
    let port: u64 = match query.port.parse() {
        Ok(port) => port,
        Err(err) => {
            return Json(AddPeerResponse {
                success: false,
                error: err.to_string(),
            })
        }
    };

    let miner = match Address::from_hex(&query.miner) {
        Ok(miner) => miner,
        Err(err) => {
            return Json(AddPeerResponse {
                success: false,
                error: err.to_string(),
            })
        }
    };

    let peer = PeerNode::new(query.ip, port, false, miner, true, query.version);
    tracing::info!(peer = %peer.tcp_address(), "peer added into knownpeers");
    node.add_peer(peer);

    Json(AddPeerResponse {
        success: true,
        error: String::new(),
    })
}

pub async fn block_by_id(
    State(node): State<Arc<Node>>,
    Path(id): Path<String>,
) -> Result<Json<Block>, NodeApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(NodeApiError::BadRequest("height or hash param is required".into()));
    }

    let block = if let Ok(height) = id.parse::<u64>() {
        node.block_by_height(height)?
    } else {
        let hash = Hash::from_hex(id).map_err(|e| NodeApiError::BadRequest(format!("invalid block hash: {e}")))?;
        node.block_by_hash(hash)?
    };

    block
        .map(Json)
        .ok_or_else(|| NodeApiError::NotFound(format!("no block at {id}")))
}

pub async fn mempool_view(State(node): State<Arc<Node>>) -> Json<HashMap<Hash, SignedTx>> {
    Json(node.pending_txs_by_hash())
}

#[derive(Deserialize)]
pub struct TxAddRequest {
    from: String,
    from_pwd: String,
    to: String,
    #[serde(default)]
    gas: u64,
    #[serde(default)]
    gas_price: u64,
    value: u64,
    #[serde(default)]
    data: String,
}

#[derive(Serialize)]
pub struct TxAddResponse {
    success: bool,
}

pub async fn tx_add(
    State(node): State<Arc<Node>>,
    Json(req): Json<TxAddRequest>,
) -> Result<Json<TxAddResponse>, NodeApiError> {
    let from = Address::from_hex(&req.from)
        .map_err(|_| NodeApiError::BadRequest(format!("{} is an invalid 'from' sender", req.from)))?;
    if from == Address::ZERO {
        return Err(NodeApiError::BadRequest(format!("{} is an invalid 'from' sender", req.from)));
    }
    if req.from_pwd.is_empty() {
        return Err(NodeApiError::BadRequest(format!(
            "password to decrypt the {} account is required, 'from_pwd' is empty",
            req.from
        )));
    }
    let to = Address::from_hex(&req.to).map_err(|_| NodeApiError::BadRequest(format!("{} is an invalid 'to' recipient", req.to)))?;

    let nonce = node.next_account_nonce(from);
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is after the Unix epoch")
        .as_secs();
    let tx = Transaction::new(from, to, req.gas, req.gas_price, req.value, nonce, req.data, now);

    let signed = nem_keystore::sign_with_account(nem_keystore::keystore_dir_path(node.data_dir()), from, &req.from_pwd, tx)?;
    node.add_pending_tx(signed)?;

    Ok(Json(TxAddResponse { success: true }))
}
