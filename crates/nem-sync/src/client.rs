use nem_core::{Block, Hash};

use crate::peer::PeerNode;
use crate::wire::{AddPeerResponse, StatusResponse, SyncBlocksResponse, ENDPOINT_ADD_PEER, ENDPOINT_STATUS, ENDPOINT_SYNC};
use crate::SyncError;

/// GETs `peer`'s `/node/status`.
pub async fn query_peer_status(client: &reqwest::Client, peer: &PeerNode) -> Result<StatusResponse, SyncError> {
    let url = format!("{}://{}{}", peer.api_protocol(), peer.tcp_address(), ENDPOINT_STATUS);
    let res = client.get(url).send().await?.error_for_status()?;
    Ok(res.json().await?)
}

/// Registers `self_info` with `peer` via `/node/peer`.
pub async fn join_known_peers(
    client: &reqwest::Client,
    peer: &PeerNode,
    self_info: &PeerNode,
) -> Result<AddPeerResponse, SyncError> {
    let url = format!("{}://{}{}", peer.api_protocol(), peer.tcp_address(), ENDPOINT_ADD_PEER);
    let res = client
        .get(url)
        .query(&[
            ("ip", self_info.ip.clone()),
            ("port", self_info.port.to_string()),
            ("miner", self_info.account.to_hex()),
            ("version", self_info.node_version.clone()),
        ])
        .send()
        .await?
        .error_for_status()?;
    Ok(res.json().await?)
}

/// Fetches every block strictly after `from_block` from `peer`.
pub async fn fetch_blocks_from_peer(
    client: &reqwest::Client,
    peer: &PeerNode,
    from_block: Hash,
) -> Result<Vec<Block>, SyncError> {
    let url = format!("{}://{}{}", peer.api_protocol(), peer.tcp_address(), ENDPOINT_SYNC);
    let res = client
        .get(url)
        .query(&[("fromblock", from_block.to_hex())])
        .send()
        .await?
        .error_for_status()?;
    let body: SyncBlocksResponse = res.json().await?;
    Ok(body.blocks)
}
