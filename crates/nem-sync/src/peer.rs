use nem_core::Address;
use serde::{Deserialize, Serialize};

/// The HTTPS port, forced on a peer whenever SSL is enabled — see
/// `nem-node`'s bootstrap wiring and spec.md §6 ("default HTTPS port 443
/// when SSL enabled").
pub const HTTPS_PORT: u64 = 443;

/// A node we know about: its address on the network, and what it told
/// us about itself. `connected` is process-local bookkeeping (whether
/// we've successfully registered ourselves with it) and is never sent
/// or received over the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerNode {
    pub ip: String,
    pub port: u64,
    pub is_bootstrap: bool,
    pub account: Address,
    pub node_version: String,
    #[serde(skip)]
    pub connected: bool,
}

impl PeerNode {
    pub fn new(
        ip: impl Into<String>,
        port: u64,
        is_bootstrap: bool,
        account: Address,
        connected: bool,
        node_version: impl Into<String>,
    ) -> Self {
        PeerNode {
            ip: ip.into(),
            port,
            is_bootstrap,
            account,
            node_version: node_version.into(),
            connected,
        }
    }

    pub fn tcp_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn api_protocol(&self) -> &'static str {
        if self.port == HTTPS_PORT {
            "https"
        } else {
            "http"
        }
    }

    pub fn is_same_as(&self, other: &PeerNode) -> bool {
        self.ip == other.ip && self.port == other.port
    }
}
