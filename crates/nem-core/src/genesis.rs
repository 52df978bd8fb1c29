use std::collections::HashMap;

use nem_crypto::Address;
use serde::{Deserialize, Serialize};

/// The genesis document: not itself a block (height 0 is assigned to
/// the first *mined* block), just the chain's starting conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub genesis_time: String,
    pub chain_id: String,
    pub symbol: String,
    pub balances: HashMap<Address, u64>,
}

impl Genesis {
    /// The default genesis baked into a fresh data directory, matching
    /// the original node's `genesisJson` literal: one bootstrap account
    /// holding 1,000,000 NEM.
    pub fn default_document() -> Genesis {
        let mut balances = HashMap::new();
        let bootstrap = Address::from_hex("0x09ee50f2f37fcba1845de6fe5c762e83e65e755c")
            .expect("hardcoded bootstrap address is valid");
        balances.insert(bootstrap, 1_000_000);

        Genesis {
            genesis_time: "2024-01-21T00:00:00.000000000Z".to_string(),
            chain_id: "nemos-chain".to_string(),
            symbol: "NEM".to_string(),
            balances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_round_trips() {
        let genesis = Genesis::default_document();
        let encoded = serde_json::to_vec(&genesis).unwrap();
        let decoded: Genesis = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(genesis, decoded);
        assert_eq!(genesis.symbol, "NEM");
    }
}
