use nem_crypto::{Address, Hash};
use serde::{Deserialize, Serialize};

use crate::SignedTx;

/// The fixed, PoW-searched header fields. `nonce` is the only field a
/// miner mutates between attempts; `time` is fixed when the pending
/// block is assembled (see `nem-miner`'s design note on nonce
/// randomness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub parent: Hash,
    pub number: u64,
    pub nonce: u32,
    pub time: u64,
    pub miner: Address,
}

/// A header plus its ordered transactions. The on-disk/wire field for
/// the transaction list is `payload`, matching the persisted
/// `BlockRecord` shape in spec.md §6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub payload: Vec<SignedTx>,
}

impl Block {
    pub fn new(
        parent: Hash,
        number: u64,
        nonce: u32,
        time: u64,
        miner: Address,
        payload: Vec<SignedTx>,
    ) -> Self {
        Block {
            header: BlockHeader {
                parent,
                number,
                nonce,
                time,
                miner,
            },
            payload,
        }
    }

    pub fn txs(&self) -> &[SignedTx] {
        &self.payload
    }

    /// SHA-256 over the block's canonical encoding: the header plus its
    /// ordered transaction payload.
    pub fn hash(&self) -> Hash {
        let encoded = serde_json::to_vec(self).expect("Block encodes to JSON infallibly");
        Hash::sha256(&encoded)
    }

    /// Sum of `gas_cost()` across every included transaction, credited
    /// to the miner alongside the fixed block reward.
    pub fn gas_reward(&self) -> u64 {
        self.payload.iter().map(|tx| tx.gas_cost()).sum()
    }
}

/// The on-disk form of a persisted block: one record per line of the
/// block log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub hash: Hash,
    pub value: Block,
}

impl BlockRecord {
    pub fn new(hash: Hash, value: Block) -> Self {
        BlockRecord { hash, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_record_round_trips() {
        let block = Block::new(Hash::ZERO, 1, 42, 1_700_000_000, Address::ZERO, vec![]);
        let record = BlockRecord::new(block.hash(), block.clone());
        let encoded = serde_json::to_vec(&record).unwrap();
        let decoded: BlockRecord = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(record, decoded);
        assert_eq!(decoded.value.hash(), decoded.hash);
    }

    #[test]
    fn different_nonces_produce_different_hashes() {
        let a = Block::new(Hash::ZERO, 1, 1, 1_700_000_000, Address::ZERO, vec![]);
        let b = Block::new(Hash::ZERO, 1, 2, 1_700_000_000, Address::ZERO, vec![]);
        assert_ne!(a.hash(), b.hash());
    }
}
