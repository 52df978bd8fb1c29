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

//! The proof-of-work search. Runs on a blocking thread (the hashing
//! loop is CPU-bound) and checks a [`CancellationToken`] before every
//! attempt so a synced block can preempt it within one hash.

use std::time::Instant;

use nem_core::{is_valid_pow, Address, Block, Hash, SignedTx};
use rand::Rng;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum MinerError {
    #[error("mining empty blocks is not allowed")]
    EmptyBlock,
    #[error("mining cancelled")]
    Cancelled,
}

/// The fixed fields of a not-yet-mined block: everything except the
/// nonce, which the search mutates each attempt. `time` is fixed at
/// construction, not re-sampled per attempt — nonce randomness alone
/// provides search diversity (see crate docs).
pub struct PendingBlock {
    pub parent: Hash,
    pub number: u64,
    pub time: u64,
    pub miner: Address,
    pub txs: Vec<SignedTx>,
}

impl PendingBlock {
    pub fn new(parent: Hash, number: u64, time: u64, miner: Address, txs: Vec<SignedTx>) -> Self {
        PendingBlock { parent, number, time, miner, txs }
    }
}

/// Runs the PoW search on a blocking thread pool thread, returning the
/// first block whose hash satisfies `difficulty`, or [`MinerError::Cancelled`]
/// if `cancel` fires first.
pub async fn mine(cancel: CancellationToken, pending: PendingBlock, difficulty: u32) -> Result<Block, MinerError> {
    if pending.txs.is_empty() {
        return Err(MinerError::EmptyBlock);
    }

    tokio::task::spawn_blocking(move || mine_blocking(cancel, pending, difficulty))
        .await
        .expect("mining task panicked")
}

fn mine_blocking(cancel: CancellationToken, pending: PendingBlock, difficulty: u32) -> Result<Block, MinerError> {
    let start = Instant::now();
    let mut attempt: u64 = 0;
    let mut rng = rand::thread_rng();

    let tx_count = pending.txs.len();
    let mut block = Block::new(pending.parent, pending.number, 0, pending.time, pending.miner, pending.txs);

    loop {
        if cancel.is_cancelled() {
            tracing::info!("mining cancelled");
            return Err(MinerError::Cancelled);
        }

        attempt += 1;
        block.header.nonce = rng.gen();

        if attempt == 1 || attempt % 1_000_000 == 0 {
            tracing::info!(attempt, pending_txs = tx_count, "mining pending txs");
        }

        let hash = block.hash();
        if is_valid_pow(&hash, difficulty) {
            tracing::info!(
                %hash,
                height = block.header.number,
                nonce = block.header.nonce,
                attempt,
                elapsed = ?start.elapsed(),
                "mined new block"
            );
            return Ok(block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nem_core::Transaction;
    use secp256k1::Secp256k1;

    fn sample_tx() -> SignedTx {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (secret, public) = secp.generate_keypair(&mut rng);
        let from = Address::from_public_key(&public);
        Transaction::base(from, Address::ZERO, 10, 1, "", 1_700_000_000)
            .sign(&secret)
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_empty_pending_block() {
        let pending = PendingBlock::new(Hash::ZERO, 0, 1_700_000_000, Address::ZERO, vec![]);
        let result = mine(CancellationToken::new(), pending, 1).await;
        assert!(matches!(result, Err(MinerError::EmptyBlock)));
    }

    #[tokio::test]
    async fn mines_a_pow_valid_block_at_low_difficulty() {
        let pending = PendingBlock::new(Hash::ZERO, 0, 1_700_000_000, Address::ZERO, vec![sample_tx()]);
        let block = mine(CancellationToken::new(), pending, 1).await.unwrap();
        assert!(is_valid_pow(&block.hash(), 1));
    }

    #[tokio::test]
    async fn cancellation_aborts_the_search() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        // difficulty 64 can never be satisfied (is_valid_pow always false there),
        // so without the cancellation check this would spin forever.
        let pending = PendingBlock::new(Hash::ZERO, 0, 1_700_000_000, Address::ZERO, vec![sample_tx()]);
        let result = mine(cancel, pending, 64).await;
        assert!(matches!(result, Err(MinerError::Cancelled)));
    }
}
