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

use std::path::{Path, PathBuf};

use nem_core::{is_valid_pow, Block, BlockRecord, Genesis, Hash, BLOCK_REWARD};
use nem_store::BlockLog;

use crate::{Ledger, StateError};

fn genesis_path(data_dir: &Path) -> PathBuf {
    data_dir.join("database").join("genesis.json")
}

fn block_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("database").join("block.db")
}

/// Transactions apply in submission order, not payload order: a miner
/// may append them in any order, but replay must be deterministic
/// across nodes regardless of how the block was assembled.
fn ordered_by_time(txs: &[nem_core::SignedTx]) -> Vec<&nem_core::SignedTx> {
    let mut ordered: Vec<&nem_core::SignedTx> = txs.iter().collect();
    ordered.sort_by_key(|tx| tx.time);
    ordered
}

/// Canonical chain state: the account ledger plus everything needed to
/// validate and append new blocks. Owns the block log — the sole
/// writer for its data directory.
pub struct State {
    ledger: Ledger,
    log: BlockLog,
    latest_block: Option<Block>,
    latest_block_hash: Hash,
    mining_difficulty: u32,
}

impl State {
    /// Loads (creating if absent) the genesis document and block log
    /// under `data_dir`, then replays every persisted block to rebuild
    /// the ledger.
    pub fn new_from_disk(data_dir: impl AsRef<Path>, mining_difficulty: u32) -> Result<Self, StateError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir.join("database"))?;

        let genesis_file = genesis_path(data_dir);
        if !genesis_file.exists() {
            let default_doc = Genesis::default_document();
            std::fs::write(&genesis_file, serde_json::to_vec_pretty(&default_doc)?)?;
        }
        let genesis: Genesis = serde_json::from_slice(&std::fs::read(&genesis_file)?)?;

        let mut log = BlockLog::open(block_db_path(data_dir))?;
        let records = log.replay()?;

        let mut state = State {
            ledger: Ledger::new(genesis.balances),
            log,
            latest_block: None,
            latest_block_hash: Hash::ZERO,
            mining_difficulty,
        };

        for record in records {
            state.apply_block_checked(&record.value)?;
            state.latest_block = Some(record.value);
            state.latest_block_hash = record.hash;
        }

        Ok(state)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// A detached copy of the ledger, suitable for the mempool's
    /// advisory "pending state" or for speculatively validating a
    /// not-yet-persisted block.
    pub fn copy_ledger(&self) -> Ledger {
        self.ledger.clone()
    }

    pub fn has_genesis_block(&self) -> bool {
        self.latest_block.is_some()
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.latest_block.as_ref()
    }

    pub fn latest_block_hash(&self) -> Hash {
        self.latest_block_hash
    }

    pub fn next_block_number(&self) -> u64 {
        match &self.latest_block {
            Some(b) => b.header.number + 1,
            None => 0,
        }
    }

    pub fn mining_difficulty(&self) -> u32 {
        self.mining_difficulty
    }

    pub fn change_mining_difficulty(&mut self, new_difficulty: u32) {
        self.mining_difficulty = new_difficulty;
    }

    pub fn block_log(&self) -> &BlockLog {
        &self.log
    }

    /// Validates `block` against a scratch copy of the ledger, and only
    /// on success persists it to the block log and commits the scratch
    /// ledger as the new canonical one.
    pub fn add_block(&mut self, block: Block) -> Result<Hash, StateError> {
        let mut pending = self.ledger.clone();
        self.apply_block_to(&mut pending, &block)?;

        let hash = block.hash();
        let record = BlockRecord::new(hash, block.clone());
        self.log.append(&record)?;

        self.ledger = pending;
        self.latest_block = Some(block);
        self.latest_block_hash = hash;
        Ok(hash)
    }

    /// Applies `block` directly to `self.ledger` after validation. Used
    /// only during replay, where the block is already trusted to be on
    /// disk in order; callers building new blocks should go through
    /// [`State::add_block`], which validates against a detached copy
    /// first.
    fn apply_block_checked(&mut self, block: &Block) -> Result<(), StateError> {
        let mut ledger = std::mem::take(&mut self.ledger);
        let result = self.apply_block_to(&mut ledger, block);
        self.ledger = ledger;
        result
    }

    fn apply_block_to(&self, ledger: &mut Ledger, block: &Block) -> Result<(), StateError> {
        let next_expected = self.next_block_number();
        if self.has_genesis_block() && block.header.number != next_expected {
            return Err(StateError::WrongBlockNumber {
                expected: next_expected,
                got: block.header.number,
            });
        }

        if self.has_genesis_block()
            && self.latest_block.as_ref().unwrap().header.number > 0
            && block.header.parent != self.latest_block_hash
        {
            return Err(StateError::WrongParentHash {
                expected: self.latest_block_hash,
                got: block.header.parent,
            });
        }

        let hash = block.hash();
        if !is_valid_pow(&hash, self.mining_difficulty) {
            return Err(StateError::InvalidBlockHash(hash));
        }

        for tx in ordered_by_time(block.txs()) {
            ledger.apply_tx(tx)?;
        }

        ledger.credit(block.header.miner, BLOCK_REWARD);
        ledger.credit(block.header.miner, block.gas_reward());

        Ok(())
    }
}
