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

//! The pending/archived transaction sets and the admission check that
//! feeds them. Admission validates against a caller-supplied "pending
//! state" ledger — an advisory copy that mempool inclusion mutates
//! directly, deliberately diverging from canonical state until a block
//! is mined (see `nem_state::Ledger` and spec note on pending state).

use std::collections::HashMap;

use nem_core::{Block, Hash, SignedTx};
use nem_state::{Ledger, StateError};

#[derive(Debug, Default)]
pub struct Mempool {
    pending_txs: HashMap<Hash, SignedTx>,
    archived_tx: HashMap<Hash, SignedTx>,
}

impl Mempool {
    pub fn new() -> Self {
        Mempool::default()
    }

    pub fn pending_txs(&self) -> &HashMap<Hash, SignedTx> {
        &self.pending_txs
    }

    pub fn pending_as_vec(&self) -> Vec<SignedTx> {
        self.pending_txs.values().cloned().collect()
    }

    pub fn is_pending(&self, hash: &Hash) -> bool {
        self.pending_txs.contains_key(hash)
    }

    pub fn is_archived(&self, hash: &Hash) -> bool {
        self.archived_tx.contains_key(hash)
    }

    /// Validates `tx` against `pending_ledger` (mutating it regardless
    /// of whether `tx` ends up admitted — later rejection of the block
    /// that would have included it does not roll this back), then
    /// admits it if it's neither already pending nor archived. Returns
    /// whether the tx was newly admitted, so callers know whether to
    /// publish it on a notification channel.
    pub fn add_pending_tx(&mut self, tx: SignedTx, pending_ledger: &mut Ledger) -> Result<bool, StateError> {
        pending_ledger.apply_tx(&tx)?;

        let hash = tx.hash();
        if self.is_pending(&hash) || self.is_archived(&hash) {
            return Ok(false);
        }

        tracing::info!(tx_hash = %hash, from = %tx.from, "added pending tx");
        self.pending_txs.insert(hash, tx);
        Ok(true)
    }

    /// Moves every tx in `block` that's still pending into the archive.
    /// Called both when a locally-mined block is committed and when a
    /// block arrives from sync while we were mining the same height.
    pub fn archive_mined_txs(&mut self, block: &Block) {
        for tx in block.txs() {
            let hash = tx.hash();
            if let Some(tx) = self.pending_txs.remove(&hash) {
                tracing::info!(tx_hash = %hash, "archiving mined tx");
                self.archived_tx.insert(hash, tx);
            }
        }
    }
}
