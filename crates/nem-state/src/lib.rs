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

//! Canonical chain state: the balances/nonces ledger, block validation
//! and application, layered on the append-only block log.

mod ledger;
mod state;

pub use ledger::Ledger;
pub use state::State;

use nem_core::{Address, Hash};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("block log error: {0}")]
    Store(#[from] nem_store::StoreError),
    #[error("next expected block number must be {expected}, not {got}")]
    WrongBlockNumber { expected: u64, got: u64 },
    #[error("next block parent hash must be {expected}, not {got}")]
    WrongParentHash { expected: Hash, got: Hash },
    #[error("invalid block hash {0}")]
    InvalidBlockHash(Hash),
    #[error("sender {from} is forged")]
    ForgedSender { from: Address },
    #[error("sender {from} next nonce must be {expected}, not {got}")]
    WrongNonce { from: Address, expected: u64, got: u64 },
    #[error("insufficient tx gas {got}, required {required}")]
    InsufficientGas { required: u64, got: u64 },
    #[error("insufficient tx gas price {got}, required at least {required}")]
    InsufficientGasPrice { required: u64, got: u64 },
    #[error("sender {from} balance is {balance} NEM, tx cost is {cost} NEM")]
    InsufficientBalance { from: Address, balance: u64, cost: u64 },
}
