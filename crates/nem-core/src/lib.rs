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

//! The ledger's data model: transactions, blocks, genesis and the PoW
//! predicate. Everything here is pure data and pure functions — no
//! I/O, no validation against chain state (that's `nem-state`).

mod block;
mod genesis;
mod pow;
mod transaction;

pub use block::{Block, BlockHeader, BlockRecord};
pub use genesis::Genesis;
pub use nem_crypto::{Address, CryptoError, Hash, Signature};
pub use pow::is_valid_pow;
pub use transaction::{SignedTx, Transaction};

/// Reward credited to a block's miner, on top of the gas fees of its
/// included transactions. Not specified numerically upstream; fixed
/// here as documented in DESIGN.md.
pub const BLOCK_REWARD: u64 = 100;

/// The only gas amount a transaction may spend (no fee market).
pub const TX_GAS: u64 = 1;

/// The minimum accepted gas price.
pub const TX_GAS_PRICE_DEFAULT: u64 = 1;

/// `data` value that marks a coinbase-style entry.
pub const REWARD_DATA: &str = "reward";

/// Default PoW difficulty: leading hex zero nibbles required, followed
/// by a non-zero nibble.
pub const DEFAULT_MINING_DIFFICULTY: u32 = 3;
