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

//! The mutable half of chain state: balances and nonces, plus
//! transaction validation/application. Deliberately separated from
//! block bookkeeping so the mempool can hold and mutate its own
//! `Ledger` copy (the "pending state") without touching the block log.

use std::collections::HashMap;

use nem_core::{Address, SignedTx, TX_GAS, TX_GAS_PRICE_DEFAULT};

use crate::StateError;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<Address, u64>,
    account_to_nonce: HashMap<Address, u64>,
}

impl Ledger {
    pub fn new(balances: HashMap<Address, u64>) -> Self {
        Ledger {
            balances,
            account_to_nonce: HashMap::new(),
        }
    }

    pub fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> &HashMap<Address, u64> {
        &self.balances
    }

    /// The nonce a transaction from `account` must carry next.
    pub fn next_account_nonce(&self, account: &Address) -> u64 {
        self.account_to_nonce.get(account).copied().unwrap_or(0) + 1
    }

    /// The last-applied nonce per account, for diagnostics (`balances
    /// list` prints these alongside balances).
    pub fn account_nonces(&self) -> &HashMap<Address, u64> {
        &self.account_to_nonce
    }

    pub fn credit(&mut self, account: Address, amount: u64) {
        *self.balances.entry(account).or_insert(0) += amount;
    }

    /// Checks authenticity, nonce order, gas terms and available
    /// balance, without mutating anything.
    pub fn validate_tx(&self, tx: &SignedTx) -> Result<(), StateError> {
        let authentic = tx
            .is_authentic()
            .map_err(|_| StateError::ForgedSender { from: tx.from })?;
        if !authentic {
            return Err(StateError::ForgedSender { from: tx.from });
        }

        let expected_nonce = self.next_account_nonce(&tx.from);
        if tx.nonce != expected_nonce {
            return Err(StateError::WrongNonce {
                from: tx.from,
                expected: expected_nonce,
                got: tx.nonce,
            });
        }

        if tx.gas != TX_GAS {
            return Err(StateError::InsufficientGas {
                required: TX_GAS,
                got: tx.gas,
            });
        }
        if tx.gas_price < TX_GAS_PRICE_DEFAULT {
            return Err(StateError::InsufficientGasPrice {
                required: TX_GAS_PRICE_DEFAULT,
                got: tx.gas_price,
            });
        }

        let cost = tx.cost();
        let balance = self.balance(&tx.from);
        if cost > balance {
            return Err(StateError::InsufficientBalance {
                from: tx.from,
                balance,
                cost,
            });
        }

        Ok(())
    }

    /// Validates, then debits the sender and credits the recipient.
    /// Callers that only want the debit/credit side effects applied to
    /// a scratch copy (the mempool's admission check) can ignore later
    /// rejection of the owning block without having committed anything
    /// elsewhere.
    pub fn apply_tx(&mut self, tx: &SignedTx) -> Result<(), StateError> {
        self.validate_tx(tx)?;

        let from_balance = self.balances.entry(tx.from).or_insert(0);
        *from_balance -= tx.cost();
        self.credit(tx.to, tx.value);
        self.account_to_nonce.insert(tx.from, tx.nonce);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nem_core::Transaction;
    use secp256k1::Secp256k1;

    fn keypair() -> (secp256k1::SecretKey, Address) {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (secret, public) = secp.generate_keypair(&mut rng);
        (secret, Address::from_public_key(&public))
    }

    #[test]
    fn apply_tx_moves_balance_and_bumps_nonce() {
        let (secret, from) = keypair();
        let to = Address::ZERO;
        let mut ledger = Ledger::new(HashMap::from([(from, 1_000)]));

        let tx = Transaction::base(from, to, 100, 1, "", 1_700_000_000)
            .sign(&secret)
            .unwrap();
        ledger.apply_tx(&tx).unwrap();

        assert_eq!(ledger.balance(&from), 1_000 - 100 - 1 - 1);
        assert_eq!(ledger.balance(&to), 100);
        assert_eq!(ledger.next_account_nonce(&from), 2);
    }

    #[test]
    fn rejects_insufficient_balance() {
        let (secret, from) = keypair();
        let to = Address::ZERO;
        let mut ledger = Ledger::new(HashMap::from([(from, 10)]));

        let tx = Transaction::base(from, to, 100, 1, "", 1_700_000_000)
            .sign(&secret)
            .unwrap();
        assert!(matches!(
            ledger.apply_tx(&tx),
            Err(StateError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn rejects_out_of_order_nonce() {
        let (secret, from) = keypair();
        let to = Address::ZERO;
        let mut ledger = Ledger::new(HashMap::from([(from, 1_000)]));

        let tx = Transaction::base(from, to, 100, 2, "", 1_700_000_000)
            .sign(&secret)
            .unwrap();
        assert!(matches!(
            ledger.apply_tx(&tx),
            Err(StateError::WrongNonce { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn rejects_forged_sender() {
        let (attacker_secret, _attacker) = keypair();
        let (_victim_secret, victim) = keypair();
        let to = Address::ZERO;
        let mut ledger = Ledger::new(HashMap::from([(victim, 1_000)]));

        let forged = Transaction::base(victim, to, 100, 1, "", 1_700_000_000)
            .sign(&attacker_secret)
            .unwrap();
        assert!(matches!(
            ledger.apply_tx(&forged),
            Err(StateError::ForgedSender { .. })
        ));
    }
}
