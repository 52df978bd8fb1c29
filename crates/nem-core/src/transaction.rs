use nem_crypto::{recover_address, sign as crypto_sign, Address, CryptoError, Hash, Signature};
use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};

use crate::{REWARD_DATA, TX_GAS, TX_GAS_PRICE_DEFAULT};

/// An unsigned value transfer. `gas == 0` marks a transaction persisted
/// under the legacy (pre-gas-market) encoding, a backward-compatibility
/// path that must be preserved bit-for-bit for older blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    pub gas: u64,
    pub gas_price: u64,
    pub value: u64,
    pub nonce: u64,
    pub data: String,
    pub time: u64,
}

impl Transaction {
    pub fn new(
        from: Address,
        to: Address,
        gas: u64,
        gas_price: u64,
        value: u64,
        nonce: u64,
        data: impl Into<String>,
        time: u64,
    ) -> Self {
        Transaction {
            from,
            to,
            gas,
            gas_price,
            value,
            nonce,
            data: data.into(),
            time,
        }
    }

    /// A transaction with the default gas and gas price, timestamped now.
    pub fn base(
        from: Address,
        to: Address,
        value: u64,
        nonce: u64,
        data: impl Into<String>,
        time: u64,
    ) -> Self {
        Transaction::new(from, to, TX_GAS, TX_GAS_PRICE_DEFAULT, value, nonce, data, time)
    }

    pub fn is_reward(&self) -> bool {
        self.data == REWARD_DATA
    }

    pub fn gas_cost(&self) -> u64 {
        self.gas + self.gas_price
    }

    pub fn cost(&self) -> u64 {
        self.value + self.gas_cost()
    }

    /// The canonical encoding: the source of truth for hash and
    /// signature computations. Field set depends on `gas`, see
    /// `CanonicalTx`.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("Transaction encodes to JSON infallibly")
    }

    pub fn hash(&self) -> Hash {
        Hash::sha256(&self.encode())
    }

    pub fn sign(self, secret: &SecretKey) -> Result<SignedTx, CryptoError> {
        let hash = self.hash();
        let sig = crypto_sign(secret, &hash)?;
        Ok(SignedTx { tx: self, sig })
    }
}

/// Tagged-variant wire shape: presence of `gas` is the tag. Serializing
/// a `Transaction` with `gas == 0` drops `gas`/`gas_price` entirely;
/// deserializing tries the current shape (gas present) first and falls
/// back to the legacy shape (gas absent, defaulting to 0/0).
#[derive(Serialize, Deserialize)]
struct CanonicalTx {
    from: Address,
    to: Address,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    gas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    gas_price: Option<u64>,
    value: u64,
    nonce: u64,
    data: String,
    time: u64,
}

impl Serialize for Transaction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let canonical = if self.gas == 0 {
            CanonicalTx {
                from: self.from,
                to: self.to,
                gas: None,
                gas_price: None,
                value: self.value,
                nonce: self.nonce,
                data: self.data.clone(),
                time: self.time,
            }
        } else {
            CanonicalTx {
                from: self.from,
                to: self.to,
                gas: Some(self.gas),
                gas_price: Some(self.gas_price),
                value: self.value,
                nonce: self.nonce,
                data: self.data.clone(),
                time: self.time,
            }
        };
        canonical.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Transaction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let canonical = CanonicalTx::deserialize(deserializer)?;
        Ok(Transaction {
            from: canonical.from,
            to: canonical.to,
            gas: canonical.gas.unwrap_or(0),
            gas_price: canonical.gas.map(|_| canonical.gas_price.unwrap_or(0)).unwrap_or(0),
            value: canonical.value,
            nonce: canonical.nonce,
            data: canonical.data,
            time: canonical.time,
        })
    }
}

/// A `Transaction` plus a 65-byte recoverable signature over the SHA-256
/// hash of the unsigned transaction's canonical encoding. The signature
/// itself is never part of that hash preimage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub tx: Transaction,
    pub sig: Signature,
}

impl std::ops::Deref for SignedTx {
    type Target = Transaction;
    fn deref(&self) -> &Transaction {
        &self.tx
    }
}

impl SignedTx {
    pub fn new(tx: Transaction, sig: Signature) -> Self {
        SignedTx { tx, sig }
    }

    /// Full signed encoding, used as the mempool/archive key and for
    /// on-disk block payloads. Distinct from `tx.hash()`, which is the
    /// unsigned hash used for signing and authentication.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("SignedTx encodes to JSON infallibly")
    }

    pub fn hash(&self) -> Hash {
        Hash::sha256(&self.encode())
    }

    /// Recovers the signer from `sig` and checks it matches `from`.
    pub fn is_authentic(&self) -> Result<bool, CryptoError> {
        let unsigned_hash = self.tx.hash();
        let recovered = recover_address(&self.sig, &unsigned_hash)?;
        Ok(recovered == self.tx.from)
    }
}

#[derive(Serialize, Deserialize)]
struct CanonicalSignedTx {
    from: Address,
    to: Address,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    gas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    gas_price: Option<u64>,
    value: u64,
    nonce: u64,
    data: String,
    time: u64,
    signature: Signature,
}

impl Serialize for SignedTx {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (gas, gas_price) = if self.tx.gas == 0 {
            (None, None)
        } else {
            (Some(self.tx.gas), Some(self.tx.gas_price))
        };
        let canonical = CanonicalSignedTx {
            from: self.tx.from,
            to: self.tx.to,
            gas,
            gas_price,
            value: self.tx.value,
            nonce: self.tx.nonce,
            data: self.tx.data.clone(),
            time: self.tx.time,
            signature: self.sig,
        };
        canonical.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SignedTx {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let canonical = CanonicalSignedTx::deserialize(deserializer)?;
        let tx = Transaction {
            from: canonical.from,
            to: canonical.to,
            gas: canonical.gas.unwrap_or(0),
            gas_price: canonical.gas.map(|_| canonical.gas_price.unwrap_or(0)).unwrap_or(0),
            value: canonical.value,
            nonce: canonical.nonce,
            data: canonical.data,
            time: canonical.time,
        };
        Ok(SignedTx {
            tx,
            sig: canonical.signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::Secp256k1;

    fn keypair() -> (SecretKey, Address) {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (secret, public) = secp.generate_keypair(&mut rng);
        (secret, Address::from_public_key(&public))
    }

    #[test]
    fn current_encoding_round_trips() {
        let (_secret, from) = keypair();
        let to = Address::ZERO;
        let tx = Transaction::new(from, to, 1, 1, 100, 1, "", 1_700_000_000);
        let encoded = tx.encode();
        let decoded: Transaction = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(tx, decoded);
        assert_eq!(tx.hash(), decoded.hash());
        assert!(encoded_has_gas_fields(&encoded));
    }

    #[test]
    fn legacy_encoding_round_trips_and_omits_gas() {
        let (_secret, from) = keypair();
        let to = Address::ZERO;
        let tx = Transaction::new(from, to, 0, 0, 100, 1, "", 1_700_000_000);
        let encoded = tx.encode();
        assert!(!encoded_has_gas_fields(&encoded));

        let decoded: Transaction = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(tx, decoded);
        assert_eq!(tx.hash(), decoded.hash());
    }

    fn encoded_has_gas_fields(encoded: &[u8]) -> bool {
        let v: serde_json::Value = serde_json::from_slice(encoded).unwrap();
        v.get("gas").is_some()
    }

    #[test]
    fn signed_tx_is_authentic_for_its_own_signer() {
        let (secret, from) = keypair();
        let to = Address::ZERO;
        let tx = Transaction::base(from, to, 100, 1, "", 1_700_000_000);
        let signed = tx.sign(&secret).unwrap();
        assert!(signed.is_authentic().unwrap());
    }

    #[test]
    fn forged_from_is_not_authentic() {
        let (attacker_secret, _attacker) = keypair();
        let (_victim_secret, victim) = keypair();
        let to = Address::ZERO;
        // Attacker builds a tx claiming to be `victim` but signs with
        // their own key.
        let forged = Transaction::base(victim, to, 100, 1, "", 1_700_000_000);
        let signed = forged.sign(&attacker_secret).unwrap();
        assert!(!signed.is_authentic().unwrap());
    }

    #[test]
    fn signed_tx_encoding_round_trips() {
        let (secret, from) = keypair();
        let to = Address::ZERO;
        let tx = Transaction::base(from, to, 100, 1, "", 1_700_000_000);
        let signed = tx.sign(&secret).unwrap();

        let encoded = signed.encode();
        let decoded: SignedTx = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(signed, decoded);
    }
}
