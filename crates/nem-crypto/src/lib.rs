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

//! Hashing, address derivation and recoverable-signature primitives.
//!
//! `Hash` is a 32-byte SHA-256 digest, `Address` is the low 20 bytes of
//! the keccak-256 hash of an uncompressed secp256k1 public key. Both
//! serialize as lowercase `0x`-prefixed hex, matching the canonical
//! text form the rest of the workspace expects on the wire and on
//! disk.

use std::fmt;
use std::str::FromStr;

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tiny_keccak::{Hasher, Keccak};

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("expected a 0x-prefixed hex string of length {expected}, got {got}")]
    BadHexLength { expected: usize, got: usize },
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("signature is malformed")]
    BadSignature,
    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),
}

/// A 32-byte SHA-256 digest. The all-zero value is the sentinel
/// "empty/unset" hash used for the genesis parent and sync's
/// "give me everything" query.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != 32 {
            return Err(CryptoError::BadHexLength {
                expected: 32,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Hash(out))
    }

    /// SHA-256 over `data`. Used for both block and transaction hashing,
    /// each over their respective canonical JSON encoding.
    pub fn sha256(data: &[u8]) -> Hash {
        let digest = Sha256::digest(data);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Hash(out)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = CryptoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(DeError::custom)
    }
}

/// A 20-byte account identifier: the low 20 bytes of keccak-256 over an
/// uncompressed secp256k1 public key, excluding the leading `0x04` tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != 20 {
            return Err(CryptoError::BadHexLength {
                expected: 20,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Address(out))
    }

    pub fn from_public_key(key: &PublicKey) -> Address {
        let uncompressed = key.serialize_uncompressed();
        // Drop the leading 0x04 tag byte before hashing, per spec.
        let mut keccak = Keccak::v256();
        let mut digest = [0u8; 32];
        keccak.update(&uncompressed[1..]);
        keccak.finalize(&mut digest);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[12..]);
        Address(out)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = CryptoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(DeError::custom)
    }
}

/// A 65-byte recoverable ECDSA signature (r || s || v).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 65]);

impl Signature {
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != 65 {
            return Err(CryptoError::BadHexLength {
                expected: 65,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 65];
        out.copy_from_slice(&bytes);
        Ok(Signature(out))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Signature::from_hex(&s).map_err(DeError::custom)
    }
}

/// Signs `hash` (already the SHA-256 digest of a canonical encoding)
/// with `secret`, returning a 65-byte recoverable signature.
pub fn sign(secret: &SecretKey, hash: &Hash) -> Result<Signature, CryptoError> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(hash.0);
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, secret)
        .serialize_compact();
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&compact);
    out[64] = recovery_id.to_i32() as u8;
    Ok(Signature(out))
}

/// Recovers the signer's address from `sig` over `hash`.
pub fn recover_address(sig: &Signature, hash: &Hash) -> Result<Address, CryptoError> {
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(hash.0);
    let recovery_id = RecoveryId::from_i32(sig.0[64] as i32).map_err(|_| CryptoError::BadSignature)?;
    let recoverable = RecoverableSignature::from_compact(&sig.0[..64], recovery_id)
        .map_err(|_| CryptoError::BadSignature)?;
    let pubkey = secp
        .recover_ecdsa(&message, &recoverable)
        .map_err(|_| CryptoError::BadSignature)?;
    Ok(Address::from_public_key(&pubkey))
}

/// Generates a fresh secp256k1 keypair, suitable for `wallet new-account`.
pub fn generate_keypair() -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    let mut rng = rand::thread_rng();
    secp.generate_keypair(&mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_hex_round_trips() {
        let h = Hash::sha256(b"nemos");
        let s = h.to_hex();
        assert_eq!(Hash::from_hex(&s).unwrap(), h);
    }

    #[test]
    fn zero_hash_is_empty() {
        assert!(Hash::ZERO.is_empty());
        assert!(!Hash::sha256(b"x").is_empty());
    }

    #[test]
    fn sign_and_recover_round_trips() {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (secret, public) = secp.generate_keypair(&mut rng);
        let address = Address::from_public_key(&public);

        let hash = Hash::sha256(b"transfer 100 NEM");
        let sig = sign(&secret, &hash).unwrap();
        let recovered = recover_address(&sig, &hash).unwrap();

        assert_eq!(recovered, address);
    }

    #[test]
    fn recovery_fails_authentication_for_wrong_signer() {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (secret, _public) = secp.generate_keypair(&mut rng);
        let (_other_secret, other_public) = secp.generate_keypair(&mut rng);

        let hash = Hash::sha256(b"transfer 100 NEM");
        let sig = sign(&secret, &hash).unwrap();
        let recovered = recover_address(&sig, &hash).unwrap();

        assert_ne!(recovered, Address::from_public_key(&other_public));
    }
}
