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

//! Password-encrypted storage for secp256k1 account keys: one JSON file
//! per account under `<data_dir>/keystore/`. Not a drop-in for the
//! go-ethereum v3 keystore format the original node delegated to —
//! scrypt + AES-256-GCM instead of scrypt/pbkdf2 + AES-128-CTR+MAC —
//! but the same shape (KDF params + salt, cipher + ciphertext) and the
//! same job: keep a private key at rest behind a password.

use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use nem_core::{Address, SignedTx, Transaction};
use rand::RngCore;
use scrypt::Params;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};

const KEYSTORE_DIR_NAME: &str = "keystore";
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum KeystoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported KDF {0}, expected scrypt")]
    UnsupportedKdf(String),
    #[error("unsupported cipher {0}, expected aes-256-gcm")]
    UnsupportedCipher(String),
    #[error("scrypt parameters invalid: {0}")]
    ScryptParams(#[from] scrypt::errors::InvalidParams),
    #[error("key derivation failed: {0}")]
    ScryptDerive(#[from] scrypt::errors::InvalidOutputLen),
    #[error("decryption failed: wrong password or corrupt keystore file")]
    Decrypt,
    #[error("invalid secp256k1 key material: {0}")]
    Secp256k1(#[from] secp256k1::Error),
    #[error("signing failed: {0}")]
    Crypto(#[from] nem_core::CryptoError),
    #[error("no keystore file found for account {0}")]
    AccountNotFound(Address),
}

pub fn keystore_dir_path(data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join(KEYSTORE_DIR_NAME)
}

fn account_file_path(keystore_dir: &Path, address: Address) -> PathBuf {
    keystore_dir.join(format!("{}.json", address.to_hex()))
}

#[derive(Serialize, Deserialize)]
struct KeystoreFile {
    address: Address,
    crypto: CryptoParams,
}

#[derive(Serialize, Deserialize)]
struct CryptoParams {
    cipher: String,
    ciphertext: String,
    nonce: String,
    kdf: String,
    kdfparams: KdfParams,
}

#[derive(Serialize, Deserialize)]
struct KdfParams {
    n: u32,
    r: u32,
    p: u32,
    salt: String,
}

fn derive_key(password: &str, salt: &[u8], n: u32, r: u32, p: u32) -> Result<[u8; 32], KeystoreError> {
    let log_n = n.trailing_zeros() as u8;
    let params = Params::new(log_n, r, p, 32)?;
    let mut key = [0u8; 32];
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut key)?;
    Ok(key)
}

fn encrypt_secret(secret: &SecretKey, password: &str) -> Result<CryptoParams, KeystoreError> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let n: u32 = 1 << SCRYPT_LOG_N;
    let key_bytes = derive_key(password, &salt, n, SCRYPT_R, SCRYPT_P)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, secret.secret_bytes().as_ref())
        .map_err(|_| KeystoreError::Decrypt)?;

    Ok(CryptoParams {
        cipher: "aes-256-gcm".to_string(),
        ciphertext: hex::encode(ciphertext),
        nonce: hex::encode(nonce_bytes),
        kdf: "scrypt".to_string(),
        kdfparams: KdfParams {
            n,
            r: SCRYPT_R,
            p: SCRYPT_P,
            salt: hex::encode(salt),
        },
    })
}

fn decrypt_secret(crypto: &CryptoParams, password: &str) -> Result<SecretKey, KeystoreError> {
    if crypto.kdf != "scrypt" {
        return Err(KeystoreError::UnsupportedKdf(crypto.kdf.clone()));
    }
    if crypto.cipher != "aes-256-gcm" {
        return Err(KeystoreError::UnsupportedCipher(crypto.cipher.clone()));
    }

    let salt = hex::decode(&crypto.kdfparams.salt)?;
    let key_bytes = derive_key(password, &salt, crypto.kdfparams.n, crypto.kdfparams.r, crypto.kdfparams.p)?;

    let nonce_bytes = hex::decode(&crypto.nonce)?;
    let ciphertext = hex::decode(&crypto.ciphertext)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let secret_bytes = cipher.decrypt(nonce, ciphertext.as_ref()).map_err(|_| KeystoreError::Decrypt)?;

    Ok(SecretKey::from_slice(&secret_bytes)?)
}

impl From<hex::FromHexError> for KeystoreError {
    fn from(_: hex::FromHexError) -> Self {
        KeystoreError::Decrypt
    }
}

/// Generates a fresh keypair, encrypts the secret key under `password`,
/// and writes it to `<dir>/keystore/<address>.json`.
pub fn new_account(dir: impl AsRef<Path>, password: &str) -> Result<Address, KeystoreError> {
    let secp = Secp256k1::new();
    let mut rng = rand::thread_rng();
    let (secret, public) = secp.generate_keypair(&mut rng);
    let address = Address::from_public_key(&public);

    let keystore_dir = keystore_dir_path(&dir);
    std::fs::create_dir_all(&keystore_dir)?;

    let crypto = encrypt_secret(&secret, password)?;
    let file = KeystoreFile { address, crypto };
    std::fs::write(account_file_path(&keystore_dir, address), serde_json::to_vec_pretty(&file)?)?;

    Ok(address)
}

/// Loads and decrypts the keystore file for `address` under `dir`.
pub fn unlock(dir: impl AsRef<Path>, address: Address, password: &str) -> Result<SecretKey, KeystoreError> {
    let path = account_file_path(&keystore_dir_path(&dir), address);
    if !path.exists() {
        return Err(KeystoreError::AccountNotFound(address));
    }
    let file: KeystoreFile = serde_json::from_slice(&std::fs::read(path)?)?;
    decrypt_secret(&file.crypto, password)
}

/// Signs `tx` with the account's decrypted key. Backs `/tx/add`.
pub fn sign_with_account(
    dir: impl AsRef<Path>,
    address: Address,
    password: &str,
    tx: Transaction,
) -> Result<SignedTx, KeystoreError> {
    let secret = unlock(dir, address, password)?;
    Ok(tx.sign(&secret)?)
}

/// Decrypts an arbitrary keystore file, returning its keypair. Backs
/// `wallet pk-print`.
pub fn decrypt_for_print(path: impl AsRef<Path>, password: &str) -> Result<(SecretKey, PublicKey), KeystoreError> {
    let file: KeystoreFile = serde_json::from_slice(&std::fs::read(path)?)?;
    let secret = decrypt_secret(&file.crypto, password)?;
    let secp = Secp256k1::new();
    let public = PublicKey::from_secret_key(&secp, &secret);
    Ok((secret, public))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_then_sign_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let address = new_account(dir.path(), "correct horse battery staple").unwrap();

        let tx = Transaction::base(address, Address::ZERO, 10, 1, "", 1_700_000_000);
        let signed = sign_with_account(dir.path(), address, "correct horse battery staple", tx).unwrap();
        assert!(signed.is_authentic().unwrap());
    }

    #[test]
    fn wrong_password_fails_to_decrypt() {
        let dir = tempfile::tempdir().unwrap();
        let address = new_account(dir.path(), "right password").unwrap();

        let tx = Transaction::base(address, Address::ZERO, 10, 1, "", 1_700_000_000);
        let result = sign_with_account(dir.path(), address, "wrong password", tx);
        assert!(matches!(result, Err(KeystoreError::Decrypt)));
    }

    #[test]
    fn unknown_account_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = unlock(dir.path(), Address::ZERO, "whatever");
        assert!(matches!(result, Err(KeystoreError::AccountNotFound(_))));
    }

    #[test]
    fn decrypt_for_print_recovers_matching_keypair() {
        let dir = tempfile::tempdir().unwrap();
        let address = new_account(dir.path(), "hunter2").unwrap();
        let path = account_file_path(&keystore_dir_path(dir.path()), address);

        let (_secret, public) = decrypt_for_print(&path, "hunter2").unwrap();
        assert_eq!(Address::from_public_key(&public), address);
    }
}
