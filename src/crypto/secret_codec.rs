// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PIN and private key encryption.
//!
//! Credentials are stored as `base64(salt || nonce || ciphertext)`: the
//! password (user PIN or server secret) is stretched with Argon2id over a
//! fresh 32-byte salt and the result keys AES-256-GCM with a fresh 12-byte
//! nonce. The GCM tag makes a wrong password or tampered blob fail instead
//! of yielding garbage plaintext.
//!
//! Private keys are encrypted under the user's PIN; the PIN itself is
//! encrypted under the process-wide `PIN_ENCRYPTION_SECRET`. Decryption is
//! therefore always two-step: PIN first, then key.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64ct::{Base64, Encoding};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::blockchain::StarkSigner;

const ARGON2_M_COST: u32 = 19 * 1024; // 19 MiB
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;
const KEY_LEN: usize = 32;
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

/// A decrypted PIN, wiped from memory on drop.
pub type Pin = Zeroizing<String>;

/// An encrypted secret as persisted in the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedCredential {
    pub cipher_text: String,
}

impl EncryptedCredential {
    pub fn new(cipher_text: impl Into<String>) -> Self {
        Self {
            cipher_text: cipher_text.into(),
        }
    }
}

/// Credential codec failures.
///
/// Messages are deliberately generic; callers map every variant to the same
/// opaque HTTP 500.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential is malformed")]
    Malformed,

    #[error("Credential could not be decrypted")]
    Decryption,

    #[error("Key derivation failed")]
    KeyDerivation,

    #[error("Credential could not be encrypted")]
    Encryption,
}

fn derive_key(password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CredentialError> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(KEY_LEN))
        .map_err(|_| CredentialError::KeyDerivation)?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password, salt, &mut key[..])
        .map_err(|_| CredentialError::KeyDerivation)?;

    Ok(key)
}

fn encrypt(password: &[u8], plaintext: &[u8]) -> Result<EncryptedCredential, CredentialError> {
    let rng = SystemRandom::new();
    let mut header = [0u8; HEADER_LEN];
    rng.fill(&mut header)
        .map_err(|_| CredentialError::Encryption)?;
    let (salt, nonce) = header.split_at(SALT_LEN);

    let key = derive_key(password, salt)?;
    let cipher =
        Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CredentialError::Encryption)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CredentialError::Encryption)?;

    let mut packed = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    packed.extend_from_slice(&header);
    packed.extend_from_slice(&ciphertext);

    Ok(EncryptedCredential::new(Base64::encode_string(&packed)))
}

fn decrypt(
    password: &[u8],
    credential: &EncryptedCredential,
) -> Result<Zeroizing<Vec<u8>>, CredentialError> {
    let packed = Base64::decode_vec(credential.cipher_text.trim())
        .map_err(|_| CredentialError::Malformed)?;

    // A GCM tag alone is 16 bytes.
    if packed.len() < HEADER_LEN + 16 {
        return Err(CredentialError::Malformed);
    }

    let (salt, rest) = packed.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt)?;
    let cipher =
        Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CredentialError::Decryption)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CredentialError::Decryption)?;

    Ok(Zeroizing::new(plaintext))
}

fn into_utf8(bytes: Zeroizing<Vec<u8>>) -> Result<Zeroizing<String>, CredentialError> {
    let mut bytes = bytes;
    let owned = std::mem::take(&mut *bytes);
    match String::from_utf8(owned) {
        Ok(text) => Ok(Zeroizing::new(text)),
        Err(e) => {
            e.into_bytes().zeroize();
            Err(CredentialError::Malformed)
        }
    }
}

/// Encrypt a user PIN under the server secret.
pub fn encrypt_pin(pin: &str, server_secret: &str) -> Result<EncryptedCredential, CredentialError> {
    encrypt(server_secret.as_bytes(), pin.as_bytes())
}

/// Recover a user PIN encrypted with [`encrypt_pin`].
pub fn decrypt_pin(
    encrypted_pin: &EncryptedCredential,
    server_secret: &str,
) -> Result<Pin, CredentialError> {
    into_utf8(decrypt(server_secret.as_bytes(), encrypted_pin)?)
}

/// Encrypt a private key under a PIN.
///
/// The key may be given with or without `0x`; its canonical form is stored.
pub fn encrypt_private_key(
    raw_key_hex: &str,
    pin: &str,
) -> Result<EncryptedCredential, CredentialError> {
    let signer = StarkSigner::from_hex(raw_key_hex).map_err(|_| CredentialError::Malformed)?;
    let canonical = Zeroizing::new(signer.secret_hex());
    encrypt(pin.as_bytes(), canonical.as_bytes())
}

/// Recover a private key as `0x` + 64 lowercase hex digits.
pub fn decrypt_private_key(
    encrypted_key: &EncryptedCredential,
    pin: &str,
) -> Result<Zeroizing<String>, CredentialError> {
    let plaintext = into_utf8(decrypt(pin.as_bytes(), encrypted_key)?)?;
    let signer = StarkSigner::from_hex(&plaintext).map_err(|_| CredentialError::Malformed)?;
    Ok(Zeroizing::new(signer.secret_hex()))
}
