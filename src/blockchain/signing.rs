// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stark key handling and message signing.
//!
//! Keys only exist in plaintext for the duration of a single request: they are
//! decrypted by the secret codec, wrapped in a [`StarkSigner`], used to sign one
//! typed-data hash and dropped.

use ring::rand::{SecureRandom, SystemRandom};
use starknet_core::crypto::{ecdsa_sign, ecdsa_verify};
use starknet_core::types::Felt;
use starknet_crypto::get_public_key;
use zeroize::Zeroize;

/// Errors raised by key handling and signing.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Random number generator failure")]
    Rng,

    #[error("Signing failed: {0}")]
    Sign(String),
}

/// Raw output of a signer.
///
/// Account implementations disagree on the signature layout; callers pass the
/// shape to [`SignatureShape::into_hex`] straight away and only handle strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureShape {
    Felts(Vec<Felt>),
    Pair { r: Felt, s: Felt },
}

impl SignatureShape {
    /// Normalize to a list of `0x` hex integers as the relay expects.
    pub fn into_hex(self) -> Vec<String> {
        match self {
            SignatureShape::Felts(felts) => felts.iter().map(Felt::to_hex_string).collect(),
            SignatureShape::Pair { r, s } => vec![r.to_hex_string(), s.to_hex_string()],
        }
    }
}

/// A Stark private key able to sign message hashes.
pub struct StarkSigner {
    private_key: Felt,
}

impl std::fmt::Debug for StarkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StarkSigner")
            .field("public_key", &self.public_key().to_hex_string())
            .finish_non_exhaustive()
    }
}

impl Drop for StarkSigner {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl StarkSigner {
    /// Overwrite the key in place. `black_box` keeps the store from being
    /// optimized out.
    fn wipe(&mut self) {
        self.private_key = Felt::ZERO;
        std::hint::black_box(&self.private_key);
    }

    /// Generate a fresh key from the OS CSPRNG.
    ///
    /// 31 random bytes keep the scalar below the curve order.
    pub fn generate() -> Result<Self, SigningError> {
        let rng = SystemRandom::new();
        let mut bytes = [0u8; 31];
        loop {
            rng.fill(&mut bytes).map_err(|_| SigningError::Rng)?;
            let key = Felt::from_bytes_be_slice(&bytes);
            bytes.zeroize();
            if key != Felt::ZERO {
                return Ok(Self { private_key: key });
            }
        }
    }

    /// Load a key from its hex representation (with or without `0x`).
    pub fn from_hex(raw: &str) -> Result<Self, SigningError> {
        let trimmed = raw.trim();
        let prefixed = if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            trimmed.to_string()
        } else {
            format!("0x{trimmed}")
        };

        let private_key = Felt::from_hex(&prefixed)
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;
        if private_key == Felt::ZERO {
            return Err(SigningError::InvalidPrivateKey("key is zero".to_string()));
        }

        Ok(Self { private_key })
    }

    pub fn public_key(&self) -> Felt {
        get_public_key(&self.private_key)
    }

    /// Canonical hex form of the private key (`0x` + 64 digits).
    pub fn secret_hex(&self) -> String {
        self.private_key.to_fixed_hex_string()
    }

    /// Sign a message hash, returning `(r, s)`.
    pub fn sign_hash(&self, hash: &Felt) -> Result<SignatureShape, SigningError> {
        let signature =
            ecdsa_sign(&self.private_key, hash).map_err(|e| SigningError::Sign(e.to_string()))?;
        Ok(SignatureShape::Pair {
            r: signature.r,
            s: signature.s,
        })
    }
}

/// Check a `(r, s)` signature against a public key.
pub fn verify_signature(public_key: &Felt, hash: &Felt, r: &Felt, s: &Felt) -> bool {
    ecdsa_verify(public_key, hash, &starknet_core::crypto::Signature { r: *r, s: *s })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_distinct_and_loadable() {
        let a = StarkSigner::generate().unwrap();
        let b = StarkSigner::generate().unwrap();
        assert_ne!(a.secret_hex(), b.secret_hex());

        let reloaded = StarkSigner::from_hex(&a.secret_hex()).unwrap();
        assert_eq!(reloaded.public_key(), a.public_key());
    }

    #[test]
    fn accepts_bare_hex() {
        let signer = StarkSigner::from_hex("1234abcd").unwrap();
        assert_eq!(signer.secret_hex(), format!("0x{:0>64}", "1234abcd"));
    }

    #[test]
    fn rejects_invalid_keys() {
        assert!(StarkSigner::from_hex("0xnope").is_err());
        assert!(StarkSigner::from_hex("0x0").is_err());
    }

    #[test]
    fn signature_verifies() {
        let signer = StarkSigner::generate().unwrap();
        let hash = Felt::from(0xdead_beef_u64);

        let SignatureShape::Pair { r, s } = signer.sign_hash(&hash).unwrap() else {
            panic!("expected r/s pair");
        };
        assert!(verify_signature(&signer.public_key(), &hash, &r, &s));
        assert!(!verify_signature(&signer.public_key(), &Felt::from(1u64), &r, &s));
    }

    #[test]
    fn shapes_normalize_to_hex() {
        let pair = SignatureShape::Pair {
            r: Felt::from(10u64),
            s: Felt::from(11u64),
        };
        assert_eq!(pair.into_hex(), vec!["0xa", "0xb"]);

        let felts = SignatureShape::Felts(vec![Felt::ONE, Felt::TWO, Felt::THREE]);
        assert_eq!(felts.into_hex(), vec!["0x1", "0x2", "0x3"]);
    }

    #[test]
    fn wipe_clears_private_key() {
        let mut signer = StarkSigner::from_hex("0x1234").unwrap();
        signer.wipe();
        assert_eq!(signer.private_key, Felt::ZERO);
        assert_eq!(signer.secret_hex(), format!("0x{:0>64}", "0"));
    }

    #[test]
    fn debug_output_hides_secret() {
        let signer = StarkSigner::from_hex("0x1234").unwrap();
        let debug = format!("{signer:?}");
        assert!(!debug.contains(&signer.secret_hex()));
    }
}
