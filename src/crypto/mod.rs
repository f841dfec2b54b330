// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential encryption.

pub mod secret_codec;

pub use secret_codec::{
    decrypt_pin, decrypt_private_key, encrypt_pin, encrypt_private_key, CredentialError,
    EncryptedCredential, Pin,
};
