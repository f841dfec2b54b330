// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory credential store.
//!
//! Records are keyed by the canonical (zero-padded) account address so that
//! short and padded forms of the same address resolve to one wallet. Only
//! encrypted secrets are held; nothing here can sign on its own.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use starknet_core::types::Felt;

use crate::blockchain::format_address;
use crate::crypto::EncryptedCredential;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRecord {
    pub address: Felt,
    pub public_key: Felt,
    pub encrypted_private_key: EncryptedCredential,
    pub encrypted_pin: EncryptedCredential,
    pub deployed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct CredentialStore {
    wallets: HashMap<String, WalletRecord>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: WalletRecord) -> Result<(), ApiError> {
        let key = format_address(&record.address);
        if self.wallets.contains_key(&key) {
            return Err(ApiError::conflict(format!("Wallet {key} already exists")));
        }
        self.wallets.insert(key, record);
        Ok(())
    }

    pub fn get(&self, address: &Felt) -> Result<WalletRecord, ApiError> {
        self.wallets
            .get(&format_address(address))
            .cloned()
            .ok_or_else(|| ApiError::not_found("Wallet not found"))
    }

    pub fn mark_deployed(&mut self, address: &Felt) -> Result<(), ApiError> {
        match self.wallets.get_mut(&format_address(address)) {
            Some(record) => {
                record.deployed = true;
                Ok(())
            }
            None => Err(ApiError::not_found("Wallet not found")),
        }
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn record(address: u64) -> WalletRecord {
        WalletRecord {
            address: Felt::from(address),
            public_key: Felt::from(address + 1),
            encrypted_private_key: EncryptedCredential::new("key"),
            encrypted_pin: EncryptedCredential::new("pin"),
            deployed: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_get() {
        let mut store = CredentialStore::new();
        assert!(store.is_empty());
        store.insert(record(0xa)).unwrap();

        let fetched = store.get(&Felt::from(0xau64)).unwrap();
        assert_eq!(fetched.public_key, Felt::from(0xbu64));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_insert_conflicts() {
        let mut store = CredentialStore::new();
        store.insert(record(1)).unwrap();
        assert_eq!(store.insert(record(1)).unwrap_err().status, StatusCode::CONFLICT);
    }

    #[test]
    fn missing_wallet_is_not_found() {
        let mut store = CredentialStore::new();
        assert_eq!(store.get(&Felt::ONE).unwrap_err().status, StatusCode::NOT_FOUND);
        assert_eq!(
            store.mark_deployed(&Felt::ONE).unwrap_err().status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn mark_deployed_updates_record() {
        let mut store = CredentialStore::new();
        store.insert(record(7)).unwrap();
        store.mark_deployed(&Felt::from(7u64)).unwrap();
        assert!(store.get(&Felt::from(7u64)).unwrap().deployed);
    }
}
