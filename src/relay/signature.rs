// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing of paymaster typed data.

use serde_json::Value;
use starknet_core::types::{Felt, TypedData};

use super::client::RelayError;
use crate::blockchain::StarkSigner;

/// SNIP-12 message hash of `typed_data` for `account`.
pub fn typed_data_hash(typed_data: &Value, account: &Felt) -> Result<Felt, RelayError> {
    let parsed: TypedData = serde_json::from_value(typed_data.clone())
        .map_err(|e| RelayError::InvalidTypedData(e.to_string()))?;
    parsed
        .message_hash(*account)
        .map_err(|e| RelayError::InvalidTypedData(e.to_string()))
}

/// Hash and sign typed data, returning the signature as hex strings.
pub fn sign_typed_data(
    signer: &StarkSigner,
    typed_data: &Value,
    account: &Felt,
) -> Result<Vec<String>, RelayError> {
    let hash = typed_data_hash(typed_data, account)?;
    let signature = signer
        .sign_hash(&hash)
        .map_err(|e| RelayError::Signing(e.to_string()))?;
    Ok(signature.into_hex())
}
