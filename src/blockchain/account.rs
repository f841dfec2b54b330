// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Counterfactual account addresses and deployment payloads.

use serde::Serialize;
use starknet_core::types::Felt;
use starknet_core::utils::get_contract_address;

use super::types::felt_to_hex;

/// Constructor arguments for an Argent account owned by a single Stark key
/// and no guardian: `(Signer::Starknet(pubkey), Option::None)`.
pub fn account_constructor_calldata(public_key: Felt) -> Vec<Felt> {
    vec![Felt::ZERO, public_key, Felt::ONE]
}

/// Address the account will have once deployed with `salt = public_key`.
pub fn counterfactual_address(public_key: Felt, class_hash: Felt) -> Felt {
    get_contract_address(
        public_key,
        class_hash,
        &account_constructor_calldata(public_key),
        Felt::ZERO,
    )
}

/// `deploymentData` object sent to the paymaster when the account does not
/// exist on chain yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentData {
    pub class_hash: String,
    pub salt: String,
    pub unique: String,
    pub calldata: Vec<String>,
}

impl DeploymentData {
    pub fn for_account(public_key: Felt, class_hash: Felt) -> Self {
        Self {
            class_hash: felt_to_hex(&class_hash),
            salt: felt_to_hex(&public_key),
            unique: felt_to_hex(&Felt::ZERO),
            calldata: account_constructor_calldata(public_key)
                .iter()
                .map(felt_to_hex)
                .collect(),
        }
    }
}
