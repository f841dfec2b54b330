// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract call batches for each supported wallet operation.
//!
//! Every endpoint maps to one [`Operation`] variant; [`build_calls`] turns it
//! into the ordered list of invocations sent to the paymaster. Approvals are
//! always emitted before the call that spends the allowance.

use serde::{Serialize, Serializer};
use starknet_core::types::Felt;

use super::amount::FixedPointPair;
use super::types::felt_to_hex;

pub const APPROVE_ENTRY_POINT: &str = "approve";
pub const TRANSFER_ENTRY_POINT: &str = "transfer";
pub const DEPOSIT_ENTRY_POINT: &str = "deposit";
pub const REDEEM_ENTRY_POINT: &str = "redeem";
pub const CLAIM_ENTRY_POINT: &str = "claim";
pub const SWAP_ENTRY_POINT: &str = "swap_exact_tokens_for_tokens";

/// One contract invocation within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescriptor {
    pub contract_address: Felt,
    pub entry_point: &'static str,
    pub calldata: Vec<Felt>,
}

impl CallDescriptor {
    fn new(contract_address: Felt, entry_point: &'static str, calldata: Vec<Felt>) -> Self {
        Self {
            contract_address,
            entry_point,
            calldata,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireCall<'a> {
    contract_address: String,
    entrypoint: &'a str,
    calldata: Vec<String>,
}

impl Serialize for CallDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireCall {
            contract_address: felt_to_hex(&self.contract_address),
            entrypoint: self.entry_point,
            calldata: self.calldata.iter().map(felt_to_hex).collect(),
        }
        .serialize(serializer)
    }
}

/// A wallet operation with its parameters already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Approve the vault and deposit `amount` of `token` on behalf of `receiver`.
    ApproveAndDeposit {
        token: Felt,
        vault: Felt,
        amount: FixedPointPair,
        receiver: Felt,
    },
    /// Burn vault shares and send the underlying assets to `receiver`.
    Redeem {
        vault: Felt,
        shares: FixedPointPair,
        receiver: Felt,
        owner: Felt,
    },
    Transfer {
        token: Felt,
        recipient: Felt,
        amount: FixedPointPair,
    },
    /// Claim rewards with a merkle proof.
    Claim {
        distributor: Felt,
        amount: FixedPointPair,
        proof: Vec<Felt>,
    },
    Swap {
        router: Felt,
        sell_token: Felt,
        buy_token: Felt,
        amount: FixedPointPair,
        min_amount_out: FixedPointPair,
        recipient: Felt,
    },
}

impl Operation {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ApproveAndDeposit { .. } => "approve_and_deposit",
            Operation::Redeem { .. } => "redeem",
            Operation::Transfer { .. } => "transfer",
            Operation::Claim { .. } => "claim",
            Operation::Swap { .. } => "swap",
        }
    }
}

/// Build the ordered call batch for an operation.
pub fn build_calls(operation: &Operation) -> Vec<CallDescriptor> {
    match operation {
        Operation::ApproveAndDeposit {
            token,
            vault,
            amount,
            receiver,
        } => vec![
            approve(*token, *vault, amount),
            CallDescriptor::new(
                *vault,
                DEPOSIT_ENTRY_POINT,
                with_u256(amount, [*receiver]),
            ),
        ],
        Operation::Redeem {
            vault,
            shares,
            receiver,
            owner,
        } => vec![CallDescriptor::new(
            *vault,
            REDEEM_ENTRY_POINT,
            with_u256(shares, [*receiver, *owner]),
        )],
        Operation::Transfer {
            token,
            recipient,
            amount,
        } => {
            let mut calldata = vec![*recipient];
            calldata.extend(amount.to_calldata());
            vec![CallDescriptor::new(*token, TRANSFER_ENTRY_POINT, calldata)]
        }
        Operation::Claim {
            distributor,
            amount,
            proof,
        } => {
            let mut calldata = amount.to_calldata().to_vec();
            calldata.push(Felt::from(proof.len() as u64));
            calldata.extend(proof.iter().copied());
            vec![CallDescriptor::new(*distributor, CLAIM_ENTRY_POINT, calldata)]
        }
        Operation::Swap {
            router,
            sell_token,
            buy_token,
            amount,
            min_amount_out,
            recipient,
        } => {
            let mut calldata = vec![*sell_token, *buy_token];
            calldata.extend(amount.to_calldata());
            calldata.extend(min_amount_out.to_calldata());
            calldata.push(*recipient);
            vec![
                approve(*sell_token, *router, amount),
                CallDescriptor::new(*router, SWAP_ENTRY_POINT, calldata),
            ]
        }
    }
}

fn approve(token: Felt, spender: Felt, amount: &FixedPointPair) -> CallDescriptor {
    let mut calldata = vec![spender];
    calldata.extend(amount.to_calldata());
    CallDescriptor::new(token, APPROVE_ENTRY_POINT, calldata)
}

fn with_u256<const N: usize>(amount: &FixedPointPair, tail: [Felt; N]) -> Vec<Felt> {
    let mut calldata = amount.to_calldata().to_vec();
    calldata.extend(tail);
    calldata
}
