// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize` or `Deserialize` plus
//! `ToSchema` for automatic JSON handling and OpenAPI documentation.
//!
//! Amounts are always sent as decimal strings (`"12.5"`) in the token's
//! display unit and converted to base units server-side. Addresses are
//! `0x`-prefixed hex strings; responses use the zero-padded 64-digit form.
//!
//! ## Model Categories
//!
//! - **Wallets**: provisioning and lookup
//! - **Actions**: gasless contract interactions relayed through the paymaster
//! - **Portfolio**: indexer-backed balances, positions and transfers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::TokenSummary;

// =============================================================================
// Wallet Models
// =============================================================================

/// Request to provision a new custodial wallet.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    /// PIN protecting the account key. At least 4 characters.
    pub pin: String,
}

/// Public view of a provisioned wallet. Never contains secrets.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletResponse {
    pub address: String,
    pub public_key: String,
    /// Whether the account contract has been deployed on chain.
    pub deployed: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Action Models
// =============================================================================

/// Gas payment settings shared by every action request.
///
/// When omitted the paymaster sponsors the transaction.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GasOptions {
    /// Token used to pay gas instead of sponsorship.
    #[serde(default)]
    pub gas_token_address: Option<String>,
    /// Maximum gas token amount in base units (decimal or `0x` hex).
    #[serde(default)]
    pub max_gas_token_amount: Option<String>,
}

/// Deploy the wallet's account contract.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeployRequest {
    #[serde(flatten)]
    pub gas: GasOptions,
}

/// Deposit the vault asset into the lending vault.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Amount of the deposit token, e.g. `"12.5"`.
    pub amount: String,
    #[serde(flatten)]
    pub gas: GasOptions,
}

/// Redeem vault shares back into the vault asset.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RedeemRequest {
    /// Number of shares, in the deposit token's precision.
    pub shares: String,
    /// Receiver of the assets. Defaults to the wallet itself.
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(flatten)]
    pub gas: GasOptions,
}

/// Transfer a token to another address.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Token symbol (`USDC`, `STRK`, `ETH`) or contract address.
    pub token: String,
    pub recipient: String,
    pub amount: String,
    #[serde(flatten)]
    pub gas: GasOptions,
}

/// Claim rewards from the distributor.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClaimRequest {
    /// Claimable amount of the reward token.
    pub amount: String,
    /// Merkle proof as `0x` hex field elements.
    #[serde(default)]
    pub proof: Vec<String>,
    #[serde(flatten)]
    pub gas: GasOptions,
}

/// Swap one token for another through the router.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SwapRequest {
    pub sell_token: String,
    pub buy_token: String,
    /// Amount of `sell_token` to sell.
    pub amount: String,
    /// Minimum amount of `buy_token` to accept. Defaults to zero.
    #[serde(default)]
    pub min_amount_out: Option<String>,
    #[serde(flatten)]
    pub gas: GasOptions,
}

/// Claim rewards, wait for the claim to be final, then swap them into the
/// deposit token.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClaimAndSwapRequest {
    pub amount: String,
    #[serde(default)]
    pub proof: Vec<String>,
    #[serde(default)]
    pub min_amount_out: Option<String>,
    #[serde(flatten)]
    pub gas: GasOptions,
}

/// Result of a relayed action.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub transaction_hash: String,
    /// Display amount moved by the action, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenSummary>,
}

/// Result of the chained claim-then-swap action.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimAndSwapResponse {
    pub claim_transaction_hash: String,
    pub swap_transaction_hash: String,
    pub amount: f64,
}

// =============================================================================
// Portfolio Models
// =============================================================================

/// Indexer data for a wallet, amounts converted to display units.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PortfolioResponse {
    pub address: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_options_are_flattened() {
        let request: DepositRequest = serde_json::from_value(serde_json::json!({
            "amount": "1.5",
            "gas_token_address": "0x1"
        }))
        .unwrap();
        assert_eq!(request.amount, "1.5");
        assert_eq!(request.gas.gas_token_address.as_deref(), Some("0x1"));
        assert!(request.gas.max_gas_token_amount.is_none());
    }

    #[test]
    fn transaction_response_omits_empty_fields() {
        let body = serde_json::to_value(TransactionResponse {
            transaction_hash: "0xabc".to_string(),
            amount: None,
            token: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"transaction_hash": "0xabc"}));
    }
}
