// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Starknet types, well-known tokens and address helpers.

use serde::Serialize;
use starknet_core::types::Felt;
use utoipa::ToSchema;

/// Argent account class (v0.4.0) used for newly provisioned wallets.
pub const ARGENT_ACCOUNT_CLASS_HASH: &str =
    "0x036078334509b514626504edc9fb252328d1a240e4e948bef8d0c08dff45927f";

/// A token whose address is fixed at compile time.
#[derive(Debug, Clone, Copy)]
pub struct KnownToken {
    pub symbol: &'static str,
    pub address: &'static str,
    pub decimals: u8,
}

impl KnownToken {
    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            symbol: self.symbol.to_string(),
            address: Felt::from_hex_unchecked(self.address),
            decimals: self.decimals,
        }
    }
}

/// Token metadata used when building calls and formatting amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: Felt,
    pub decimals: u8,
}

/// Circle USDC on Starknet mainnet.
pub const USDC_TOKEN: KnownToken = KnownToken {
    symbol: "USDC",
    address: "0x053c91253bc9682c04929ca02ed00b3e423f6710d2ee7e0d5ebb06f3ecf368a8",
    decimals: 6,
};

/// Starknet token (STRK).
pub const STRK_TOKEN: KnownToken = KnownToken {
    symbol: "STRK",
    address: "0x04718f5a0fc34cc1af16a1cdee98ffb20c31f5cd61d6ab07201858f4287c938d",
    decimals: 18,
};

/// Bridged Ether.
pub const ETH_TOKEN: KnownToken = KnownToken {
    symbol: "ETH",
    address: "0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7",
    decimals: 18,
};

/// Parse a `0x`-prefixed account or contract address into a field element.
pub fn parse_address(raw: &str) -> Result<Felt, String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| "Address must start with 0x".to_string())?;

    if digits.is_empty() || digits.len() > 64 {
        return Err("Address must contain 1 to 64 hex characters".to_string());
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("Address must contain only hex characters".to_string());
    }

    Felt::from_hex(trimmed).map_err(|e| format!("Address is not a valid field element: {e}"))
}

/// Canonical textual form of an address (`0x` + 64 lowercase hex digits).
pub fn format_address(address: &Felt) -> String {
    address.to_fixed_hex_string()
}

/// Hex form of a field element as sent to the relay.
pub fn felt_to_hex(value: &Felt) -> String {
    value.to_hex_string()
}

/// Public projection of a token, returned in API responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenSummary {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

impl From<&TokenInfo> for TokenSummary {
    fn from(token: &TokenInfo) -> Self {
        Self {
            symbol: token.symbol.clone(),
            address: format_address(&token.address),
            decimals: token.decimals,
        }
    }
}
