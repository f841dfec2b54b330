// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Starknet integration module.
//!
//! This module provides functionality for:
//! - Deriving account addresses and deployment payloads
//! - Converting decimal amounts to `u256` calldata
//! - Building contract call batches for wallet operations
//! - Signing typed-data hashes with Stark keys
//! - Polling the chain node for transaction finality

pub mod account;
pub mod amount;
pub mod calls;
pub mod client;
pub mod signing;
pub mod types;

pub use amount::{normalize_amount, AmountError, FixedPointPair};
pub use calls::{build_calls, CallDescriptor, Operation};
pub use client::{ChainClient, ChainError};
pub use signing::{SignatureShape, SigningError, StarkSigner};
pub use types::*;
