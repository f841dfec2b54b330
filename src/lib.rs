// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gasless Wallet Server - Custodial Starknet Wallet Relay Service
//!
//! Holds account keys encrypted under user PINs and relays contract calls
//! through a paymaster, so wallets never need to hold gas.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Shared bearer token authentication
//! - `blockchain` - Starknet calls, amounts, signing and chain RPC
//! - `crypto` - PIN and private key encryption
//! - `indexer` - Portfolio queries against the indexer
//! - `pipeline` - Unlock, build, sign and execute relay cycles
//! - `relay` - Paymaster client and response validation
//! - `store` - In-memory credential store

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod indexer;
pub mod models;
pub mod pipeline;
pub mod relay;
pub mod state;
pub mod store;
