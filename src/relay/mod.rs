// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gasless execution through a paymaster relay.

pub mod client;
pub mod response;
pub mod signature;

pub use client::{GasTokenOptions, PaymasterClient, RelayError};
pub use response::{classify, require_str_field, UpstreamResponse};
pub use signature::sign_typed_data;
