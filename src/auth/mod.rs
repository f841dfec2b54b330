// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Every `/v1` route is reserved for the trusted backend that fronts this
//! service. It authenticates with a single shared secret:
//!
//! ```text
//! Authorization: Bearer <SERVICE_API_SECRET>
//! ```
//!
//! ## Security
//!
//! - The token is compared in constant time (HMAC tag verification)
//! - A rejected token never reaches credential decryption or the relay
//! - Health and docs endpoints are public

pub mod error;
pub mod extractor;

pub use error::AuthError;
pub use extractor::{BearerVerifier, ServiceAuth};
