// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the shared service token.
//!
//! Put `ServiceAuth` first in a handler's argument list so the bearer check
//! runs before the body is parsed:
//!
//! ```rust,ignore
//! async fn my_handler(_auth: ServiceAuth, State(state): State<AppState>) -> impl IntoResponse {
//!     // caller presented the service secret
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;

use super::AuthError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Constant-time check of presented bearer tokens.
///
/// Both the configured secret and the presented token are tagged with
/// HMAC-SHA256 under a per-process random key; tags are compared with
/// `verify_slice`, so timing reveals neither the secret nor its length.
pub struct BearerVerifier {
    key: [u8; 32],
    expected: Vec<u8>,
}

impl std::fmt::Debug for BearerVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerVerifier").finish_non_exhaustive()
    }
}

impl BearerVerifier {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        let mut key = [0u8; 32];
        SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| AuthError::InternalError("random key generation failed".to_string()))?;

        let expected = tag(&key, secret.as_bytes())?.finalize().into_bytes().to_vec();
        Ok(Self { key, expected })
    }

    pub fn verify(&self, token: &str) -> bool {
        match tag(&self.key, token.as_bytes()) {
            Ok(mac) => mac.verify_slice(&self.expected).is_ok(),
            Err(_) => false,
        }
    }
}

fn tag(key: &[u8], message: &[u8]) -> Result<HmacSha256, AuthError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
    mac.update(message);
    Ok(mac)
}

/// Extractor proving the caller holds the service secret.
pub struct ServiceAuth;

impl FromRequestParts<AppState> for ServiceAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        if !state.bearer.verify(token.trim()) {
            tracing::warn!(path = %parts.uri.path(), "Rejected request with invalid service token");
            return Err(AuthError::InvalidToken);
        }

        Ok(ServiceAuth)
    }
}
