// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet management API endpoints.
//!
//! Provisioning generates the account key server-side and returns only the
//! public record. The PIN supplied here is the only time it crosses the API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use starknet_core::types::Felt;

use crate::{
    auth::ServiceAuth,
    blockchain::{format_address, parse_address},
    error::{ApiError, ErrorBody},
    models::{CreateWalletRequest, WalletResponse},
    pipeline::provision_wallet,
    state::AppState,
    store::WalletRecord,
};

const MIN_PIN_LENGTH: usize = 4;
const MAX_PIN_LENGTH: usize = 128;

impl From<&WalletRecord> for WalletResponse {
    fn from(record: &WalletRecord) -> Self {
        Self {
            address: format_address(&record.address),
            public_key: format_address(&record.public_key),
            deployed: record.deployed,
            created_at: record.created_at,
        }
    }
}

/// Parse the `{address}` path segment.
pub(crate) fn parse_wallet_address(raw: &str) -> Result<Felt, ApiError> {
    parse_address(raw).map_err(|e| ApiError::bad_request(format!("Invalid wallet address: {e}")))
}

/// Look up a wallet by its path segment.
pub(crate) async fn load_wallet(state: &AppState, raw: &str) -> Result<WalletRecord, ApiError> {
    let address = parse_wallet_address(raw)?;
    state.store.read().await.get(&address)
}

fn validate_pin(pin: &str) -> Result<(), ApiError> {
    let length = pin.chars().count();
    if length < MIN_PIN_LENGTH {
        return Err(ApiError::bad_request(format!(
            "PIN must be at least {MIN_PIN_LENGTH} characters"
        )));
    }
    if length > MAX_PIN_LENGTH {
        return Err(ApiError::bad_request(format!(
            "PIN must be at most {MAX_PIN_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Provision a new custodial wallet.
///
/// Generates a Stark key pair, derives the counterfactual account address and
/// stores the key encrypted under the PIN. The account is deployed lazily by
/// the first action or explicitly through `/deploy`.
#[utoipa::path(
    post,
    path = "/v1/wallets",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet created", body = WalletResponse),
        (status = 400, description = "Invalid PIN", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_wallet(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    payload: Result<Json<CreateWalletRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let Json(request) = payload?;
    validate_pin(&request.pin)?;

    let secret = state.config.pin_encryption_secret.clone();
    let class_hash = state.config.contracts.account_class_hash;
    let record = tokio::task::spawn_blocking(move || {
        provision_wallet(&request.pin, &secret, class_hash)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Wallet provisioning task failed: {e}")))?
    .map_err(|e| {
        tracing::error!(error = %e, "Wallet provisioning failed");
        ApiError::internal("Failed to provision wallet")
    })?;

    let response = WalletResponse::from(&record);
    state.store.write().await.insert(record)?;

    tracing::info!(wallet = %response.address, "Wallet provisioned");

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get the public record of a wallet.
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(
        ("address" = String, Path, description = "Account address")
    ),
    responses(
        (status = 200, description = "Wallet details", body = WalletResponse),
        (status = 400, description = "Malformed address", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody)
    )
)]
pub async fn get_wallet(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<WalletResponse>, ApiError> {
    let record = load_wallet(&state, &address).await?;
    Ok(Json(WalletResponse::from(&record)))
}
