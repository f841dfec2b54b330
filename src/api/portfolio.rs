// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only portfolio endpoints backed by the indexer.

use axum::{
    extract::{Path, State},
    Json,
};

use super::wallets::load_wallet;
use crate::{
    auth::ServiceAuth,
    blockchain::format_address,
    error::{ApiError, ErrorBody},
    indexer::{IndexerError, IndexerQuery},
    models::PortfolioResponse,
    state::AppState,
};

/// Transport errors carry the indexer URL, so both variants are redacted.
fn indexer_error(error: IndexerError, redact: bool) -> ApiError {
    if redact {
        return ApiError::bad_gateway("Indexer request failed");
    }
    ApiError::bad_gateway(error.to_string())
}

async fn query(
    state: &AppState,
    address: &str,
    kind: IndexerQuery,
) -> Result<Json<PortfolioResponse>, ApiError> {
    let wallet = load_wallet(state, address).await?;
    let data = state
        .indexer
        .fetch(kind, &wallet.address)
        .await
        .map_err(|e| {
            tracing::warn!(wallet = %format_address(&wallet.address), error = %e, "Indexer query failed");
            indexer_error(e, state.config.redact_upstream_errors)
        })?;

    Ok(Json(PortfolioResponse {
        address: format_address(&wallet.address),
        data,
    }))
}

/// Token balances of a wallet.
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/balances",
    tag = "Portfolio",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    responses(
        (status = 200, description = "Balances", body = PortfolioResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 502, description = "Indexer failure", body = ErrorBody)
    )
)]
pub async fn balances(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PortfolioResponse>, ApiError> {
    query(&state, &address, IndexerQuery::Balances).await
}

/// Lending positions of a wallet.
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/positions",
    tag = "Portfolio",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    responses(
        (status = 200, description = "Positions", body = PortfolioResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 502, description = "Indexer failure", body = ErrorBody)
    )
)]
pub async fn positions(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PortfolioResponse>, ApiError> {
    query(&state, &address, IndexerQuery::Positions).await
}

/// Token transfers involving a wallet.
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/transfers",
    tag = "Portfolio",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    responses(
        (status = 200, description = "Transfers", body = PortfolioResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 502, description = "Indexer failure", body = ErrorBody)
    )
)]
pub async fn transfers(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PortfolioResponse>, ApiError> {
    query(&state, &address, IndexerQuery::Transfers).await
}
