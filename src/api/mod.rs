// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::TokenSummary,
    error::ErrorBody,
    models::{
        ClaimAndSwapRequest, ClaimAndSwapResponse, ClaimRequest, CreateWalletRequest,
        DeployRequest, DepositRequest, GasOptions, PortfolioResponse, RedeemRequest, SwapRequest,
        TransactionResponse, TransferRequest, WalletResponse,
    },
    state::AppState,
};

pub mod actions;
pub mod health;
pub mod portfolio;
pub mod wallets;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wallets", post(wallets::create_wallet))
        .route("/wallets/{address}", get(wallets::get_wallet))
        .route("/wallets/{address}/deploy", post(actions::deploy))
        .route("/wallets/{address}/deposit", post(actions::deposit))
        .route("/wallets/{address}/redeem", post(actions::redeem))
        .route("/wallets/{address}/transfer", post(actions::transfer))
        .route("/wallets/{address}/claim", post(actions::claim))
        .route("/wallets/{address}/swap", post(actions::swap))
        .route(
            "/wallets/{address}/claim-and-swap",
            post(actions::claim_and_swap),
        )
        .route("/wallets/{address}/balances", get(portfolio::balances))
        .route("/wallets/{address}/positions", get(portfolio::positions))
        .route("/wallets/{address}/transfers", get(portfolio::transfers));

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        wallets::create_wallet,
        wallets::get_wallet,
        actions::deploy,
        actions::deposit,
        actions::redeem,
        actions::transfer,
        actions::claim,
        actions::swap,
        actions::claim_and_swap,
        portfolio::balances,
        portfolio::positions,
        portfolio::transfers
    ),
    components(
        schemas(
            CreateWalletRequest,
            WalletResponse,
            GasOptions,
            DeployRequest,
            DepositRequest,
            RedeemRequest,
            TransferRequest,
            ClaimRequest,
            SwapRequest,
            ClaimAndSwapRequest,
            TransactionResponse,
            ClaimAndSwapResponse,
            PortfolioResponse,
            TokenSummary,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Wallets", description = "Custodial wallet provisioning"),
        (name = "Actions", description = "Gasless transactions relayed through the paymaster"),
        (name = "Portfolio", description = "Indexer-backed balances, positions and transfers")
    )
)]
pub struct ApiDoc;
