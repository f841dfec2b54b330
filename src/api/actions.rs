// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gasless wallet actions.
//!
//! Each handler validates its body, resolves tokens and amounts against the
//! configured contracts, then hands one [`Operation`] to the relay pipeline.
//! Accounts that are not deployed yet are deployed in the same transaction.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use starknet_core::types::Felt;

use super::wallets::load_wallet;
use crate::{
    auth::ServiceAuth,
    blockchain::{
        felt_to_hex, format_address, normalize_amount, parse_address, FixedPointPair, Operation,
        TokenInfo, TokenSummary, ETH_TOKEN,
    },
    error::{ApiError, ErrorBody},
    models::{
        ClaimAndSwapRequest, ClaimAndSwapResponse, ClaimRequest, DeployRequest, DepositRequest,
        GasOptions, RedeemRequest, SwapRequest, TransactionResponse, TransferRequest,
    },
    pipeline::{Pipeline, PipelineError, RelayOutcome},
    relay::GasTokenOptions,
    state::AppState,
    store::WalletRecord,
};

// =============================================================================
// Request validation
// =============================================================================

fn parse_field_address(field: &str, raw: &str) -> Result<Felt, ApiError> {
    parse_address(raw).map_err(|e| ApiError::bad_request(format!("Invalid {field}: {e}")))
}

/// Parse a display amount; zero is rejected unless `allow_zero`.
fn parse_amount(
    field: &str,
    raw: &str,
    decimals: u8,
    allow_zero: bool,
) -> Result<FixedPointPair, ApiError> {
    let amount = normalize_amount(raw, decimals)
        .map_err(|e| ApiError::bad_request(format!("Invalid {field}: {e}")))?;
    if !allow_zero && amount.is_zero() {
        return Err(ApiError::bad_request(format!(
            "Invalid {field}: must be greater than zero"
        )));
    }
    Ok(amount)
}

fn parse_proof(proof: &[String]) -> Result<Vec<Felt>, ApiError> {
    proof
        .iter()
        .map(|element| {
            Felt::from_hex(element.trim())
                .map_err(|_| ApiError::bad_request(format!("Invalid proof element: {element}")))
        })
        .collect()
}

fn gas_token_options(options: &GasOptions) -> Result<GasTokenOptions, ApiError> {
    let gas_token_address = options
        .gas_token_address
        .as_deref()
        .map(|raw| parse_field_address("gas_token_address", raw))
        .transpose()?;

    let max_gas_token_amount = options
        .max_gas_token_amount
        .as_deref()
        .map(|raw| {
            let raw = raw.trim();
            let value = if raw.starts_with("0x") || raw.starts_with("0X") {
                Felt::from_hex(raw)
            } else {
                Felt::from_dec_str(raw)
            };
            value.map(|v| felt_to_hex(&v)).map_err(|_| {
                ApiError::bad_request(format!("Invalid max_gas_token_amount: {raw}"))
            })
        })
        .transpose()?;

    Ok(GasTokenOptions {
        gas_token_address,
        max_gas_token_amount,
    })
}

/// Resolve a token by symbol or address among the tokens this service knows.
fn resolve_token(state: &AppState, raw: &str) -> Result<TokenInfo, ApiError> {
    let contracts = &state.config.contracts;
    let known = [
        contracts.deposit_token.clone(),
        contracts.reward_token.clone(),
        ETH_TOKEN.info(),
    ];

    let raw = raw.trim();
    let found = if raw.starts_with("0x") || raw.starts_with("0X") {
        let address = parse_field_address("token", raw)?;
        known.into_iter().find(|token| token.address == address)
    } else {
        known
            .into_iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(raw))
    };

    found.ok_or_else(|| ApiError::bad_request(format!("Unsupported token: {raw}")))
}

// =============================================================================
// Pipeline glue
// =============================================================================

async fn relay(
    state: &AppState,
    wallet: WalletRecord,
    operation: Operation,
    gas: GasTokenOptions,
) -> Result<RelayOutcome, ApiError> {
    let address = wallet.address;
    let outcome = Pipeline::from_state(state)
        .execute(wallet, operation, gas)
        .await
        .map_err(|e| e.into_api_error(state.config.redact_upstream_errors))?;

    if outcome.deployed_account {
        state.store.write().await.mark_deployed(&address)?;
    }
    Ok(outcome)
}

fn moved(outcome: RelayOutcome, amount: &FixedPointPair, token: &TokenInfo) -> TransactionResponse {
    TransactionResponse {
        transaction_hash: outcome.transaction_hash,
        amount: Some(amount.to_display(token.decimals)),
        token: Some(TokenSummary::from(token)),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Deploy the wallet's account contract through the paymaster.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/deploy",
    tag = "Actions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    request_body = DeployRequest,
    responses(
        (status = 200, description = "Deployment submitted", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 409, description = "Account already deployed", body = ErrorBody),
        (status = 500, description = "Relay failure", body = ErrorBody),
        (status = 502, description = "Chain RPC failure", body = ErrorBody)
    )
)]
pub async fn deploy(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(request) = payload?;
    let gas = gas_token_options(&request.gas)?;
    let wallet = load_wallet(&state, &address).await?;
    let already_deployed = || {
        ApiError::conflict(format!(
            "Account {} is already deployed",
            format_address(&wallet.address)
        ))
    };

    if wallet.deployed {
        return Err(already_deployed());
    }

    let on_chain = state
        .chain
        .is_deployed(&wallet.address)
        .await
        .map_err(|e| PipelineError::from(e).into_api_error(state.config.redact_upstream_errors))?;
    if on_chain {
        state.store.write().await.mark_deployed(&wallet.address)?;
        return Err(already_deployed());
    }

    let outcome = Pipeline::from_state(&state)
        .deploy(wallet.clone(), gas)
        .await
        .map_err(|e| e.into_api_error(state.config.redact_upstream_errors))?;
    state.store.write().await.mark_deployed(&wallet.address)?;

    Ok(Json(TransactionResponse {
        transaction_hash: outcome.transaction_hash,
        amount: None,
        token: None,
    }))
}

/// Approve the vault and deposit the deposit token in one transaction.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/deposit",
    tag = "Actions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Deposit submitted", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 500, description = "Relay failure", body = ErrorBody)
    )
)]
pub async fn deposit(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(request) = payload?;
    let token = state.config.contracts.deposit_token.clone();
    let amount = parse_amount("amount", &request.amount, token.decimals, false)?;
    let gas = gas_token_options(&request.gas)?;
    let wallet = load_wallet(&state, &address).await?;

    let operation = Operation::ApproveAndDeposit {
        token: token.address,
        vault: state.config.contracts.vault,
        amount,
        receiver: wallet.address,
    };
    let outcome = relay(&state, wallet, operation, gas).await?;

    Ok(Json(moved(outcome, &amount, &token)))
}

/// Redeem vault shares for the underlying asset.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/redeem",
    tag = "Actions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    request_body = RedeemRequest,
    responses(
        (status = 200, description = "Redeem submitted", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 500, description = "Relay failure", body = ErrorBody)
    )
)]
pub async fn redeem(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
    payload: Result<Json<RedeemRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(request) = payload?;
    let decimals = state.config.contracts.deposit_token.decimals;
    let shares = parse_amount("shares", &request.shares, decimals, false)?;
    let receiver = request
        .receiver
        .as_deref()
        .map(|raw| parse_field_address("receiver", raw))
        .transpose()?;
    let gas = gas_token_options(&request.gas)?;
    let wallet = load_wallet(&state, &address).await?;

    let operation = Operation::Redeem {
        vault: state.config.contracts.vault,
        shares,
        receiver: receiver.unwrap_or(wallet.address),
        owner: wallet.address,
    };
    let outcome = relay(&state, wallet, operation, gas).await?;

    Ok(Json(TransactionResponse {
        transaction_hash: outcome.transaction_hash,
        amount: Some(shares.to_display(decimals)),
        token: None,
    }))
}

/// Transfer a supported token to another address.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/transfer",
    tag = "Actions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer submitted", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 500, description = "Relay failure", body = ErrorBody)
    )
)]
pub async fn transfer(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(request) = payload?;
    let token = resolve_token(&state, &request.token)?;
    let recipient = parse_field_address("recipient", &request.recipient)?;
    let amount = parse_amount("amount", &request.amount, token.decimals, false)?;
    let gas = gas_token_options(&request.gas)?;
    let wallet = load_wallet(&state, &address).await?;

    let operation = Operation::Transfer {
        token: token.address,
        recipient,
        amount,
    };
    let outcome = relay(&state, wallet, operation, gas).await?;

    Ok(Json(moved(outcome, &amount, &token)))
}

/// Claim rewards from the distributor.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/claim",
    tag = "Actions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Claim submitted", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 500, description = "Relay failure", body = ErrorBody)
    )
)]
pub async fn claim(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
    payload: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(request) = payload?;
    let token = state.config.contracts.reward_token.clone();
    let amount = parse_amount("amount", &request.amount, token.decimals, false)?;
    let proof = parse_proof(&request.proof)?;
    let gas = gas_token_options(&request.gas)?;
    let wallet = load_wallet(&state, &address).await?;

    let operation = Operation::Claim {
        distributor: state.config.contracts.rewards_distributor,
        amount,
        proof,
    };
    let outcome = relay(&state, wallet, operation, gas).await?;

    Ok(Json(moved(outcome, &amount, &token)))
}

/// Swap between two supported tokens through the router.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/swap",
    tag = "Actions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    request_body = SwapRequest,
    responses(
        (status = 200, description = "Swap submitted", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 500, description = "Relay failure", body = ErrorBody)
    )
)]
pub async fn swap(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
    payload: Result<Json<SwapRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(request) = payload?;
    let sell = resolve_token(&state, &request.sell_token)?;
    let buy = resolve_token(&state, &request.buy_token)?;
    if sell.address == buy.address {
        return Err(ApiError::bad_request("sell_token and buy_token must differ"));
    }
    let amount = parse_amount("amount", &request.amount, sell.decimals, false)?;
    let min_amount_out = parse_amount(
        "min_amount_out",
        request.min_amount_out.as_deref().unwrap_or("0"),
        buy.decimals,
        true,
    )?;
    let gas = gas_token_options(&request.gas)?;
    let wallet = load_wallet(&state, &address).await?;

    let operation = Operation::Swap {
        router: state.config.contracts.swap_router,
        sell_token: sell.address,
        buy_token: buy.address,
        amount,
        min_amount_out,
        recipient: wallet.address,
    };
    let outcome = relay(&state, wallet, operation, gas).await?;

    Ok(Json(moved(outcome, &amount, &sell)))
}

/// Claim rewards, wait for the claim to be final, then swap the claimed
/// amount into the deposit token.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/claim-and-swap",
    tag = "Actions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Account address")),
    request_body = ClaimAndSwapRequest,
    responses(
        (status = 200, description = "Claim and swap submitted", body = ClaimAndSwapResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found", body = ErrorBody),
        (status = 500, description = "Relay failure or claim reverted; includes claim_transaction_hash when the claim was submitted", body = ErrorBody),
        (status = 504, description = "Claim not final in time", body = ErrorBody)
    )
)]
pub async fn claim_and_swap(
    _auth: ServiceAuth,
    State(state): State<AppState>,
    Path(address): Path<String>,
    payload: Result<Json<ClaimAndSwapRequest>, JsonRejection>,
) -> Result<Json<ClaimAndSwapResponse>, ApiError> {
    let Json(request) = payload?;
    let contracts = &state.config.contracts;
    let reward = &contracts.reward_token;
    let amount = parse_amount("amount", &request.amount, reward.decimals, false)?;
    let min_amount_out = parse_amount(
        "min_amount_out",
        request.min_amount_out.as_deref().unwrap_or("0"),
        contracts.deposit_token.decimals,
        true,
    )?;
    let proof = parse_proof(&request.proof)?;
    let gas = gas_token_options(&request.gas)?;
    let wallet = load_wallet(&state, &address).await?;
    let wallet_address = wallet.address;

    let claim = Operation::Claim {
        distributor: contracts.rewards_distributor,
        amount,
        proof,
    };
    let swap = Operation::Swap {
        router: contracts.swap_router,
        sell_token: reward.address,
        buy_token: contracts.deposit_token.address,
        amount,
        min_amount_out,
        recipient: wallet_address,
    };

    let result = Pipeline::from_state(&state)
        .claim_and_swap(wallet, claim, swap, gas)
        .await;

    let claimed = match &result {
        Ok(outcome) => Some(&outcome.claim),
        Err(PipelineError::SwapFailed { claim, .. }) => Some(claim),
        Err(_) => None,
    };
    if claimed.is_some_and(|claim| claim.deployed_account) {
        state.store.write().await.mark_deployed(&wallet_address)?;
    }

    let outcome = result.map_err(|e| e.into_api_error(state.config.redact_upstream_errors))?;

    Ok(Json(ClaimAndSwapResponse {
        claim_transaction_hash: outcome.claim.transaction_hash,
        swap_transaction_hash: outcome.swap.transaction_hash,
        amount: amount.to_display(reward.decimals),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;
    use axum::http::StatusCode;

    fn state() -> AppState {
        test_state("http://127.0.0.1:9", "http://127.0.0.1:9", "http://127.0.0.1:9")
    }

    #[test]
    fn amounts_are_validated() {
        let pair = parse_amount("amount", "12.5", 6, false).unwrap();
        assert_eq!(pair, FixedPointPair { low: 12_500_000, high: 0 });

        let zero = parse_amount("amount", "0", 6, false).unwrap_err();
        assert_eq!(zero.status, StatusCode::BAD_REQUEST);
        assert!(parse_amount("min_amount_out", "0", 6, true).is_ok());

        let bad = parse_amount("amount", "1,5", 6, false).unwrap_err();
        assert!(bad.message.starts_with("Invalid amount"));
    }

    #[test]
    fn tokens_resolve_by_symbol_or_address() {
        let state = state();
        let deposit = &state.config.contracts.deposit_token;

        let by_symbol = resolve_token(&state, &deposit.symbol.to_lowercase()).unwrap();
        assert_eq!(by_symbol.address, deposit.address);

        let by_address = resolve_token(&state, &format_address(&deposit.address)).unwrap();
        assert_eq!(by_address.symbol, deposit.symbol);

        assert_eq!(resolve_token(&state, "eth").unwrap().decimals, 18);
        assert!(resolve_token(&state, "DOGE").is_err());
        assert!(resolve_token(&state, "0x1234").is_err());
    }

    #[test]
    fn gas_amount_accepts_decimal_and_hex() {
        let options = gas_token_options(&GasOptions {
            gas_token_address: Some("0x99".to_string()),
            max_gas_token_amount: Some("255".to_string()),
        })
        .unwrap();
        assert_eq!(options.gas_token_address, Some(Felt::from(0x99u64)));
        assert_eq!(options.max_gas_token_amount.as_deref(), Some("0xff"));

        let hex = gas_token_options(&GasOptions {
            gas_token_address: None,
            max_gas_token_amount: Some("0x1f4".to_string()),
        })
        .unwrap();
        assert_eq!(hex.max_gas_token_amount.as_deref(), Some("0x1f4"));

        assert!(gas_token_options(&GasOptions {
            gas_token_address: None,
            max_gas_token_amount: Some("lots".to_string()),
        })
        .is_err());
    }

    #[test]
    fn proof_elements_must_be_hex() {
        assert_eq!(
            parse_proof(&["0x1".to_string(), "0x2".to_string()]).unwrap(),
            vec![Felt::ONE, Felt::TWO]
        );
        assert!(parse_proof(&["zz".to_string()]).is_err());
    }
}
