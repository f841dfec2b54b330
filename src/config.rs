// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AppConfig`] struct that is built once at startup and injected into
//! [`AppState`](crate::state::AppState). Nothing reads the environment after
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SERVICE_API_SECRET` | Shared bearer token for `/v1` routes | Required |
//! | `PIN_ENCRYPTION_SECRET` | Server secret that encrypts user PINs | Required |
//! | `PAYMASTER_BASE_URL` | Paymaster relay base URL | `https://starknet.api.avnu.fi` |
//! | `PAYMASTER_API_KEY` | Paymaster `api-key` header | Optional |
//! | `STARKNET_RPC_URL` | Starknet JSON-RPC endpoint | Required |
//! | `INDEXER_BASE_URL` | Balance/position indexer base URL | Required |
//! | `ACCOUNT_CLASS_HASH` | Account class for new wallets | Argent 0.4.0 |
//! | `VAULT_ADDRESS` | Lending vault contract | Required |
//! | `REWARDS_DISTRIBUTOR_ADDRESS` | Rewards distributor contract | Required |
//! | `SWAP_ROUTER_ADDRESS` | Swap router contract | Required |
//! | `DEPOSIT_TOKEN_ADDRESS` | Vault asset token | USDC |
//! | `DEPOSIT_TOKEN_DECIMALS` | Vault asset decimals | `6` |
//! | `REWARD_TOKEN_ADDRESS` | Claimed reward token | STRK |
//! | `REWARD_TOKEN_DECIMALS` | Reward token decimals | `18` |
//! | `HTTP_TIMEOUT_SECS` | Timeout for every outbound HTTP call | `15` |
//! | `FINALITY_TIMEOUT_SECS` | Max wait for transaction finality | `120` |
//! | `FINALITY_POLL_INTERVAL_MS` | Receipt polling interval | `3000` |
//! | `REDACT_UPSTREAM_ERRORS` | Hide upstream error text from callers | `false` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files enabling HTTPS | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use starknet_core::types::Felt;

use crate::blockchain::{TokenInfo, ARGENT_ACCOUNT_CLASS_HASH, STRK_TOKEN, USDC_TOKEN};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const SERVICE_API_SECRET_ENV: &str = "SERVICE_API_SECRET";
pub const PIN_ENCRYPTION_SECRET_ENV: &str = "PIN_ENCRYPTION_SECRET";
pub const PAYMASTER_BASE_URL_ENV: &str = "PAYMASTER_BASE_URL";
pub const PAYMASTER_API_KEY_ENV: &str = "PAYMASTER_API_KEY";
pub const STARKNET_RPC_URL_ENV: &str = "STARKNET_RPC_URL";
pub const INDEXER_BASE_URL_ENV: &str = "INDEXER_BASE_URL";
pub const ACCOUNT_CLASS_HASH_ENV: &str = "ACCOUNT_CLASS_HASH";
pub const VAULT_ADDRESS_ENV: &str = "VAULT_ADDRESS";
pub const REWARDS_DISTRIBUTOR_ADDRESS_ENV: &str = "REWARDS_DISTRIBUTOR_ADDRESS";
pub const SWAP_ROUTER_ADDRESS_ENV: &str = "SWAP_ROUTER_ADDRESS";
pub const DEPOSIT_TOKEN_ADDRESS_ENV: &str = "DEPOSIT_TOKEN_ADDRESS";
pub const DEPOSIT_TOKEN_DECIMALS_ENV: &str = "DEPOSIT_TOKEN_DECIMALS";
pub const REWARD_TOKEN_ADDRESS_ENV: &str = "REWARD_TOKEN_ADDRESS";
pub const REWARD_TOKEN_DECIMALS_ENV: &str = "REWARD_TOKEN_DECIMALS";
pub const HTTP_TIMEOUT_SECS_ENV: &str = "HTTP_TIMEOUT_SECS";
pub const FINALITY_TIMEOUT_SECS_ENV: &str = "FINALITY_TIMEOUT_SECS";
pub const FINALITY_POLL_INTERVAL_MS_ENV: &str = "FINALITY_POLL_INTERVAL_MS";
pub const REDACT_UPSTREAM_ERRORS_ENV: &str = "REDACT_UPSTREAM_ERRORS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PAYMASTER_BASE_URL: &str = "https://starknet.api.avnu.fi";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_FINALITY_TIMEOUT_SECS: u64 = 120;
const DEFAULT_FINALITY_POLL_INTERVAL_MS: u64 = 3000;

/// Configuration errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Paymaster relay endpoint settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Contract addresses and token metadata used by the call builder.
#[derive(Debug, Clone)]
pub struct ContractAddresses {
    pub account_class_hash: Felt,
    pub vault: Felt,
    pub rewards_distributor: Felt,
    pub swap_router: Felt,
    pub deposit_token: TokenInfo,
    pub reward_token: TokenInfo,
}

/// Timeouts bounding every external interaction.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub http: Duration,
    pub finality: Duration,
    pub finality_poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            http: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            finality: Duration::from_secs(DEFAULT_FINALITY_TIMEOUT_SECS),
            finality_poll_interval: Duration::from_millis(DEFAULT_FINALITY_POLL_INTERVAL_MS),
        }
    }
}

/// Application configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret expected in `Authorization: Bearer <secret>`.
    pub service_api_secret: String,
    /// Server secret under which user PINs are encrypted.
    pub pin_encryption_secret: String,
    pub relay: RelayConfig,
    pub rpc_url: String,
    pub indexer_base_url: String,
    pub contracts: ContractAddresses,
    pub timeouts: Timeouts,
    /// Replace upstream error text with a generic message in responses.
    pub redact_upstream_errors: bool,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
}

impl AppConfig {
    /// Load the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = match get(PORT_ENV) {
            Some(raw) => parse_number(PORT_ENV, &raw)?,
            None => DEFAULT_PORT,
        };

        let usdc = USDC_TOKEN.info();
        let deposit_token = TokenInfo {
            address: match get(DEPOSIT_TOKEN_ADDRESS_ENV) {
                Some(raw) => parse_felt(DEPOSIT_TOKEN_ADDRESS_ENV, &raw)?,
                None => usdc.address,
            },
            decimals: match get(DEPOSIT_TOKEN_DECIMALS_ENV) {
                Some(raw) => parse_number(DEPOSIT_TOKEN_DECIMALS_ENV, &raw)?,
                None => usdc.decimals,
            },
            ..usdc
        };

        let strk = STRK_TOKEN.info();
        let reward_token = TokenInfo {
            address: match get(REWARD_TOKEN_ADDRESS_ENV) {
                Some(raw) => parse_felt(REWARD_TOKEN_ADDRESS_ENV, &raw)?,
                None => strk.address,
            },
            decimals: match get(REWARD_TOKEN_DECIMALS_ENV) {
                Some(raw) => parse_number(REWARD_TOKEN_DECIMALS_ENV, &raw)?,
                None => strk.decimals,
            },
            ..strk
        };

        let contracts = ContractAddresses {
            account_class_hash: match get(ACCOUNT_CLASS_HASH_ENV) {
                Some(raw) => parse_felt(ACCOUNT_CLASS_HASH_ENV, &raw)?,
                None => Felt::from_hex_unchecked(ARGENT_ACCOUNT_CLASS_HASH),
            },
            vault: parse_felt(VAULT_ADDRESS_ENV, &required(VAULT_ADDRESS_ENV)?)?,
            rewards_distributor: parse_felt(
                REWARDS_DISTRIBUTOR_ADDRESS_ENV,
                &required(REWARDS_DISTRIBUTOR_ADDRESS_ENV)?,
            )?,
            swap_router: parse_felt(SWAP_ROUTER_ADDRESS_ENV, &required(SWAP_ROUTER_ADDRESS_ENV)?)?,
            deposit_token,
            reward_token,
        };

        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            http: match get(HTTP_TIMEOUT_SECS_ENV) {
                Some(raw) => Duration::from_secs(parse_number(HTTP_TIMEOUT_SECS_ENV, &raw)?),
                None => defaults.http,
            },
            finality: match get(FINALITY_TIMEOUT_SECS_ENV) {
                Some(raw) => Duration::from_secs(parse_number(FINALITY_TIMEOUT_SECS_ENV, &raw)?),
                None => defaults.finality,
            },
            finality_poll_interval: match get(FINALITY_POLL_INTERVAL_MS_ENV) {
                Some(raw) => {
                    Duration::from_millis(parse_number(FINALITY_POLL_INTERVAL_MS_ENV, &raw)?)
                }
                None => defaults.finality_poll_interval,
            },
        };

        let redact_upstream_errors = match get(REDACT_UPSTREAM_ERRORS_ENV) {
            Some(raw) => parse_bool(REDACT_UPSTREAM_ERRORS_ENV, &raw)?,
            None => false,
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            service_api_secret: required(SERVICE_API_SECRET_ENV)?,
            pin_encryption_secret: required(PIN_ENCRYPTION_SECRET_ENV)?,
            relay: RelayConfig {
                base_url: get(PAYMASTER_BASE_URL_ENV)
                    .unwrap_or_else(|| DEFAULT_PAYMASTER_BASE_URL.to_string()),
                api_key: get(PAYMASTER_API_KEY_ENV),
            },
            rpc_url: parse_url(STARKNET_RPC_URL_ENV, required(STARKNET_RPC_URL_ENV)?)?,
            indexer_base_url: parse_url(INDEXER_BASE_URL_ENV, required(INDEXER_BASE_URL_ENV)?)?,
            contracts,
            timeouts,
            redact_upstream_errors,
            tls_cert_path: get(TLS_CERT_PATH_ENV),
            tls_key_path: get(TLS_KEY_PATH_ENV),
        })
    }

    /// Both TLS paths are configured.
    pub fn tls_enabled(&self) -> bool {
        self.tls_cert_path.is_some() && self.tls_key_path.is_some()
    }
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got `{other}`"),
        }),
    }
}

fn parse_felt(name: &'static str, raw: &str) -> Result<Felt, ConfigError> {
    Felt::from_hex(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_url(name: &'static str, raw: String) -> Result<String, ConfigError> {
    url::Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    Ok(raw.trim_end_matches('/').to_string())
}
