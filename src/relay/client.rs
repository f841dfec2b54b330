// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Paymaster HTTP client.
//!
//! Two endpoints make up one gasless execution:
//!
//! 1. `POST /paymaster/v1/build-typed-data` turns a call batch into SNIP-12
//!    typed data that the account owner must sign.
//! 2. `POST /paymaster/v1/execute` submits the typed data with its signature
//!    and returns the transaction hash.
//!
//! Neither call is retried.

use serde::Serialize;
use serde_json::Value;
use starknet_core::types::Felt;

use super::response::{classify, require_str_field, UpstreamResponse};
use crate::blockchain::account::DeploymentData;
use crate::blockchain::{felt_to_hex, CallDescriptor};
use crate::config::{RelayConfig, Timeouts};

const BUILD_TYPED_DATA_PATH: &str = "/paymaster/v1/build-typed-data";
const EXECUTE_PATH: &str = "/paymaster/v1/execute";
const API_KEY_HEADER: &str = "api-key";

/// Errors from a relay cycle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RelayError {
    #[error("Paymaster rejected typed data build: {0}")]
    UpstreamBuild(String),

    #[error("Paymaster rejected execution: {0}")]
    UpstreamExecute(String),

    #[error("Paymaster response did not include a transaction hash")]
    MissingHash,

    #[error("Invalid typed data: {0}")]
    InvalidTypedData(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Optional gas token settings forwarded to the paymaster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GasTokenOptions {
    pub gas_token_address: Option<Felt>,
    /// Upper bound in gas token base units, as a `0x` hex string.
    pub max_gas_token_amount: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildTypedDataBody<'a> {
    user_address: String,
    calls: &'a [CallDescriptor],
    account_class_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_token_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_gas_token_amount: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteBody<'a> {
    user_address: String,
    typed_data: String,
    signature: &'a [String],
    deployment_data: Option<&'a DeploymentData>,
}

/// Client for a paymaster relay.
#[derive(Debug, Clone)]
pub struct PaymasterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PaymasterClient {
    pub fn new(config: &RelayConfig, timeouts: &Timeouts) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeouts.http).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<UpstreamResponse, String> {
        let mut request = self.http.post(format!("{}{}", self.base_url, path)).json(body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        Ok(classify(status, &text))
    }

    /// Ask the paymaster for the typed data covering `calls`.
    ///
    /// `account_class_hash` is only set when the account is being deployed in
    /// the same transaction.
    pub async fn build_typed_data(
        &self,
        user_address: &Felt,
        calls: &[CallDescriptor],
        account_class_hash: Option<&Felt>,
        gas: &GasTokenOptions,
    ) -> Result<Value, RelayError> {
        let body = BuildTypedDataBody {
            user_address: felt_to_hex(user_address),
            calls,
            account_class_hash: account_class_hash.map(felt_to_hex),
            gas_token_address: gas.gas_token_address.as_ref().map(felt_to_hex),
            max_gas_token_amount: gas.max_gas_token_amount.as_deref(),
        };

        let typed_data = self
            .post(BUILD_TYPED_DATA_PATH, &body)
            .await
            .map_err(RelayError::UpstreamBuild)?
            .into_result()
            .map_err(RelayError::UpstreamBuild)?;

        require_str_field(&typed_data, "primaryType")
            .map_err(|e| RelayError::UpstreamBuild(describe(e)))?;

        Ok(typed_data)
    }

    /// Submit signed typed data. Returns the transaction hash.
    pub async fn execute(
        &self,
        user_address: &Felt,
        typed_data: &Value,
        signature: &[String],
        deployment_data: Option<&DeploymentData>,
    ) -> Result<String, RelayError> {
        let body = ExecuteBody {
            user_address: felt_to_hex(user_address),
            typed_data: typed_data.to_string(),
            signature,
            deployment_data,
        };

        let response = self
            .post(EXECUTE_PATH, &body)
            .await
            .map_err(RelayError::UpstreamExecute)?;

        // A 2xx the hash cannot be read from is still a missing hash.
        if let UpstreamResponse::MalformedResponse(detail) = &response {
            tracing::warn!(detail = %detail, "Paymaster execute returned an unreadable body");
            return Err(RelayError::MissingHash);
        }
        let result = response.into_result().map_err(RelayError::UpstreamExecute)?;

        require_str_field(&result, "transactionHash")
            .map(str::to_string)
            .map_err(|_| RelayError::MissingHash)
    }
}

fn describe(response: UpstreamResponse) -> String {
    match response.into_result() {
        Ok(_) => "unexpected success".to_string(),
        Err(message) => message,
    }
}
