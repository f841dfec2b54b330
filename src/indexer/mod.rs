// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Indexer Proxy
//!
//! Read-only queries against the external balance/position indexer.
//!
//! The indexer reports amounts as `{ "value": "<raw integer>", "decimals": n }`
//! objects. Responses are passed through unchanged except that every such
//! object is replaced by its human-readable float.

use serde_json::{Map, Value};
use starknet_core::types::Felt;

use crate::blockchain::amount::fixed_point_to_f64;
use crate::blockchain::format_address;
use crate::config::Timeouts;
use crate::relay::response::classify;

/// Indexer resources exposed through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexerQuery {
    Balances,
    Positions,
    Transfers,
}

impl IndexerQuery {
    fn path(self) -> &'static str {
        match self {
            IndexerQuery::Balances => "/balances",
            IndexerQuery::Positions => "/positions",
            IndexerQuery::Transfers => "/transfers",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("Indexer request failed: {0}")]
    Transport(String),

    #[error("Indexer error: {0}")]
    Upstream(String),
}

/// HTTP client for the indexer.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    base_url: String,
}

impl IndexerClient {
    pub fn new(base_url: impl Into<String>, timeouts: &Timeouts) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeouts.http).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one resource for a wallet, with amounts converted to floats.
    pub async fn fetch(&self, query: IndexerQuery, wallet: &Felt) -> Result<Value, IndexerError> {
        let url = format!("{}{}", self.base_url, query.path());
        let response = self
            .http
            .get(&url)
            .query(&[("walletAddress", format_address(wallet))])
            .send()
            .await
            .map_err(|e| IndexerError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IndexerError::Transport(e.to_string()))?;

        let value = classify(status, &body)
            .into_result()
            .map_err(IndexerError::Upstream)?;

        Ok(convert_amounts(value))
    }
}

/// Replace every `{value, decimals}` amount object with its float value.
pub fn convert_amounts(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(convert_amounts).collect()),
        Value::Object(map) => match as_amount(&map) {
            Some(amount) => amount,
            None => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, convert_amounts(value)))
                    .collect(),
            ),
        },
        other => other,
    }
}

fn as_amount(map: &Map<String, Value>) -> Option<Value> {
    if map.len() != 2 {
        return None;
    }
    let raw = match map.get("value")? {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    let decimals = u8::try_from(map.get("decimals")?.as_u64()?).ok()?;

    let amount = fixed_point_to_f64(&raw, decimals).ok()?;
    serde_json::Number::from_f64(amount).map(Value::Number)
}
