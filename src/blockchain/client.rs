// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Starknet JSON-RPC client for receipts and deployment checks.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use starknet_core::types::Felt;

use super::types::felt_to_hex;
use crate::config::Timeouts;

/// `TXN_HASH_NOT_FOUND` in the Starknet JSON-RPC spec.
const TXN_HASH_NOT_FOUND: i64 = 29;
/// `CONTRACT_NOT_FOUND` in the Starknet JSON-RPC spec.
const CONTRACT_NOT_FOUND: i64 = 20;

/// Errors that can occur while talking to the chain node.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Transaction {tx_hash} reverted: {reason}")]
    Reverted { tx_hash: String, reason: String },

    #[error("Transaction {tx_hash} not final after {waited:?}")]
    FinalityTimeout { tx_hash: String, waited: Duration },
}

/// Execution outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Not yet known to the node, or received but not accepted on L2.
    Pending,
    Accepted,
    Reverted(String),
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct ReceiptBody {
    execution_status: Option<String>,
    finality_status: Option<String>,
    revert_reason: Option<String>,
}

/// Minimal JSON-RPC client for a Starknet full node.
#[derive(Debug, Clone)]
pub struct ChainClient {
    http: reqwest::Client,
    rpc_url: String,
    finality_timeout: Duration,
    poll_interval: Duration,
}

impl ChainClient {
    pub fn new(rpc_url: impl Into<String>, timeouts: &Timeouts) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.http)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            finality_timeout: timeouts.finality,
            poll_interval: timeouts.finality_poll_interval,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChainError::Transport(format!("HTTP {status}: {text}")));
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;

        match (parsed.result, parsed.error) {
            (_, Some(error)) => Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(ChainError::InvalidResponse(
                "neither result nor error present".to_string(),
            )),
        }
    }

    /// Latest block number, used by the readiness check.
    pub async fn block_number(&self) -> Result<u64, ChainError> {
        let result = self.call("starknet_blockNumber", json!([])).await?;
        result
            .as_u64()
            .ok_or_else(|| ChainError::InvalidResponse(format!("unexpected block number {result}")))
    }

    /// Current status of a transaction.
    pub async fn transaction_status(&self, tx_hash: &str) -> Result<ReceiptStatus, ChainError> {
        let result = match self
            .call("starknet_getTransactionReceipt", json!([tx_hash]))
            .await
        {
            Ok(result) => result,
            Err(ChainError::Rpc {
                code: TXN_HASH_NOT_FOUND,
                ..
            }) => return Ok(ReceiptStatus::Pending),
            Err(e) => return Err(e),
        };

        let receipt: ReceiptBody = serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;

        if receipt.execution_status.as_deref() == Some("REVERTED") {
            return Ok(ReceiptStatus::Reverted(
                receipt
                    .revert_reason
                    .unwrap_or_else(|| "no revert reason".to_string()),
            ));
        }

        let accepted = matches!(
            receipt.finality_status.as_deref(),
            Some("ACCEPTED_ON_L2") | Some("ACCEPTED_ON_L1")
        );
        let succeeded = receipt.execution_status.as_deref() == Some("SUCCEEDED");

        Ok(if accepted && succeeded {
            ReceiptStatus::Accepted
        } else {
            ReceiptStatus::Pending
        })
    }

    /// Poll the receipt until the transaction is accepted, it reverts, or the
    /// finality timeout elapses. Transport failures and unreadable replies
    /// while polling count as "not final yet".
    pub async fn wait_for_finality(&self, tx_hash: &str) -> Result<(), ChainError> {
        match tokio::time::timeout(self.finality_timeout, self.poll_until_final(tx_hash)).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::FinalityTimeout {
                tx_hash: tx_hash.to_string(),
                waited: self.finality_timeout,
            }),
        }
    }

    async fn poll_until_final(&self, tx_hash: &str) -> Result<(), ChainError> {
        loop {
            match self.transaction_status(tx_hash).await {
                Ok(ReceiptStatus::Accepted) => return Ok(()),
                Ok(ReceiptStatus::Reverted(reason)) => {
                    return Err(ChainError::Reverted {
                        tx_hash: tx_hash.to_string(),
                        reason,
                    })
                }
                Ok(ReceiptStatus::Pending) => {
                    tracing::debug!(tx_hash, "Transaction not final yet");
                }
                Err(e @ (ChainError::Transport(_) | ChainError::InvalidResponse(_))) => {
                    tracing::warn!(tx_hash, error = %e, "Receipt lookup failed, retrying");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Whether a contract (account) is deployed at `address`.
    pub async fn is_deployed(&self, address: &Felt) -> Result<bool, ChainError> {
        match self
            .call(
                "starknet_getClassHashAt",
                json!(["latest", felt_to_hex(address)]),
            )
            .await
        {
            Ok(_) => Ok(true),
            Err(ChainError::Rpc {
                code: CONTRACT_NOT_FOUND,
                ..
            }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn timeouts(finality_ms: u64) -> Timeouts {
        Timeouts {
            http: Duration::from_secs(5),
            finality: Duration::from_millis(finality_ms),
            finality_poll_interval: Duration::from_millis(20),
        }
    }

    async fn mock_rpc(server: &MockServer, rpc_method: &str, body: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn accepted_receipt_completes() {
        let server = MockServer::start().await;
        mock_rpc(
            &server,
            "starknet_getTransactionReceipt",
            json!({"jsonrpc": "2.0", "id": 1, "result": {
                "execution_status": "SUCCEEDED",
                "finality_status": "ACCEPTED_ON_L2"
            }}),
        )
        .await;

        let client = ChainClient::new(server.uri(), &timeouts(1000)).unwrap();
        client.wait_for_finality("0xabc").await.unwrap();
    }

    #[tokio::test]
    async fn reverted_receipt_fails_with_reason() {
        let server = MockServer::start().await;
        mock_rpc(
            &server,
            "starknet_getTransactionReceipt",
            json!({"jsonrpc": "2.0", "id": 1, "result": {
                "execution_status": "REVERTED",
                "finality_status": "ACCEPTED_ON_L2",
                "revert_reason": "insufficient balance"
            }}),
        )
        .await;

        let client = ChainClient::new(server.uri(), &timeouts(1000)).unwrap();
        let err = client.wait_for_finality("0xabc").await.unwrap_err();
        assert!(matches!(err, ChainError::Reverted { ref reason, .. } if reason == "insufficient balance"));
    }

    #[tokio::test]
    async fn unknown_transaction_times_out() {
        let server = MockServer::start().await;
        mock_rpc(
            &server,
            "starknet_getTransactionReceipt",
            json!({"jsonrpc": "2.0", "id": 1, "error": {
                "code": 29,
                "message": "Transaction hash not found"
            }}),
        )
        .await;

        let client = ChainClient::new(server.uri(), &timeouts(150)).unwrap();
        let err = client.wait_for_finality("0xabc").await.unwrap_err();
        assert!(matches!(err, ChainError::FinalityTimeout { .. }));
    }

    #[tokio::test]
    async fn transient_rpc_failure_keeps_polling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "starknet_getTransactionReceipt"})))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        mock_rpc(
            &server,
            "starknet_getTransactionReceipt",
            json!({"jsonrpc": "2.0", "id": 1, "result": {
                "execution_status": "SUCCEEDED",
                "finality_status": "ACCEPTED_ON_L2"
            }}),
        )
        .await;

        let client = ChainClient::new(server.uri(), &timeouts(1000)).unwrap();
        client.wait_for_finality("0xabc").await.unwrap();
    }

    #[tokio::test]
    async fn persistent_rpc_failure_ends_in_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ChainClient::new(server.uri(), &timeouts(150)).unwrap();
        let err = client.wait_for_finality("0xabc").await.unwrap_err();
        assert!(matches!(err, ChainError::FinalityTimeout { .. }));
    }

    #[tokio::test]
    async fn received_but_not_accepted_is_pending() {
        let server = MockServer::start().await;
        mock_rpc(
            &server,
            "starknet_getTransactionReceipt",
            json!({"jsonrpc": "2.0", "id": 1, "result": {
                "execution_status": "SUCCEEDED",
                "finality_status": "RECEIVED"
            }}),
        )
        .await;

        let client = ChainClient::new(server.uri(), &timeouts(1000)).unwrap();
        assert_eq!(
            client.transaction_status("0xabc").await.unwrap(),
            ReceiptStatus::Pending
        );
    }

    #[tokio::test]
    async fn deployment_check() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "starknet_getClassHashAt",
                "params": ["latest", "0x1"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"jsonrpc": "2.0", "id": 1, "result": "0x99"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "starknet_getClassHashAt",
                "params": ["latest", "0x2"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"jsonrpc": "2.0", "id": 1, "error": {"code": 20, "message": "Contract not found"}}),
            ))
            .mount(&server)
            .await;

        let client = ChainClient::new(server.uri(), &timeouts(1000)).unwrap();
        assert!(client.is_deployed(&Felt::ONE).await.unwrap());
        assert!(!client.is_deployed(&Felt::TWO).await.unwrap());
    }

    #[tokio::test]
    async fn http_failure_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = ChainClient::new(server.uri(), &timeouts(1000)).unwrap();
        assert!(matches!(
            client.block_number().await,
            Err(ChainError::Transport(_))
        ));
    }
}
