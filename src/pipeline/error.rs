// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pipeline failures and their HTTP mapping.

use super::RelayOutcome;
use crate::blockchain::ChainError;
use crate::crypto::CredentialError;
use crate::error::ApiError;
use crate::relay::RelayError;

const REDACTED_UPSTREAM: &str = "Upstream service rejected the request";

/// Step of a relay cycle, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unlock,
    BuildTypedData,
    Sign,
    Execute,
    AwaitFinality,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Unlock => "unlock",
            Stage::BuildTypedData => "build_typed_data",
            Stage::Sign => "sign",
            Stage::Execute => "execute",
            Stage::AwaitFinality => "await_finality",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The claim was submitted but the swap that follows it failed.
    #[error("Swap failed after claim {}: {source}", .claim.transaction_hash)]
    SwapFailed {
        claim: RelayOutcome,
        source: Box<PipelineError>,
    },

    #[error("Request cancelled before {0}")]
    Cancelled(Stage),

    #[error("Pipeline task failed: {0}")]
    TaskFailed(String),
}

impl PipelineError {
    /// Map to an HTTP error. With `redact` set, upstream text is replaced by
    /// a generic message.
    pub fn into_api_error(self, redact: bool) -> ApiError {
        let upstream = |message: String| {
            if redact {
                REDACTED_UPSTREAM.to_string()
            } else {
                message
            }
        };

        match self {
            PipelineError::Credential(_) => ApiError::internal("Failed to unlock wallet credentials"),
            PipelineError::Relay(RelayError::MissingHash) => {
                ApiError::internal(RelayError::MissingHash.to_string())
            }
            PipelineError::Relay(RelayError::Signing(_)) => {
                ApiError::internal("Failed to sign transaction")
            }
            PipelineError::Relay(e) => ApiError::internal(upstream(e.to_string())),
            PipelineError::Chain(e @ ChainError::Reverted { .. }) => {
                ApiError::internal(upstream(e.to_string()))
            }
            PipelineError::Chain(e @ ChainError::FinalityTimeout { .. }) => {
                ApiError::gateway_timeout(e.to_string())
            }
            PipelineError::Chain(e) => ApiError::bad_gateway(upstream(e.to_string())),
            PipelineError::SwapFailed { claim, source } => {
                let inner = (*source).into_api_error(redact);
                ApiError::new(
                    inner.status,
                    format!("Claim submitted but swap failed: {}", inner.message),
                )
                .with_claim_transaction_hash(claim.transaction_hash)
            }
            PipelineError::Cancelled(_) | PipelineError::TaskFailed(_) => {
                ApiError::internal("Request could not be completed")
            }
        }
    }
}
