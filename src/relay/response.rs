// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Classification of upstream HTTP responses.
//!
//! Shared by the paymaster and indexer clients so that every call site checks
//! status codes and required fields the same way.

use reqwest::StatusCode;
use serde_json::Value;

/// Outcome of an upstream call, after status and body inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamResponse {
    Success(Value),
    ClientError { status: u16, message: String },
    ServerError { status: u16, message: String },
    MalformedResponse(String),
}

impl UpstreamResponse {
    /// Convert into a `Result`, keeping the upstream text as the error.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            UpstreamResponse::Success(value) => Ok(value),
            UpstreamResponse::ClientError { status, message }
            | UpstreamResponse::ServerError { status, message } => {
                Err(format!("HTTP {status}: {message}"))
            }
            UpstreamResponse::MalformedResponse(detail) => {
                Err(format!("Malformed response: {detail}"))
            }
        }
    }
}

/// Classify a response by status code and body.
pub fn classify(status: StatusCode, body: &str) -> UpstreamResponse {
    if status.is_success() {
        return match serde_json::from_str::<Value>(body) {
            Ok(value) => UpstreamResponse::Success(value),
            Err(e) => UpstreamResponse::MalformedResponse(format!("invalid JSON: {e}")),
        };
    }

    let message = error_message(body);
    if status.is_client_error() {
        UpstreamResponse::ClientError {
            status: status.as_u16(),
            message,
        }
    } else {
        UpstreamResponse::ServerError {
            status: status.as_u16(),
            message,
        }
    }
}

/// Extract a human-readable error from an upstream body.
///
/// Looks at `message`, `error`, `revertError` (and the first entry of
/// `messages`) before falling back to the raw text.
pub fn error_message(body: &str) -> String {
    let fallback = || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "empty response body".to_string()
        } else {
            trimmed.to_string()
        }
    };

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    for field in ["message", "error", "revertError"] {
        if let Some(text) = value.get(field).and_then(Value::as_str) {
            return text.to_string();
        }
    }
    if let Some(text) = value
        .get("messages")
        .and_then(Value::as_array)
        .and_then(|messages| messages.first())
        .and_then(Value::as_str)
    {
        return text.to_string();
    }

    fallback()
}

/// Fetch a required, non-empty string field from a successful response.
pub fn require_str_field<'a>(value: &'a Value, field: &str) -> Result<&'a str, UpstreamResponse> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            UpstreamResponse::MalformedResponse(format!("missing required field `{field}`"))
        })
}
