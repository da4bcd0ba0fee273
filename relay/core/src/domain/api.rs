// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Outline API Envelope & Error Taxonomy
//!
//! Every Outline RPC endpoint answers with the same JSON wrapper
//! ([`ApiEnvelope`]). Failures are reduced to a single [`ApiError`] carrying an
//! [`ApiErrorKind`] so callers can tell "back off and try again" apart from
//! everything else without inspecting HTTP details.
//!
//! | Kind | Raised for |
//! |------|------------|
//! | `RateLimited` | final status 429 |
//! | `UpstreamError` | 5xx after retries, other 4xx, transport failure, malformed body |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Pagination block attached to list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Authorization policy returned alongside a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    /// Ability name to either a flag or a list of scoped grants.
    #[serde(default)]
    pub abilities: HashMap<String, serde_json::Value>,
}

/// Standard response wrapper used by every Outline endpoint.
///
/// Only `data` is interpreted per endpoint; the remaining fields carry
/// success/failure signalling and paging metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<Policy>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl<T> ApiEnvelope<T> {
    /// Whether the upstream flagged the operation as successful.
    ///
    /// Delete-style endpoints signal success through either `ok` or
    /// `success` instead of a payload.
    pub fn succeeded(&self) -> bool {
        self.ok == Some(true) || self.success == Some(true)
    }
}

/// List payload with its paging metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<Policy>>,
}

impl<T> From<ApiEnvelope<Vec<T>>> for ListResponse<T> {
    fn from(envelope: ApiEnvelope<Vec<T>>) -> Self {
        Self {
            data: envelope.data.unwrap_or_default(),
            pagination: envelope.pagination,
            policies: envelope.policies,
        }
    }
}

/// Result of a request issued without following redirects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    pub status: u16,
    /// Value of the `Location` header, if the upstream sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Classification of a failed upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorKind {
    RateLimited,
    UpstreamError,
}

impl ApiErrorKind {
    /// 429 is the only status reported as rate limiting.
    pub fn from_status(status: u16) -> Self {
        if status == 429 {
            Self::RateLimited
        } else {
            Self::UpstreamError
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited => "RATE_LIMITED",
            Self::UpstreamError => "UPSTREAM_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Failure returned by every `OutlineClient` operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}", code = .kind.code())]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// Final HTTP (or envelope) status; 503 for transport failures, 502 for
    /// unusable bodies.
    pub status: u16,
    pub message: String,
}

impl ApiError {
    /// Build an error whose kind is derived from `status`.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            status,
            message: message.into(),
        }
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::UpstreamError,
            status,
            message: message.into(),
        }
    }

    /// Transport failure that survived the retry budget.
    pub fn transport(endpoint: &str, reason: impl fmt::Display) -> Self {
        Self::upstream(
            503,
            format!("Failed to call Outline API endpoint \"{endpoint}\": {reason}"),
        )
    }

    /// Body was not a JSON object (or did not match the expected shape).
    pub fn invalid_response() -> Self {
        Self::upstream(502, "Invalid JSON response from Outline API")
    }

    /// Successful envelope without the payload the operation requires.
    pub fn missing_payload(what: &str) -> Self {
        Self::upstream(502, format!("Outline API response missing {what} payload"))
    }

    /// Whether retrying later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        self.kind == ApiErrorKind::RateLimited || self.status >= 500
    }
}

/// Statuses that are retried within the client's budget.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}
