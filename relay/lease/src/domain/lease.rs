// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Lease Domain
//!
//! A [`LeaseRecord`] grants one agent exclusive (advisory) edit rights on one
//! document until `expires_at`. At most one live record exists per document
//! per backend. A record is live while `now < expires_at`; expired records
//! are indistinguishable from absent ones.
//!
//! | Operation | Precondition | Effect |
//! |-----------|--------------|--------|
//! | acquire | no live lease, or held by the same agent | new token, new expiry |
//! | renew | live lease with matching token | expiry pushed to now + TTL |
//! | release | live lease with matching token | record removed |
//! | get_active | none | live record or nothing |

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use docrelay_core::domain::api::ApiError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use docrelay_core::domain::config::LeaseBackend;

pub const NO_ACTIVE_LEASE: &str = "no active lease found";
pub const TOKEN_MISMATCH: &str = "lease token does not match active lease";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseRecord {
    pub document_id: String,
    pub agent_id: String,
    /// Random UUID v4, issued on every acquire
    pub lease_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub backend: LeaseBackend,
}

impl LeaseRecord {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_held_by(&self, agent_id: &str) -> bool {
        self.agent_id == agent_id
    }
}

/// `now + ttl_seconds`, rejecting TTLs chrono cannot represent.
pub fn expiry_after(now: DateTime<Utc>, ttl_seconds: i64) -> Result<DateTime<Utc>, LeaseError> {
    TimeDelta::try_seconds(ttl_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| LeaseError::Validation("ttlSeconds is out of range".to_string()))
}

pub fn new_lease_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireLeaseInput {
    pub document_id: String,
    pub agent_id: String,
    pub ttl_seconds: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewLeaseInput {
    pub document_id: String,
    pub lease_token: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLeaseInput {
    pub document_id: String,
    pub lease_token: String,
}

#[derive(Debug, Clone, Error)]
pub enum LeaseError {
    #[error("LEASE_CONFLICT: document is already leased by another agent")]
    Conflict { existing: Box<LeaseRecord> },

    #[error("LEASE_NOT_FOUND: {0}")]
    NotFound(String),

    #[error("INVALID_INPUT: {0}")]
    Validation(String),

    /// Reading or writing the backing document failed
    #[error(transparent)]
    Upstream(#[from] ApiError),

    #[error("LEASE_ENCODING: {0}")]
    Encoding(String),
}

impl LeaseError {
    pub fn no_active_lease() -> Self {
        Self::NotFound(NO_ACTIVE_LEASE.to_string())
    }

    pub fn token_mismatch() -> Self {
        Self::NotFound(TOKEN_MISMATCH.to_string())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => "LEASE_CONFLICT",
            Self::NotFound(_) => "LEASE_NOT_FOUND",
            Self::Validation(_) => "INVALID_INPUT",
            Self::Upstream(err) => err.kind.code(),
            Self::Encoding(_) => "LEASE_ENCODING",
        }
    }

    /// True only for upstream rate limiting and 5xx failures.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Upstream(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Structured form used when reporting a conflict to a caller.
    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            Self::Conflict { existing } => serde_json::json!({
                "ok": false,
                "error": self.code(),
                "message": self.to_string(),
                "existingLease": existing,
            }),
            _ => serde_json::json!({
                "ok": false,
                "error": self.code(),
                "message": self.to_string(),
            }),
        }
    }
}

/// Storage contract shared by every lease backend.
///
/// Implementations own the records; callers pass validated inputs only.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    fn backend(&self) -> LeaseBackend;

    /// Fails with `Conflict` if another agent holds a live lease.
    async fn acquire(&self, input: AcquireLeaseInput) -> Result<LeaseRecord, LeaseError>;

    async fn renew(&self, input: RenewLeaseInput) -> Result<LeaseRecord, LeaseError>;

    /// Returns the record that was removed.
    async fn release(&self, input: ReleaseLeaseInput) -> Result<LeaseRecord, LeaseError>;

    async fn get_active(&self, document_id: &str) -> Result<Option<LeaseRecord>, LeaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrelay_core::domain::api::ApiErrorKind;

    fn record() -> LeaseRecord {
        let acquired_at = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        LeaseRecord {
            document_id: "doc-1".to_string(),
            agent_id: "agent-a".to_string(),
            lease_token: "token-1".to_string(),
            reason: None,
            acquired_at,
            expires_at: acquired_at + TimeDelta::seconds(60),
            backend: LeaseBackend::Memory,
        }
    }

    #[test]
    fn test_liveness_boundary() {
        let lease = record();
        assert!(lease.is_live(lease.expires_at - TimeDelta::milliseconds(1)));
        assert!(!lease.is_live(lease.expires_at));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["documentId"], "doc-1");
        assert_eq!(value["agentId"], "agent-a");
        assert_eq!(value["leaseToken"], "token-1");
        assert_eq!(value["backend"], "memory");
        assert!(value.get("reason").is_none());
        assert!(value["expiresAt"].as_str().unwrap().starts_with("2026-03-01T12:01:00"));
    }

    #[test]
    fn test_error_codes_and_messages() {
        assert_eq!(
            LeaseError::no_active_lease().to_string(),
            "LEASE_NOT_FOUND: no active lease found"
        );
        assert_eq!(
            LeaseError::token_mismatch().to_string(),
            "LEASE_NOT_FOUND: lease token does not match active lease"
        );
        assert_eq!(
            LeaseError::Validation("documentId is required".into()).to_string(),
            "INVALID_INPUT: documentId is required"
        );

        let upstream = LeaseError::from(ApiError::from_status(429, "slow down"));
        assert_eq!(upstream.code(), "RATE_LIMITED");
        assert!(upstream.is_transient());
        assert!(!LeaseError::no_active_lease().is_transient());
        assert!(matches!(
            upstream,
            LeaseError::Upstream(ApiError { kind: ApiErrorKind::RateLimited, .. })
        ));
    }

    #[test]
    fn test_conflict_payload_carries_existing_lease() {
        let err = LeaseError::Conflict {
            existing: Box::new(record()),
        };
        let payload = err.to_payload();
        assert_eq!(payload["ok"], false);
        assert_eq!(payload["error"], "LEASE_CONFLICT");
        assert_eq!(
            payload["message"],
            "LEASE_CONFLICT: document is already leased by another agent"
        );
        assert_eq!(payload["existingLease"]["agentId"], "agent-a");
    }

    #[test]
    fn test_expiry_after_rejects_unrepresentable_ttl() {
        let now = record().acquired_at;
        assert_eq!(
            expiry_after(now, 600).unwrap(),
            now + TimeDelta::seconds(600)
        );
        assert!(matches!(
            expiry_after(now, i64::MAX),
            Err(LeaseError::Validation(_))
        ));
    }
}
