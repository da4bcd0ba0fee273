// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Lease Service - Input Validation in front of a LeaseStore
//
// Rejects blank identifiers and out-of-range TTLs, fills in the default TTL,
// then hands the request to whichever backend was selected at startup.
// Store errors are returned unchanged and nothing is retried here.

use std::sync::Arc;

use crate::domain::lease::{
    AcquireLeaseInput, LeaseBackend, LeaseError, LeaseRecord, LeaseStore, ReleaseLeaseInput,
    RenewLeaseInput,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseServiceConfig {
    pub default_ttl_seconds: i64,
    pub max_ttl_seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquireLeaseRequest {
    pub document_id: String,
    pub agent_id: String,
    pub ttl_seconds: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenewLeaseRequest {
    pub document_id: String,
    pub lease_token: String,
    pub ttl_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseLeaseRequest {
    pub document_id: String,
    pub lease_token: String,
}

pub struct LeaseService {
    store: Arc<dyn LeaseStore>,
    config: LeaseServiceConfig,
}

impl LeaseService {
    pub fn new(store: Arc<dyn LeaseStore>, config: LeaseServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn backend(&self) -> LeaseBackend {
        self.store.backend()
    }

    pub fn config(&self) -> LeaseServiceConfig {
        self.config
    }

    pub async fn acquire(&self, request: AcquireLeaseRequest) -> Result<LeaseRecord, LeaseError> {
        assert_required(&request.document_id, "documentId is required")?;
        assert_required(&request.agent_id, "agentId is required")?;
        let ttl_seconds = self.normalize_ttl(request.ttl_seconds)?;

        self.store
            .acquire(AcquireLeaseInput {
                document_id: request.document_id,
                agent_id: request.agent_id,
                ttl_seconds,
                reason: request.reason,
            })
            .await
    }

    pub async fn renew(&self, request: RenewLeaseRequest) -> Result<LeaseRecord, LeaseError> {
        assert_required(&request.document_id, "documentId is required")?;
        assert_required(&request.lease_token, "leaseToken is required")?;
        let ttl_seconds = self.normalize_ttl(request.ttl_seconds)?;

        self.store
            .renew(RenewLeaseInput {
                document_id: request.document_id,
                lease_token: request.lease_token,
                ttl_seconds,
            })
            .await
    }

    pub async fn release(&self, request: ReleaseLeaseRequest) -> Result<LeaseRecord, LeaseError> {
        assert_required(&request.document_id, "documentId is required")?;
        assert_required(&request.lease_token, "leaseToken is required")?;

        self.store
            .release(ReleaseLeaseInput {
                document_id: request.document_id,
                lease_token: request.lease_token,
            })
            .await
    }

    pub async fn get_active(&self, document_id: &str) -> Result<Option<LeaseRecord>, LeaseError> {
        assert_required(document_id, "documentId is required")?;
        self.store.get_active(document_id).await
    }

    /// Omitted TTL falls back to the configured default; anything else must
    /// be in `1..=max_ttl_seconds`.
    pub fn normalize_ttl(&self, ttl_seconds: Option<i64>) -> Result<i64, LeaseError> {
        let ttl = ttl_seconds.unwrap_or(self.config.default_ttl_seconds);
        if ttl <= 0 {
            return Err(LeaseError::Validation(
                "ttlSeconds must be a positive integer".to_string(),
            ));
        }
        if ttl > self.config.max_ttl_seconds {
            return Err(LeaseError::Validation(format!(
                "ttlSeconds cannot exceed {}",
                self.config.max_ttl_seconds
            )));
        }
        Ok(ttl)
    }
}

/// Parse a TTL supplied as text (`"600"`). Fractions and non-numbers are
/// rejected the same way as non-positive values.
pub fn parse_ttl_seconds(raw: &str) -> Result<i64, LeaseError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| LeaseError::Validation("ttlSeconds must be a positive integer".to_string()))
}

fn assert_required(value: &str, message: &str) -> Result<(), LeaseError> {
    if value.trim().is_empty() {
        return Err(LeaseError::Validation(message.to_string()));
    }
    Ok(())
}
