// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Data-attribute Lease Store
//!
//! Persists the lease inside the leased document itself, as a JSON string in
//! one configured Outline data attribute:
//!
//! ```json
//! {"agentId":"...","leaseToken":"...","reason":"...","acquiredAt":"...","expiresAt":"..."}
//! ```
//!
//! Every operation is `documents.info` -> decide -> `documents.update`, and the
//! update carries the document's complete data attribute list so unrelated
//! attributes survive. Release drops the lease attribute from that list.
//!
//! A missing attribute, a non-string value, malformed JSON, a blank or absent
//! field, an unparseable timestamp and an expired lease all read as "no lease".
//!
//! ## Concurrency
//!
//! Outline offers no compare-and-swap on document updates, so the
//! read-decide-write sequence is not atomic. Two agents that acquire at the
//! same moment can both read "no lease", both write, and both be told they
//! hold the lease; the later write wins in storage. Callers needing strict
//! exclusion should use the memory backend behind a single process.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use docrelay_core::domain::document::{
    DataAttribute, DataAttributeValue, Document, DocumentGateway, UpdateDocumentRequest,
};

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::lease::{
    expiry_after, new_lease_token, AcquireLeaseInput, LeaseBackend, LeaseError, LeaseRecord,
    LeaseStore, ReleaseLeaseInput, RenewLeaseInput,
};

/// Wire form of the attribute value.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLease {
    agent_id: String,
    lease_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    acquired_at: String,
    expires_at: String,
}

impl From<&LeaseRecord> for StoredLease {
    fn from(lease: &LeaseRecord) -> Self {
        Self {
            agent_id: lease.agent_id.clone(),
            lease_token: lease.lease_token.clone(),
            reason: lease.reason.clone(),
            acquired_at: lease.acquired_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            expires_at: lease.expires_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

pub struct DataAttributeLeaseStore {
    gateway: Arc<dyn DocumentGateway>,
    attribute_id: String,
    clock: Arc<dyn Clock>,
}

impl DataAttributeLeaseStore {
    pub fn new(gateway: Arc<dyn DocumentGateway>, attribute_id: impl Into<String>) -> Self {
        Self::with_clock(gateway, attribute_id, Arc::new(SystemClock))
    }

    pub fn with_clock(
        gateway: Arc<dyn DocumentGateway>,
        attribute_id: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            attribute_id: attribute_id.into(),
            clock,
        }
    }

    pub fn attribute_id(&self) -> &str {
        &self.attribute_id
    }

    fn extract_lease(&self, document: &Document, now: DateTime<Utc>) -> Option<LeaseRecord> {
        let text = document
            .data_attribute(&self.attribute_id)?
            .value
            .as_text()?;

        let stored: StoredLease = match serde_json::from_str(text) {
            Ok(stored) => stored,
            Err(e) => {
                debug!(
                    "Ignoring unreadable lease attribute on document {}: {}",
                    document.id, e
                );
                return None;
            }
        };

        if [&stored.agent_id, &stored.lease_token, &stored.acquired_at, &stored.expires_at]
            .iter()
            .any(|field| field.is_empty())
        {
            return None;
        }

        let acquired_at = parse_timestamp(&stored.acquired_at)?;
        let expires_at = parse_timestamp(&stored.expires_at)?;

        let lease = LeaseRecord {
            document_id: document.id.clone(),
            agent_id: stored.agent_id,
            lease_token: stored.lease_token,
            reason: stored.reason,
            acquired_at,
            expires_at,
            backend: LeaseBackend::DataAttribute,
        };
        lease.is_live(now).then_some(lease)
    }

    /// Every attribute except the lease, in update form.
    fn other_attributes(&self, document: &Document) -> Vec<DataAttribute> {
        document
            .data_attributes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|attribute| attribute.data_attribute_id != self.attribute_id)
            .map(DataAttribute::for_update)
            .collect()
    }

    /// Attribute list with the lease written in place (or appended).
    fn with_lease(
        &self,
        document: &Document,
        lease: &LeaseRecord,
    ) -> Result<Vec<DataAttribute>, LeaseError> {
        let value = serde_json::to_string(&StoredLease::from(lease))
            .map_err(|e| LeaseError::Encoding(e.to_string()))?;
        let replacement = DataAttribute {
            data_attribute_id: self.attribute_id.clone(),
            value: DataAttributeValue::Text(value),
            updated_at: None,
        };

        let mut attributes: Vec<DataAttribute> = document
            .data_attributes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(DataAttribute::for_update)
            .collect();

        match attributes
            .iter_mut()
            .find(|attribute| attribute.data_attribute_id == self.attribute_id)
        {
            Some(slot) => *slot = replacement,
            None => attributes.push(replacement),
        }
        Ok(attributes)
    }

    async fn write(
        &self,
        document_id: &str,
        attributes: Vec<DataAttribute>,
    ) -> Result<(), LeaseError> {
        self.gateway
            .update_document(UpdateDocumentRequest {
                id: document_id.to_string(),
                data_attributes: Some(attributes),
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    /// Current time at the millisecond precision the attribute stores.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(3)
    }

    async fn read_matching(
        &self,
        document_id: &str,
        lease_token: &str,
    ) -> Result<(Document, LeaseRecord, DateTime<Utc>), LeaseError> {
        let document = self.gateway.get_document(document_id).await?;
        let now = self.now();
        let lease = self
            .extract_lease(&document, now)
            .ok_or_else(LeaseError::no_active_lease)?;
        if lease.lease_token != lease_token {
            return Err(LeaseError::token_mismatch());
        }
        Ok((document, lease, now))
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

#[async_trait]
impl LeaseStore for DataAttributeLeaseStore {
    fn backend(&self) -> LeaseBackend {
        LeaseBackend::DataAttribute
    }

    async fn acquire(&self, input: AcquireLeaseInput) -> Result<LeaseRecord, LeaseError> {
        let document = self.gateway.get_document(&input.document_id).await?;
        let now = self.now();

        if let Some(existing) = self.extract_lease(&document, now) {
            if !existing.is_held_by(&input.agent_id) {
                return Err(LeaseError::Conflict {
                    existing: Box::new(existing),
                });
            }
        }

        let lease = LeaseRecord {
            document_id: input.document_id.clone(),
            agent_id: input.agent_id,
            lease_token: new_lease_token(),
            reason: input.reason,
            acquired_at: now,
            expires_at: expiry_after(now, input.ttl_seconds)?,
            backend: LeaseBackend::DataAttribute,
        };

        let attributes = self.with_lease(&document, &lease)?;
        self.write(&input.document_id, attributes).await?;
        Ok(lease)
    }

    async fn renew(&self, input: RenewLeaseInput) -> Result<LeaseRecord, LeaseError> {
        let (document, mut lease, now) = self
            .read_matching(&input.document_id, &input.lease_token)
            .await?;
        lease.expires_at = expiry_after(now, input.ttl_seconds)?;

        let attributes = self.with_lease(&document, &lease)?;
        self.write(&input.document_id, attributes).await?;
        Ok(lease)
    }

    async fn release(&self, input: ReleaseLeaseInput) -> Result<LeaseRecord, LeaseError> {
        let (document, lease, _) = self
            .read_matching(&input.document_id, &input.lease_token)
            .await?;

        self.write(&input.document_id, self.other_attributes(&document))
            .await?;
        Ok(lease)
    }

    async fn get_active(&self, document_id: &str) -> Result<Option<LeaseRecord>, LeaseError> {
        let document = self.gateway.get_document(document_id).await?;
        Ok(self.extract_lease(&document, self.now()))
    }
}
