// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// In-memory Lease Store
//
// Process-local map of document id -> lease. Each operation holds the map
// lock across its read and write, so acquire/renew/release are atomic per
// document within one process. State does not survive a restart and is not
// shared between processes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::lease::{
    expiry_after, new_lease_token, AcquireLeaseInput, LeaseBackend, LeaseError, LeaseRecord,
    LeaseStore, ReleaseLeaseInput, RenewLeaseInput,
};

#[derive(Clone)]
pub struct MemoryLeaseStore {
    leases: Arc<Mutex<HashMap<String, LeaseRecord>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            leases: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }
}

impl Default for MemoryLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Live lease for `document_id`; an expired entry is evicted on the way.
fn live_lease(
    leases: &mut HashMap<String, LeaseRecord>,
    document_id: &str,
    now: DateTime<Utc>,
) -> Option<LeaseRecord> {
    let live = leases
        .get(document_id)
        .filter(|lease| lease.is_live(now))
        .cloned();
    if live.is_none() {
        leases.remove(document_id);
    }
    live
}

/// Live lease whose token matches, or the matching `NotFound` error.
fn matching_lease(
    leases: &mut HashMap<String, LeaseRecord>,
    document_id: &str,
    lease_token: &str,
    now: DateTime<Utc>,
) -> Result<LeaseRecord, LeaseError> {
    let existing = live_lease(leases, document_id, now).ok_or_else(LeaseError::no_active_lease)?;
    if existing.lease_token != lease_token {
        return Err(LeaseError::token_mismatch());
    }
    Ok(existing)
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    fn backend(&self) -> LeaseBackend {
        LeaseBackend::Memory
    }

    async fn acquire(&self, input: AcquireLeaseInput) -> Result<LeaseRecord, LeaseError> {
        let mut leases = self.leases.lock().await;
        let now = self.clock.now();

        if let Some(existing) = live_lease(&mut leases, &input.document_id, now) {
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
            backend: LeaseBackend::Memory,
        };
        leases.insert(input.document_id, lease.clone());
        Ok(lease)
    }

    async fn renew(&self, input: RenewLeaseInput) -> Result<LeaseRecord, LeaseError> {
        let mut leases = self.leases.lock().await;
        let now = self.clock.now();

        let mut lease = matching_lease(&mut leases, &input.document_id, &input.lease_token, now)?;
        lease.expires_at = expiry_after(now, input.ttl_seconds)?;
        leases.insert(input.document_id, lease.clone());
        Ok(lease)
    }

    async fn release(&self, input: ReleaseLeaseInput) -> Result<LeaseRecord, LeaseError> {
        let mut leases = self.leases.lock().await;
        let now = self.clock.now();

        let lease = matching_lease(&mut leases, &input.document_id, &input.lease_token, now)?;
        leases.remove(&input.document_id);
        Ok(lease)
    }

    async fn get_active(&self, document_id: &str) -> Result<Option<LeaseRecord>, LeaseError> {
        let mut leases = self.leases.lock().await;
        let now = self.clock.now();
        Ok(live_lease(&mut leases, document_id, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use chrono::TimeDelta;

    fn store() -> (MemoryLeaseStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (MemoryLeaseStore::with_clock(clock.clone()), clock)
    }

    fn acquire_input(agent_id: &str, ttl_seconds: i64) -> AcquireLeaseInput {
        AcquireLeaseInput {
            document_id: "doc-1".to_string(),
            agent_id: agent_id.to_string(),
            ttl_seconds,
            reason: Some("editing".to_string()),
        }
    }

    #[tokio::test]
    async fn test_acquire_sets_expiry_from_ttl() {
        let (store, _) = store();
        let lease = store.acquire(acquire_input("agent-a", 120)).await.unwrap();

        assert_eq!(lease.expires_at - lease.acquired_at, TimeDelta::seconds(120));
        assert_eq!(lease.backend, LeaseBackend::Memory);
        assert_eq!(lease.reason.as_deref(), Some("editing"));
        assert!(uuid::Uuid::parse_str(&lease.lease_token).is_ok());
    }

    #[tokio::test]
    async fn test_other_agent_conflicts() {
        let (store, _) = store();
        let first = store.acquire(acquire_input("agent-a", 60)).await.unwrap();

        let err = store.acquire(acquire_input("agent-b", 60)).await.unwrap_err();
        match err {
            LeaseError::Conflict { existing } => assert_eq!(*existing, first),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_same_agent_reacquire_replaces_token() {
        let (store, _) = store();
        let first = store.acquire(acquire_input("agent-a", 60)).await.unwrap();
        let second = store.acquire(acquire_input("agent-a", 60)).await.unwrap();

        assert_ne!(first.lease_token, second.lease_token);
        let active = store.get_active("doc-1").await.unwrap().unwrap();
        assert_eq!(active.lease_token, second.lease_token);
    }

    #[tokio::test]
    async fn test_expired_lease_is_gone_and_reacquirable() {
        let (store, clock) = store();
        store.acquire(acquire_input("agent-a", 30)).await.unwrap();

        clock.advance(TimeDelta::seconds(30));
        assert!(store.get_active("doc-1").await.unwrap().is_none());

        let lease = store.acquire(acquire_input("agent-b", 30)).await.unwrap();
        assert_eq!(lease.agent_id, "agent-b");
    }

    #[tokio::test]
    async fn test_renew_extends_from_now() {
        let (store, clock) = store();
        let lease = store.acquire(acquire_input("agent-a", 60)).await.unwrap();

        clock.advance(TimeDelta::seconds(45));
        let renewed = store
            .renew(RenewLeaseInput {
                document_id: "doc-1".to_string(),
                lease_token: lease.lease_token.clone(),
                ttl_seconds: 60,
            })
            .await
            .unwrap();

        assert_eq!(renewed.acquired_at, lease.acquired_at);
        assert_eq!(renewed.lease_token, lease.lease_token);
        assert_eq!(renewed.expires_at, clock.now() + TimeDelta::seconds(60));
    }

    #[tokio::test]
    async fn test_renew_and_release_require_matching_token() {
        let (store, _) = store();

        let err = store
            .renew(RenewLeaseInput {
                document_id: "doc-1".to_string(),
                lease_token: "nope".to_string(),
                ttl_seconds: 60,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "LEASE_NOT_FOUND: no active lease found");

        let lease = store.acquire(acquire_input("agent-a", 60)).await.unwrap();
        let err = store
            .release(ReleaseLeaseInput {
                document_id: "doc-1".to_string(),
                lease_token: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "LEASE_NOT_FOUND: lease token does not match active lease"
        );

        let released = store
            .release(ReleaseLeaseInput {
                document_id: "doc-1".to_string(),
                lease_token: lease.lease_token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(released, lease);
        assert!(store.get_active("doc-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_acquires_admit_one_holder() {
        let (store, _) = store();
        let attempts = (0..8).map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.acquire(acquire_input(&format!("agent-{i}"), 60)).await })
        });

        let mut granted = 0;
        let mut conflicts = 0;
        for handle in attempts.collect::<Vec<_>>() {
            match handle.await.unwrap() {
                Ok(_) => granted += 1,
                Err(LeaseError::Conflict { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
        assert_eq!(granted, 1);
        assert_eq!(conflicts, 7);
    }
}
