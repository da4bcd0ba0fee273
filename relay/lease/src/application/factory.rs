// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Backend selection.
//!
//! | Resolved backend | `dataAttributes` capability | Store |
//! |------------------|-----------------------------|-------|
//! | `memory` | any | [`MemoryLeaseStore`] |
//! | `data_attribute` | unavailable | [`MemoryLeaseStore`] (with a warning) |
//! | `data_attribute` | available / unknown | [`DataAttributeLeaseStore`] |

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use docrelay_core::domain::capability::{Capability, ServerCapabilities};
use docrelay_core::domain::config::ResolvedLeaseSettings;
use docrelay_core::domain::document::DocumentGateway;

use crate::application::lease_service::{LeaseService, LeaseServiceConfig};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::lease::{LeaseBackend, LeaseStore};
use crate::infrastructure::{DataAttributeLeaseStore, MemoryLeaseStore};

#[derive(Debug, Error)]
pub enum LeaseSetupError {
    #[error("OUTLINE_LEASE_ATTRIBUTE_ID is required when OUTLINE_LEASE_STRATEGY=data_attribute")]
    MissingAttributeId,
}

pub fn create_lease_store(
    settings: &ResolvedLeaseSettings,
    gateway: Arc<dyn DocumentGateway>,
    capabilities: &ServerCapabilities,
) -> Result<Arc<dyn LeaseStore>, LeaseSetupError> {
    create_lease_store_with_clock(settings, gateway, capabilities, Arc::new(SystemClock))
}

pub fn create_lease_store_with_clock(
    settings: &ResolvedLeaseSettings,
    gateway: Arc<dyn DocumentGateway>,
    capabilities: &ServerCapabilities,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn LeaseStore>, LeaseSetupError> {
    if settings.backend == LeaseBackend::DataAttribute {
        if !capabilities.is_enabled(Capability::DataAttributes) {
            warn!("Lease backend fell back to memory because data attribute capability is unavailable");
            return Ok(memory_store(clock));
        }

        let attribute_id = settings
            .attribute_id
            .clone()
            .ok_or(LeaseSetupError::MissingAttributeId)?;

        info!("Using data attribute lease backend (attribute {})", attribute_id);
        return Ok(Arc::new(DataAttributeLeaseStore::with_clock(
            gateway,
            attribute_id,
            clock,
        )));
    }

    Ok(memory_store(clock))
}

fn memory_store(clock: Arc<dyn Clock>) -> Arc<dyn LeaseStore> {
    warn!("Using in-memory lease backend; leases are per-process and lost on restart");
    Arc::new(MemoryLeaseStore::with_clock(clock))
}

pub fn create_lease_service(
    settings: &ResolvedLeaseSettings,
    gateway: Arc<dyn DocumentGateway>,
    capabilities: &ServerCapabilities,
) -> Result<LeaseService, LeaseSetupError> {
    let store = create_lease_store(settings, gateway, capabilities)?;
    Ok(LeaseService::new(
        store,
        LeaseServiceConfig {
            default_ttl_seconds: settings.default_ttl_seconds,
            max_ttl_seconds: settings.max_ttl_seconds,
        },
    ))
}
