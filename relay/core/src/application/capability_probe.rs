// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Startup capability discovery.
//!
//! Probes every optional endpoint concurrently with an empty body and waits
//! for all of them before returning. Callers run this once, before building
//! anything that depends on the result.

use futures::future::join_all;
use tracing::{debug, info};

use crate::domain::capability::{
    Capability, CapabilityProbeResult, EndpointProber, ServerCapabilities,
};

pub async fn probe_server_capabilities(prober: &dyn EndpointProber) -> ServerCapabilities {
    let probes = Capability::ALL.into_iter().map(|capability| async move {
        let status = prober
            .probe_endpoint(capability.endpoint(), serde_json::json!({}))
            .await;
        (
            capability,
            CapabilityProbeResult::from_status(capability.endpoint(), status),
        )
    });

    let mut capabilities = ServerCapabilities::unknown();
    for (capability, result) in join_all(probes).await {
        debug!(
            "Capability '{}' ({}): {} (status={:?})",
            capability.name(),
            result.endpoint,
            result.state,
            result.status
        );
        capabilities.set(capability, result);
    }

    info!("Capability probe completed");
    capabilities
}

/// Capabilities assumed when probing is disabled.
pub fn default_capabilities() -> ServerCapabilities {
    ServerCapabilities::unknown()
}
