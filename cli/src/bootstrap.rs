// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Relay Bootstrap - Composition Root
//
// Order matters: config is resolved first, the capability probe runs to
// completion next, and only then is the lease backend chosen, because the
// data-attribute backend depends on the `dataAttributes` capability.
//
// The CLI is its own dispatcher, so the action-class gate lives here too.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use docrelay_core::application::{default_capabilities, probe_server_capabilities};
use docrelay_core::domain::capability::{EndpointProber, ServerCapabilities};
use docrelay_core::domain::config::{AllowedAction, RelayConfig, ResolvedConfig};
use docrelay_core::infrastructure::OutlineClient;
use docrelay_lease::{create_lease_service, LeaseService};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("PERMISSION_DENIED: action \"{action}\" is not enabled")]
pub struct PermissionDenied {
    pub action: AllowedAction,
}

pub struct RelayContext {
    pub config: ResolvedConfig,
    pub client: Arc<OutlineClient>,
    pub capabilities: ServerCapabilities,
    pub lease_service: LeaseService,
}

impl RelayContext {
    /// Load configuration (flag, discovery, defaults, env), check `action` is
    /// enabled, then build everything.
    pub async fn bootstrap(config_path: Option<PathBuf>, action: AllowedAction) -> Result<Self> {
        let config = load_resolved_config(config_path)?;
        Self::for_action(config, action).await
    }

    /// The permission check runs before the client sends anything upstream.
    pub async fn for_action(config: ResolvedConfig, action: AllowedAction) -> Result<Self> {
        ensure_allowed(&config, action)?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: ResolvedConfig) -> Result<Self> {
        let client = Arc::new(
            OutlineClient::new(&config).context("Failed to build Outline API client")?,
        );

        let capabilities = discover_capabilities(&config, client.as_ref()).await;

        let lease_service = create_lease_service(&config.lease, client.clone(), &capabilities)
            .context("Failed to configure lease backend")?;
        info!("Lease backend: {}", lease_service.backend());

        Ok(Self {
            config,
            client,
            capabilities,
            lease_service,
        })
    }
}

pub fn ensure_allowed(config: &ResolvedConfig, action: AllowedAction) -> Result<(), PermissionDenied> {
    if config.allowed_actions.contains(&action) {
        Ok(())
    } else {
        Err(PermissionDenied { action })
    }
}

pub fn load_resolved_config(config_path: Option<PathBuf>) -> Result<ResolvedConfig> {
    let config =
        RelayConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config.resolve().context("Invalid configuration")
}

/// Probe result, or the all-unknown defaults when probing is turned off.
pub async fn discover_capabilities(
    config: &ResolvedConfig,
    prober: &dyn EndpointProber,
) -> ServerCapabilities {
    if !config.capability_probe_enabled {
        info!("Capability probe disabled; assuming optional endpoints are available");
        return default_capabilities();
    }

    let capabilities = probe_server_capabilities(prober).await;
    if let Some(summary) = capabilities.unavailable_summary() {
        warn!("Capability probe disabled these features: {}", summary);
    }
    capabilities
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrelay_core::domain::capability::{Capability, CapabilityState};
    use docrelay_core::domain::config::LeaseBackend;

    fn resolved(base_url: &str, probe: bool) -> ResolvedConfig {
        let mut config = RelayConfig::default();
        config.spec.outline.base_url = base_url.to_string();
        config.spec.outline.api_key = Some("test-key".to_string());
        config.spec.outline.retry_count = 0;
        config.spec.outline.enable_capability_probe = probe;
        config.spec.lease.attribute_id = Some("attr-lease".to_string());
        config.resolve().unwrap()
    }

    #[test]
    fn test_ensure_allowed() {
        let config = resolved("https://docs.example.com", false);

        assert!(ensure_allowed(&config, AllowedAction::Read).is_ok());
        let err = ensure_allowed(&config, AllowedAction::Admin).unwrap_err();
        assert_eq!(
            err.to_string(),
            "PERMISSION_DENIED: action \"admin\" is not enabled"
        );
    }

    #[tokio::test]
    async fn test_denied_action_sends_no_requests() {
        let mut server = mockito::Server::new_async().await;
        let upstream = server
            .mock("POST", mockito::Matcher::Regex(r"^/api/.*".to_string()))
            .with_status(200)
            .with_body(r#"{"ok":true,"data":[]}"#)
            .expect(0)
            .create_async()
            .await;

        let err = match RelayContext::for_action(resolved(&server.url(), true), AllowedAction::Admin)
            .await
        {
            Ok(_) => panic!("admin should be denied by default"),
            Err(err) => err,
        };

        assert_eq!(
            err.downcast_ref::<PermissionDenied>(),
            Some(&PermissionDenied {
                action: AllowedAction::Admin
            })
        );
        upstream.assert_async().await;
    }

    #[tokio::test]
    async fn test_probe_disabled_keeps_data_attribute_backend() {
        let context = RelayContext::from_config(resolved("http://127.0.0.1:9", false))
            .await
            .unwrap();

        assert_eq!(
            context.capabilities.get(Capability::DataAttributes).state,
            CapabilityState::Unknown
        );
        assert_eq!(context.lease_service.backend(), LeaseBackend::DataAttribute);
    }

    #[tokio::test]
    async fn test_missing_data_attributes_falls_back_to_memory() {
        let mut server = mockito::Server::new_async().await;
        let _data_attributes = server
            .mock("POST", "/api/dataAttributes.list")
            .with_status(404)
            .create_async()
            .await;
        let _others = server
            .mock("POST", mockito::Matcher::Regex(r"^/api/.*".to_string()))
            .with_status(400)
            .create_async()
            .await;

        let context = RelayContext::from_config(resolved(&server.url(), true))
            .await
            .unwrap();

        assert_eq!(
            context.capabilities.get(Capability::DataAttributes).state,
            CapabilityState::Unavailable
        );
        assert!(context.capabilities.is_enabled(Capability::Comments));
        assert_eq!(context.lease_service.backend(), LeaseBackend::Memory);
    }
}
