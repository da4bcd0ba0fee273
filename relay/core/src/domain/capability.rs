// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Server Capabilities
//!
//! Optional Outline endpoints differ between cloud and self-hosted
//! deployments. Each one is probed once at startup and classified:
//!
//! | Probe status | State |
//! |--------------|-------|
//! | no response | `unknown` |
//! | 403, 404 | `unavailable` |
//! | 2xx, other 4xx | `available` |
//! | anything else | `unknown` |
//!
//! A 400 means the endpoint exists and merely rejected the empty probe body.
//! `unknown` is treated as available by [`should_enable`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityState {
    Available,
    Unavailable,
    Unknown,
}

impl fmt::Display for CapabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Classify a probe's final HTTP status.
pub fn classify_status(status: Option<u16>) -> CapabilityState {
    match status {
        None => CapabilityState::Unknown,
        Some(403 | 404) => CapabilityState::Unavailable,
        Some(200..=299) | Some(400..=499) => CapabilityState::Available,
        Some(_) => CapabilityState::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityProbeResult {
    pub endpoint: String,
    pub state: CapabilityState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl CapabilityProbeResult {
    pub fn from_status(endpoint: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: classify_status(status),
            status,
        }
    }

    pub fn unknown(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: CapabilityState::Unknown,
            status: None,
        }
    }
}

/// Whether a feature backed by this capability should be offered.
pub fn should_enable(result: &CapabilityProbeResult) -> bool {
    result.state != CapabilityState::Unavailable
}

/// The optional endpoints docrelay cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Comments,
    RevisionInfo,
    Templatize,
    DataAttributes,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Comments,
        Capability::RevisionInfo,
        Capability::Templatize,
        Capability::DataAttributes,
    ];

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Comments => "comments.list",
            Self::RevisionInfo => "revisions.info",
            Self::Templatize => "documents.templatize",
            Self::DataAttributes => "dataAttributes.list",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Comments => "comments",
            Self::RevisionInfo => "revisionInfo",
            Self::Templatize => "templatize",
            Self::DataAttributes => "dataAttributes",
        }
    }
}

/// Probe outcome for every [`Capability`]. Built once, then passed by
/// reference to whoever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    pub comments: CapabilityProbeResult,
    pub revision_info: CapabilityProbeResult,
    pub templatize: CapabilityProbeResult,
    pub data_attributes: CapabilityProbeResult,
}

impl ServerCapabilities {
    /// Every capability `unknown`; used when probing is disabled.
    pub fn unknown() -> Self {
        Self {
            comments: CapabilityProbeResult::unknown(Capability::Comments.endpoint()),
            revision_info: CapabilityProbeResult::unknown(Capability::RevisionInfo.endpoint()),
            templatize: CapabilityProbeResult::unknown(Capability::Templatize.endpoint()),
            data_attributes: CapabilityProbeResult::unknown(Capability::DataAttributes.endpoint()),
        }
    }

    pub fn get(&self, capability: Capability) -> &CapabilityProbeResult {
        match capability {
            Capability::Comments => &self.comments,
            Capability::RevisionInfo => &self.revision_info,
            Capability::Templatize => &self.templatize,
            Capability::DataAttributes => &self.data_attributes,
        }
    }

    pub fn set(&mut self, capability: Capability, result: CapabilityProbeResult) {
        let slot = match capability {
            Capability::Comments => &mut self.comments,
            Capability::RevisionInfo => &mut self.revision_info,
            Capability::Templatize => &mut self.templatize,
            Capability::DataAttributes => &mut self.data_attributes,
        };
        *slot = result;
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        should_enable(self.get(capability))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, &CapabilityProbeResult)> {
        Capability::ALL
            .into_iter()
            .map(move |capability| (capability, self.get(capability)))
    }

    pub fn unavailable(&self) -> Vec<(Capability, &CapabilityProbeResult)> {
        self.iter()
            .filter(|(_, result)| result.state == CapabilityState::Unavailable)
            .collect()
    }

    /// `name(endpoint, status=N)` list of unavailable capabilities, or `None`
    /// when everything is usable.
    pub fn unavailable_summary(&self) -> Option<String> {
        let unavailable = self.unavailable();
        if unavailable.is_empty() {
            return None;
        }
        let parts: Vec<String> = unavailable
            .into_iter()
            .map(|(capability, result)| {
                let status = result
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "n/a".to_string());
                format!("{}({}, status={})", capability.name(), result.endpoint, status)
            })
            .collect();
        Some(parts.join(", "))
    }
}

/// Issues a probe request and reports the final status, or `None` if no
/// response was ever received.
#[async_trait]
pub trait EndpointProber: Send + Sync {
    async fn probe_endpoint(&self, endpoint: &str, body: serde_json::Value) -> Option<u16>;
}
