// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Document lease commands
//!
//! Commands: acquire, renew, release, status

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use docrelay_core::domain::config::{AllowedAction, LeaseBackend};
use docrelay_lease::application::lease_service::{
    parse_ttl_seconds, AcquireLeaseRequest, ReleaseLeaseRequest, RenewLeaseRequest,
};
use docrelay_lease::{LeaseError, LeaseRecord};

use crate::bootstrap::RelayContext;

#[derive(Subcommand)]
pub enum LeaseCommand {
    /// Acquire (or re-acquire) the lease on a document
    Acquire {
        /// Document ID
        document_id: String,

        /// Agent identity taking the lease
        #[arg(long)]
        agent: String,

        /// Lease duration in seconds (default: configured default TTL)
        #[arg(long, value_name = "SECONDS")]
        ttl: Option<String>,

        /// Free-form note stored with the lease
        #[arg(long)]
        reason: Option<String>,
    },

    /// Extend a lease you hold
    Renew {
        /// Document ID
        document_id: String,

        /// Token returned by acquire
        #[arg(long)]
        token: String,

        /// New duration in seconds, counted from now
        #[arg(long, value_name = "SECONDS")]
        ttl: Option<String>,
    },

    /// Release a lease you hold
    Release {
        /// Document ID
        document_id: String,

        /// Token returned by acquire
        #[arg(long)]
        token: String,
    },

    /// Show the live lease on a document, if any
    Status {
        /// Document ID
        document_id: String,
    },
}

impl LeaseCommand {
    fn action(&self) -> AllowedAction {
        match self {
            Self::Status { .. } => AllowedAction::Read,
            Self::Acquire { .. } | Self::Renew { .. } | Self::Release { .. } => {
                AllowedAction::Write
            }
        }
    }
}

pub async fn handle_command(
    command: LeaseCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    let context = RelayContext::bootstrap(config_override, command.action()).await?;
    require_shared_backend(context.lease_service.backend())?;

    match run(&context, command).await {
        Ok(()) => Ok(()),
        Err(err) => {
            eprintln!("{}", render_error(&err));
            Err(err.into())
        }
    }
}

async fn run(context: &RelayContext, command: LeaseCommand) -> Result<(), LeaseError> {
    let service = &context.lease_service;

    match command {
        LeaseCommand::Acquire {
            document_id,
            agent,
            ttl,
            reason,
        } => {
            let lease = service
                .acquire(AcquireLeaseRequest {
                    document_id,
                    agent_id: agent,
                    ttl_seconds: parse_ttl(ttl.as_deref())?,
                    reason,
                })
                .await?;
            println!("{}", "✓ Lease acquired".green());
            print_lease(&lease)
        }
        LeaseCommand::Renew {
            document_id,
            token,
            ttl,
        } => {
            let lease = service
                .renew(RenewLeaseRequest {
                    document_id,
                    lease_token: token,
                    ttl_seconds: parse_ttl(ttl.as_deref())?,
                })
                .await?;
            println!("{}", "✓ Lease renewed".green());
            print_lease(&lease)
        }
        LeaseCommand::Release { document_id, token } => {
            let lease = service
                .release(ReleaseLeaseRequest {
                    document_id,
                    lease_token: token,
                })
                .await?;
            println!("{}", "✓ Lease released".green());
            print_lease(&lease)
        }
        LeaseCommand::Status { document_id } => {
            match service.get_active(&document_id).await? {
                Some(lease) => print_lease(&lease),
                None => {
                    println!("{}", format!("No active lease on {document_id}").yellow());
                    Ok(())
                }
            }
        }
    }
}

/// A memory lease dies with this process, so a one-shot command could never
/// see or release it.
fn require_shared_backend(backend: LeaseBackend) -> Result<()> {
    if backend == LeaseBackend::Memory {
        bail!(
            "Lease commands need the data_attribute backend: set OUTLINE_LEASE_ATTRIBUTE_ID \
             against a server that supports data attributes"
        );
    }
    Ok(())
}

fn parse_ttl(raw: Option<&str>) -> Result<Option<i64>, LeaseError> {
    raw.map(parse_ttl_seconds).transpose()
}

fn print_lease(lease: &LeaseRecord) -> Result<(), LeaseError> {
    let json = serde_json::to_string_pretty(lease)
        .map_err(|e| LeaseError::Encoding(e.to_string()))?;
    println!("{json}");
    Ok(())
}

/// Conflicts print the structured payload so scripts can read the holder.
fn render_error(err: &LeaseError) -> String {
    match err {
        LeaseError::Conflict { .. } => {
            serde_json::to_string_pretty(&err.to_payload()).unwrap_or_else(|_| err.to_string())
        }
        _ => err.to_string().red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrelay_lease::domain::lease::expiry_after;

    #[test]
    fn test_action_classes() {
        let status = LeaseCommand::Status {
            document_id: "doc-1".to_string(),
        };
        let release = LeaseCommand::Release {
            document_id: "doc-1".to_string(),
            token: "t".to_string(),
        };
        assert_eq!(status.action(), AllowedAction::Read);
        assert_eq!(release.action(), AllowedAction::Write);
    }

    #[test]
    fn test_memory_backend_rejected() {
        let err = require_shared_backend(LeaseBackend::Memory).unwrap_err();
        assert!(err.to_string().contains("OUTLINE_LEASE_ATTRIBUTE_ID"));
        assert!(require_shared_backend(LeaseBackend::DataAttribute).is_ok());
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl(None).unwrap(), None);
        assert_eq!(parse_ttl(Some("600")).unwrap(), Some(600));
        assert!(matches!(
            parse_ttl(Some("ten")),
            Err(LeaseError::Validation(_))
        ));
    }

    #[test]
    fn test_conflict_renders_existing_lease() {
        let now = chrono::Utc::now();
        let existing = LeaseRecord {
            document_id: "doc-1".to_string(),
            agent_id: "agent-a".to_string(),
            lease_token: "token-a".to_string(),
            reason: None,
            acquired_at: now,
            expires_at: expiry_after(now, 60).unwrap(),
            backend: LeaseBackend::Memory,
        };
        let err = LeaseError::Conflict {
            existing: Box::new(existing),
        };

        let rendered: serde_json::Value = serde_json::from_str(&render_error(&err)).unwrap();
        assert_eq!(rendered["ok"], false);
        assert_eq!(rendered["error"], "LEASE_CONFLICT");
        assert_eq!(rendered["existingLease"]["agentId"], "agent-a");
    }
}
