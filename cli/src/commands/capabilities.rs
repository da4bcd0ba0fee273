// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `docrelay capabilities`

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use docrelay_core::domain::capability::{CapabilityState, ServerCapabilities};
use docrelay_core::domain::config::AllowedAction;

use crate::bootstrap::RelayContext;

pub async fn handle_command(config_override: Option<PathBuf>) -> Result<()> {
    let context = RelayContext::bootstrap(config_override, AllowedAction::Read).await?;

    println!("{}", format!("Outline: {}", context.config.base_url).bold());
    if !context.config.capability_probe_enabled {
        println!("{}", "Capability probe disabled; showing defaults".yellow());
    }
    println!();

    for line in render(&context.capabilities) {
        println!("{line}");
    }
    println!();
    println!("Lease backend: {}", context.lease_service.backend());

    Ok(())
}

fn render(capabilities: &ServerCapabilities) -> Vec<String> {
    capabilities
        .iter()
        .map(|(capability, result)| {
            let state = match result.state {
                CapabilityState::Available => "available".green(),
                CapabilityState::Unavailable => "unavailable".red(),
                CapabilityState::Unknown => "unknown".yellow(),
            };
            let status = result
                .status
                .map(|status| status.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!(
                "  {:<14} {:<22} {:<12} status={}",
                capability.name(),
                result.endpoint,
                state,
                status
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrelay_core::domain::capability::{Capability, CapabilityProbeResult};

    #[test]
    fn test_render_lists_every_capability() {
        colored::control::set_override(false);

        let mut capabilities = ServerCapabilities::unknown();
        capabilities.set(
            Capability::Templatize,
            CapabilityProbeResult::from_status("documents.templatize", Some(404)),
        );

        let lines = render(&capabilities);
        assert_eq!(lines.len(), Capability::ALL.len());

        let templatize = lines
            .iter()
            .find(|line| line.contains("templatize "))
            .unwrap();
        assert!(templatize.contains("unavailable"));
        assert!(templatize.ends_with("status=404"));
        assert!(lines.iter().any(|line| line.ends_with("status=-")));
    }
}
