// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use docrelay_core::domain::config::{LeaseBackend, RelayConfig};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./docrelay-config.yaml)
        #[arg(short, long, default_value = "./docrelay-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(&output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = RelayConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. DOCRELAY_CONFIG_PATH: {}",
            std::env::var("DOCRELAY_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./docrelay-config.yaml");
        println!("  4. ~/.docrelay/config.yaml");
        println!("  5. /etc/docrelay/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    let outline = &config.spec.outline;
    println!("{}", "Outline:".bold());
    println!("  Base URL: {}", outline.base_url);
    println!(
        "  API key: {}",
        if outline.api_key.is_some() {
            "(set)".normal()
        } else {
            "(not set)".yellow()
        }
    );
    println!("  Request timeout: {} ms", outline.request_timeout_ms);
    println!(
        "  Retries: {} (base delay {} ms)",
        outline.retry_count, outline.retry_base_delay_ms
    );
    println!("  Capability probe: {}", outline.enable_capability_probe);
    println!();

    let actions: Vec<&str> = config
        .spec
        .allowed_actions
        .iter()
        .map(|action| action.as_str())
        .collect();
    println!("{}", "Allowed actions:".bold());
    println!("  {}", actions.join(", "));
    println!();

    let lease = &config.spec.lease;
    println!("{}", "Leases:".bold());
    println!("  Strategy: {:?}", lease.strategy);
    println!(
        "  Attribute ID: {}",
        lease.attribute_id.as_deref().unwrap_or("(none)")
    );
    println!(
        "  TTL: default {}s, max {}s",
        lease.default_ttl_seconds, lease.max_ttl_seconds
    );

    // Resolution needs an API key; without one there is nothing more to report.
    if let Ok(resolved) = config.resolve() {
        println!("  Resolved backend: {}", resolved.lease.backend);
        if resolved.lease.backend == LeaseBackend::Memory {
            println!(
                "  {}",
                "Memory leases are per-process and are lost on restart".yellow()
            );
        }
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config =
        RelayConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: &Path, with_examples: bool) -> Result<()> {
    write_sample(output, with_examples)?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn write_sample(output: &Path, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))
}
