// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # docrelay CLI
//!
//! The `docrelay` binary drives a single Outline workspace: it wires the
//! resilient API client, runs the capability probe, selects a lease backend
//! and then executes one command.
//!
//! ## Commands
//!
//! - `docrelay config show|validate|generate` - Configuration management
//! - `docrelay capabilities` - Report which optional server features are usable
//! - `docrelay call <ENDPOINT> [JSON]` - Raw RPC through the retrying client
//! - `docrelay read <URI>` - Read an `outline://` resource
//! - `docrelay lease acquire|renew|release|status` - Advisory document leases (data attribute backend)
//! - `docrelay export collection|status|redirect` - Start a collection export, poll it, resolve its download URL

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use docrelay_cli::commands::{self, CallArgs, ConfigCommand, ExportCommand, LeaseCommand};

/// docrelay - Outline access for cooperating agents
#[derive(Parser)]
#[command(name = "docrelay")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "DOCRELAY_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DOCRELAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Probe optional Outline endpoints
    #[command(name = "capabilities")]
    Capabilities,

    /// Call an Outline API endpoint
    #[command(name = "call")]
    Call {
        #[command(flatten)]
        args: CallArgs,
    },

    /// Read an outline:// resource
    #[command(name = "read")]
    Read {
        /// Resource URI, e.g. outline://document/<id>
        #[arg(value_name = "URI")]
        uri: String,
    },

    /// Document lease operations
    #[command(name = "lease")]
    Lease {
        #[command(subcommand)]
        command: LeaseCommand,
    },

    /// Collection export helpers
    #[command(name = "export")]
    Export {
        #[command(subcommand)]
        command: ExportCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Capabilities) => commands::capabilities::handle_command(cli.config).await,
        Some(Commands::Call { args }) => commands::call::handle_command(args, cli.config).await,
        Some(Commands::Read { uri }) => commands::resource::handle_command(&uri, cli.config).await,
        Some(Commands::Lease { command }) => {
            commands::lease::handle_command(command, cli.config).await
        }
        Some(Commands::Export { command }) => {
            commands::export::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
