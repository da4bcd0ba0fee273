// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `docrelay call <ENDPOINT> [JSON]`
//!
//! Sends one RPC through the retrying client and prints the envelope. The
//! caller states which action class the call belongs to; it is checked
//! against `allowed_actions` before anything goes on the wire.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

use docrelay_core::domain::api::ApiEnvelope;
use docrelay_core::domain::config::AllowedAction;

use crate::bootstrap::RelayContext;

#[derive(Args)]
pub struct CallArgs {
    /// Endpoint name, e.g. documents.info
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// JSON request body (default: {})
    #[arg(value_name = "JSON")]
    pub body: Option<String>,

    /// Action class of this call (read, write, delete, admin)
    #[arg(long, default_value = "read", value_parser = parse_action)]
    pub action: AllowedAction,
}

pub async fn handle_command(args: CallArgs, config_override: Option<PathBuf>) -> Result<()> {
    let body = parse_body(args.body.as_deref())?;

    let context = RelayContext::bootstrap(config_override, args.action).await?;

    let envelope: ApiEnvelope<Value> = context
        .client
        .call(&args.endpoint, &body)
        .await
        .with_context(|| format!("{} failed", args.endpoint))?;

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn parse_action(raw: &str) -> Result<AllowedAction, String> {
    raw.trim()
        .to_lowercase()
        .parse()
        .map_err(|e: docrelay_core::domain::config::ConfigError| e.to_string())
}

fn parse_body(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Object(Default::default()));
    };
    let body: Value = serde_json::from_str(raw).context("Request body must be valid JSON")?;
    anyhow::ensure!(body.is_object(), "Request body must be a JSON object");
    Ok(body)
}
