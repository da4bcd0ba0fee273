// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Collection export commands
//!
//! Commands: collection, status, redirect

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use docrelay_core::domain::api::RawResponse;
use docrelay_core::domain::config::AllowedAction;
use docrelay_core::domain::document::{ExportCollectionRequest, ExportFormat, FileOperation};

use crate::bootstrap::RelayContext;

#[derive(Subcommand)]
pub enum ExportCommand {
    /// Start exporting a collection
    Collection {
        /// Collection ID
        collection_id: String,

        /// Export format (outline-markdown, json, html)
        #[arg(long, value_parser = parse_format)]
        format: Option<ExportFormat>,
    },

    /// Show the state of an export file operation
    Status {
        /// File operation ID
        file_operation_id: String,
    },

    /// Resolve the download URL of a finished export
    Redirect {
        /// File operation ID
        file_operation_id: String,
    },
}

pub async fn handle_command(
    command: ExportCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    let context = RelayContext::bootstrap(config_override, AllowedAction::Read).await?;
    let client = &context.client;

    match command {
        ExportCommand::Collection {
            collection_id,
            format,
        } => {
            let operation = client
                .export_collection(&ExportCollectionRequest {
                    id: collection_id,
                    format,
                })
                .await
                .context("collections.export failed")?;
            match operation {
                Some(operation) => {
                    println!(
                        "{}",
                        format!("✓ Export started: {}", operation.id).green()
                    );
                    print_operation(&operation);
                }
                None => println!("{}", "Export accepted; no file operation reported".yellow()),
            }
        }
        ExportCommand::Status { file_operation_id } => {
            match client
                .get_file_operation(&file_operation_id)
                .await
                .context("fileOperations.info failed")?
            {
                Some(operation) => print_operation(&operation),
                None => println!(
                    "{}",
                    format!("File operation {file_operation_id} not found").yellow()
                ),
            }
        }
        ExportCommand::Redirect { file_operation_id } => {
            let response = client
                .file_operation_redirect(&file_operation_id)
                .await
                .context("fileOperations.redirect failed")?;
            println!("{}", download_url(&response)?);
        }
    }

    Ok(())
}

fn print_operation(operation: &FileOperation) {
    println!("  ID: {}", operation.id);
    println!("  Type: {:?}", operation.operation_type);
    println!("  State: {:?}", operation.state);
    if let Some(size) = operation.size {
        println!("  Size: {} bytes", size);
    }
}

fn download_url(response: &RawResponse) -> Result<&str> {
    match response.location.as_deref() {
        Some(url) => Ok(url),
        None => bail!(
            "Outline returned status {} without a download location",
            response.status
        ),
    }
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    match raw.trim().to_lowercase().as_str() {
        "outline-markdown" | "markdown" => Ok(ExportFormat::OutlineMarkdown),
        "json" => Ok(ExportFormat::Json),
        "html" => Ok(ExportFormat::Html),
        other => Err(format!(
            "unsupported export format \"{other}\" (expected outline-markdown, json or html)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_requires_location() {
        let redirect = RawResponse {
            status: 302,
            location: Some("https://files.example.com/export.zip".to_string()),
        };
        assert_eq!(
            download_url(&redirect).unwrap(),
            "https://files.example.com/export.zip"
        );

        let pending = RawResponse {
            status: 200,
            location: None,
        };
        assert!(download_url(&pending)
            .unwrap_err()
            .to_string()
            .contains("status 200"));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("markdown").unwrap(), ExportFormat::OutlineMarkdown);
        assert_eq!(parse_format("JSON").unwrap(), ExportFormat::Json);
        assert!(parse_format("pdf").is_err());
    }
}
