// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `docrelay read <URI>`
//!
//! | URI | Endpoint | Output |
//! |-----|----------|--------|
//! | `outline://collection/{id}` | `collections.info` | metadata list |
//! | `outline://collection/{id}/tree` | `collections.documents` | indented tree |
//! | `outline://collection/{id}/documents` | `documents.list` | flat list |
//! | `outline://document/{id}` | `documents.info` | markdown body |
//! | `outline://document/{id}/backlinks` | `documents.list` (`backlinkDocumentId`) | flat list |

use anyhow::{Context, Result};
use std::path::PathBuf;

use docrelay_core::domain::config::AllowedAction;
use docrelay_core::domain::document::{Collection, Document, DocumentNode, ListDocumentsRequest};
use docrelay_core::domain::resource::ResourceUri;
use docrelay_core::infrastructure::OutlineClient;

use crate::bootstrap::RelayContext;

const PAGE_LIMIT: u32 = 100;

pub async fn handle_command(uri: &str, config_override: Option<PathBuf>) -> Result<()> {
    let resource = ResourceUri::parse(uri)?;

    let context = RelayContext::bootstrap(config_override, AllowedAction::Read).await?;

    let text = read(&context.client, &resource)
        .await
        .with_context(|| format!("Failed to read {resource}"))?;
    println!("{text}");
    Ok(())
}

pub async fn read(client: &OutlineClient, resource: &ResourceUri) -> Result<String> {
    let text = match resource {
        ResourceUri::Collection(id) => format_collection(&client.get_collection(id).await?),
        ResourceUri::CollectionTree(id) => {
            let tree = client.get_collection_documents(id).await?;
            if tree.is_empty() {
                "No documents in this collection.".to_string()
            } else {
                format_tree(&tree, 0)
            }
        }
        ResourceUri::CollectionDocuments(id) => {
            let documents = client
                .list_documents(&ListDocumentsRequest {
                    collection_id: Some(id.clone()),
                    limit: Some(PAGE_LIMIT),
                    offset: Some(0),
                    ..Default::default()
                })
                .await?;
            format_document_list(&documents.data)
        }
        ResourceUri::Document(id) => format_markdown(&client.get_document(id).await?),
        ResourceUri::DocumentBacklinks(id) => {
            let backlinks = client
                .list_documents(&ListDocumentsRequest {
                    backlink_document_id: Some(id.clone()),
                    limit: Some(PAGE_LIMIT),
                    offset: Some(0),
                    ..Default::default()
                })
                .await?;
            format_backlinks(&backlinks.data)
        }
    };
    Ok(text)
}

fn format_collection(collection: &Collection) -> String {
    let mut rows = vec![
        format!("# {}", collection.name),
        String::new(),
        format!("- id: {}", collection.id),
        format!(
            "- permission: {}",
            collection
                .permission
                .map_or("unknown", |permission| permission.as_str())
        ),
        format!(
            "- sharing: {}",
            if collection.sharing.unwrap_or(false) {
                "enabled"
            } else {
                "disabled"
            }
        ),
    ];
    if let Some(description) = collection.description.as_deref().filter(|d| !d.is_empty()) {
        rows.push(format!("- description: {description}"));
    }
    if let Some(color) = &collection.color {
        rows.push(format!("- color: {color}"));
    }
    if let Some(updated_at) = &collection.updated_at {
        rows.push(format!("- updated_at: {updated_at}"));
    }
    rows.join("\n")
}

fn format_tree(nodes: &[DocumentNode], depth: usize) -> String {
    let indent = "  ".repeat(depth);
    nodes
        .iter()
        .map(|node| {
            let line = format!("{indent}- {} ({})", node.title, node.id);
            if node.children.is_empty() {
                line
            } else {
                format!("{line}\n{}", format_tree(&node.children, depth + 1))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_document_list(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "No documents.".to_string();
    }
    documents
        .iter()
        .map(|document| match &document.updated_at {
            Some(updated_at) => format!(
                "- {} ({}) | updated_at={}",
                document.title, document.id, updated_at
            ),
            None => format!("- {} ({})", document.title, document.id),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_backlinks(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "No backlinks found.".to_string();
    }
    documents
        .iter()
        .map(|document| format!("- {} ({})", document.title, document.id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_markdown(document: &Document) -> String {
    match document.text.as_deref() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("# {}\n", document.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrelay_core::domain::config::RelayConfig;
    use mockito::Matcher;
    use serde_json::json;

    fn node(id: &str, title: &str, children: Vec<DocumentNode>) -> DocumentNode {
        DocumentNode {
            id: id.to_string(),
            title: title.to_string(),
            children,
            parent_document_id: None,
            updated_at: None,
        }
    }

    fn client(base_url: &str) -> OutlineClient {
        let mut config = RelayConfig::default();
        config.spec.outline.base_url = base_url.to_string();
        config.spec.outline.api_key = Some("test-key".to_string());
        config.spec.outline.retry_count = 0;
        OutlineClient::new(&config.resolve().unwrap()).unwrap()
    }

    #[test]
    fn test_format_tree_indents_children() {
        let tree = vec![
            node("a", "Handbook", vec![node("b", "Onboarding", vec![node("c", "Laptop", vec![])])]),
            node("d", "Runbooks", vec![]),
        ];

        assert_eq!(
            format_tree(&tree, 0),
            "- Handbook (a)\n  - Onboarding (b)\n    - Laptop (c)\n- Runbooks (d)"
        );
    }

    #[tokio::test]
    async fn test_read_document_falls_back_to_title() {
        let mut server = mockito::Server::new_async().await;
        let _info = server
            .mock("POST", "/api/documents.info")
            .match_body(Matcher::Json(json!({"id": "doc-1"})))
            .with_status(200)
            .with_body(json!({"ok": true, "data": {"id": "doc-1", "title": "Empty", "text": ""}}).to_string())
            .create_async()
            .await;

        let text = read(&client(&server.url()), &ResourceUri::Document("doc-1".into()))
            .await
            .unwrap();
        assert_eq!(text, "# Empty\n");
    }

    #[tokio::test]
    async fn test_read_backlinks_filters_by_document() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("POST", "/api/documents.list")
            .match_body(Matcher::Json(json!({
                "backlinkDocumentId": "doc-1",
                "limit": 100,
                "offset": 0
            })))
            .with_status(200)
            .with_body(json!({"ok": true, "data": [{"id": "doc-2", "title": "Referrer"}]}).to_string())
            .create_async()
            .await;

        let text = read(
            &client(&server.url()),
            &ResourceUri::parse("outline://document/doc-1/backlinks").unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(text, "- Referrer (doc-2)");
    }
}
