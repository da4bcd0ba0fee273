// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! `outline://` resource references.
//!
//! | URI | Resource |
//! |-----|----------|
//! | `outline://collection/{id}` | collection metadata |
//! | `outline://collection/{id}/tree` | document tree |
//! | `outline://collection/{id}/documents` | document listing |
//! | `outline://document/{id}` | document markdown |
//! | `outline://document/{id}/backlinks` | documents linking here |

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const SCHEME: &str = "outline://";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceUriError {
    #[error("INVALID_RESOURCE_URI: {0}")]
    InvalidResourceReference(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceUri {
    Collection(String),
    CollectionTree(String),
    CollectionDocuments(String),
    Document(String),
    DocumentBacklinks(String),
}

impl ResourceUri {
    pub fn parse(uri: &str) -> Result<Self, ResourceUriError> {
        let invalid = |reason: String| ResourceUriError::InvalidResourceReference(reason);

        let path = uri
            .strip_prefix(SCHEME)
            .ok_or_else(|| invalid(format!("unsupported scheme in \"{uri}\"")))?;

        let segments: Vec<&str> = path.split('/').collect();
        let (kind, id, tail) = match segments.as_slice() {
            [kind, id] => (*kind, *id, None),
            [kind, id, tail] => (*kind, *id, Some(*tail)),
            _ => return Err(invalid(format!("unrecognised resource \"{uri}\""))),
        };

        let variable = match kind {
            "collection" => "collection_id",
            "document" => "document_id",
            _ => return Err(invalid(format!("unrecognised resource \"{uri}\""))),
        };
        if id.is_empty() {
            return Err(invalid(format!("missing template variable \"{variable}\"")));
        }
        let id = id.to_string();

        match (kind, tail) {
            ("collection", None) => Ok(Self::Collection(id)),
            ("collection", Some("tree")) => Ok(Self::CollectionTree(id)),
            ("collection", Some("documents")) => Ok(Self::CollectionDocuments(id)),
            ("document", None) => Ok(Self::Document(id)),
            ("document", Some("backlinks")) => Ok(Self::DocumentBacklinks(id)),
            _ => Err(invalid(format!("unrecognised resource \"{uri}\""))),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Collection(id)
            | Self::CollectionTree(id)
            | Self::CollectionDocuments(id)
            | Self::Document(id)
            | Self::DocumentBacklinks(id) => id,
        }
    }
}

impl FromStr for ResourceUri {
    type Err = ResourceUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection(id) => write!(f, "{SCHEME}collection/{id}"),
            Self::CollectionTree(id) => write!(f, "{SCHEME}collection/{id}/tree"),
            Self::CollectionDocuments(id) => write!(f, "{SCHEME}collection/{id}/documents"),
            Self::Document(id) => write!(f, "{SCHEME}document/{id}"),
            Self::DocumentBacklinks(id) => write!(f, "{SCHEME}document/{id}/backlinks"),
        }
    }
}
