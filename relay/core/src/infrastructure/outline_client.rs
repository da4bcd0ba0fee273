// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Outline API Client - Retrying RPC Adapter
//
// Anti-Corruption Layer for the Outline HTTP API. Every endpoint is a JSON
// POST to `{base_url}/api/{endpoint}` with bearer auth.
//
// Three request modes share one retry policy:
// - `call`: parse and validate the JSON envelope
// - `call_raw`: never follow redirects, report status + Location
// - `probe_endpoint`: never fail, report the final status (or none)
//
// Transport failures and retryable statuses (429, 5xx) are retried up to
// `retry_count` extra times with a linear backoff of
// `(attempt + 1) * retry_base_delay`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LOCATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::api::{is_retryable_status, ApiEnvelope, ApiError, ListResponse, RawResponse};
use crate::domain::capability::EndpointProber;
use crate::domain::config::ResolvedConfig;
use crate::domain::document::{
    Collection, Comment, CreateCommentRequest, Document, DocumentGateway, DocumentNode,
    ExportCollectionRequest, FileOperation, ListCollectionsRequest, ListCommentsRequest,
    ListDocumentsRequest, ListMembershipsRequest, Membership, SearchDocumentsRequest, SearchHit,
    UpdateDocumentRequest,
};

pub struct OutlineClient {
    http: reqwest::Client,
    /// Same settings as `http` but with redirects disabled
    raw_http: reqwest::Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
    retry_count: u32,
    retry_base_delay: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileOperationPayload {
    #[serde(default)]
    file_operation: Option<FileOperation>,
}

#[derive(Serialize)]
struct IdRequest<'a> {
    id: &'a str,
}

impl OutlineClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::upstream(500, format!("Failed to build HTTP client: {e}")))?;
        let raw_http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ApiError::upstream(500, format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            raw_http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
            retry_count: config.retry_count,
            retry_base_delay: config.retry_base_delay,
        })
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint)
    }

    fn encode_body(endpoint: &str, body: &impl Serialize) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|e| {
            ApiError::upstream(
                500,
                format!("Failed to encode request for Outline API endpoint \"{endpoint}\": {e}"),
            )
        })
    }

    async fn send(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
        body: &Value,
        accept_json: bool,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = client
            .post(self.endpoint_url(endpoint))
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(body);
        if accept_json {
            request = request.header(ACCEPT, "application/json");
        }
        request.send().await
    }

    /// Sleep before attempt `attempt + 1`.
    async fn backoff(&self, endpoint: &str, attempt: u32, reason: impl fmt::Display) {
        let delay = self.retry_base_delay * (attempt + 1);
        warn!(
            "Outline API endpoint '{}' failed (attempt {}/{}): {}. Retrying in {:?}",
            endpoint,
            attempt + 1,
            self.retry_count + 1,
            reason,
            delay
        );
        tokio::time::sleep(delay).await;
    }

    /// POST `body` to `endpoint` and return the validated envelope.
    pub async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let body = Self::encode_body(endpoint, body)?;
        let mut attempt = 0;

        loop {
            let response = match self.send(&self.http, endpoint, &body, true).await {
                Ok(response) => response,
                Err(e) => {
                    if attempt < self.retry_count {
                        self.backoff(endpoint, attempt, &e).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(ApiError::transport(endpoint, e));
                }
            };

            let status = response.status();
            // Unreadable or non-JSON bodies are treated as absent
            let payload = response.json::<Value>().await.ok();

            if !status.is_success() {
                let status = status.as_u16();
                if is_retryable_status(status) && attempt < self.retry_count {
                    self.backoff(endpoint, attempt, format!("status {status}")).await;
                    attempt += 1;
                    continue;
                }

                let message = payload
                    .as_ref()
                    .and_then(|p| p.get("error"))
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or_else(|| {
                        format!("Outline API endpoint \"{endpoint}\" failed with status {status}")
                    });
                return Err(ApiError::from_status(status, message));
            }

            let Some(Value::Object(map)) = payload else {
                return Err(ApiError::invalid_response());
            };

            if map.get("ok") == Some(&Value::Bool(false)) {
                let status = map
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|s| u16::try_from(s).ok())
                    .unwrap_or(status.as_u16());

                if is_retryable_status(status) && attempt < self.retry_count {
                    self.backoff(endpoint, attempt, format!("ok=false, status {status}"))
                        .await;
                    attempt += 1;
                    continue;
                }

                let message = ["error", "message"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("Outline API endpoint \"{endpoint}\" returned ok=false"));
                return Err(ApiError::from_status(status, message));
            }

            return serde_json::from_value(Value::Object(map)).map_err(|e| {
                ApiError::upstream(
                    502,
                    format!("Unexpected response shape from Outline API endpoint \"{endpoint}\": {e}"),
                )
            });
        }
    }

    /// POST without following redirects. Any final status >= 400 fails.
    pub async fn call_raw(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<RawResponse, ApiError> {
        let body = Self::encode_body(endpoint, body)?;
        let mut attempt = 0;

        loop {
            let response = match self.send(&self.raw_http, endpoint, &body, false).await {
                Ok(response) => response,
                Err(e) => {
                    if attempt < self.retry_count {
                        self.backoff(endpoint, attempt, &e).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(ApiError::transport(endpoint, e));
                }
            };

            let status = response.status().as_u16();
            if is_retryable_status(status) && attempt < self.retry_count {
                self.backoff(endpoint, attempt, format!("status {status}")).await;
                attempt += 1;
                continue;
            }

            if status >= 400 {
                return Err(ApiError::from_status(
                    status,
                    format!("Outline API endpoint \"{endpoint}\" failed with status {status}"),
                ));
            }

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            return Ok(RawResponse { status, location });
        }
    }

    async fn probe(&self, endpoint: &str, body: &Value) -> Option<u16> {
        let mut attempt = 0;

        loop {
            match self.send(&self.http, endpoint, body, true).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if is_retryable_status(status) && attempt < self.retry_count {
                        self.backoff(endpoint, attempt, format!("status {status}")).await;
                        attempt += 1;
                        continue;
                    }
                    debug!("Probe of '{}' finished with status {}", endpoint, status);
                    return Some(status);
                }
                Err(e) => {
                    if attempt < self.retry_count {
                        self.backoff(endpoint, attempt, &e).await;
                        attempt += 1;
                        continue;
                    }
                    debug!("Probe of '{}' got no response: {}", endpoint, e);
                    return None;
                }
            }
        }
    }

    fn list<T>(envelope: ApiEnvelope<Vec<T>>) -> ListResponse<T> {
        ListResponse::from(envelope)
    }

    fn required<T>(envelope: ApiEnvelope<T>, what: &str) -> Result<T, ApiError> {
        envelope.data.ok_or_else(|| ApiError::missing_payload(what))
    }

    // ========================================================================
    // Typed operations
    // ========================================================================

    pub async fn list_collections(
        &self,
        request: &ListCollectionsRequest,
    ) -> Result<ListResponse<Collection>, ApiError> {
        self.call("collections.list", request).await.map(Self::list)
    }

    pub async fn get_collection(&self, id: &str) -> Result<Collection, ApiError> {
        let envelope = self.call("collections.info", &IdRequest { id }).await?;
        Self::required(envelope, "collection")
    }

    /// Nested document tree of a collection; empty when the server sends no data.
    pub async fn get_collection_documents(&self, id: &str) -> Result<Vec<DocumentNode>, ApiError> {
        let envelope: ApiEnvelope<Vec<DocumentNode>> =
            self.call("collections.documents", &IdRequest { id }).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        let envelope = self.call("documents.info", &IdRequest { id }).await?;
        Self::required(envelope, "document")
    }

    pub async fn list_documents(
        &self,
        request: &ListDocumentsRequest,
    ) -> Result<ListResponse<Document>, ApiError> {
        self.call("documents.list", request).await.map(Self::list)
    }

    pub async fn search_documents(
        &self,
        request: &SearchDocumentsRequest,
    ) -> Result<ListResponse<SearchHit>, ApiError> {
        self.call("documents.search", request).await.map(Self::list)
    }

    pub async fn update_document(
        &self,
        request: &UpdateDocumentRequest,
    ) -> Result<Document, ApiError> {
        let envelope = self.call("documents.update", request).await?;
        Self::required(envelope, "updated document")
    }

    pub async fn list_document_memberships(
        &self,
        request: &ListMembershipsRequest,
    ) -> Result<ListResponse<Membership>, ApiError> {
        self.call("documents.memberships", request).await.map(Self::list)
    }

    pub async fn list_collection_memberships(
        &self,
        request: &ListMembershipsRequest,
    ) -> Result<ListResponse<Membership>, ApiError> {
        self.call("collections.memberships", request).await.map(Self::list)
    }

    pub async fn list_comments(
        &self,
        request: &ListCommentsRequest,
    ) -> Result<ListResponse<Comment>, ApiError> {
        self.call("comments.list", request).await.map(Self::list)
    }

    pub async fn create_comment(&self, request: &CreateCommentRequest) -> Result<Comment, ApiError> {
        let envelope = self.call("comments.create", request).await?;
        Self::required(envelope, "created comment")
    }

    /// Starts an export; `None` when the server did not report a file operation.
    pub async fn export_collection(
        &self,
        request: &ExportCollectionRequest,
    ) -> Result<Option<FileOperation>, ApiError> {
        let envelope: ApiEnvelope<FileOperationPayload> =
            self.call("collections.export", request).await?;
        Ok(envelope.data.and_then(|payload| payload.file_operation))
    }

    pub async fn get_file_operation(&self, id: &str) -> Result<Option<FileOperation>, ApiError> {
        let envelope = self.call("fileOperations.info", &IdRequest { id }).await?;
        Ok(envelope.data)
    }

    /// Download location of a finished export, read from the redirect.
    pub async fn file_operation_redirect(&self, id: &str) -> Result<RawResponse, ApiError> {
        self.call_raw("fileOperations.redirect", &IdRequest { id }).await
    }
}

#[async_trait]
impl EndpointProber for OutlineClient {
    async fn probe_endpoint(&self, endpoint: &str, body: Value) -> Option<u16> {
        self.probe(endpoint, &body).await
    }
}

#[async_trait]
impl DocumentGateway for OutlineClient {
    async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        OutlineClient::get_document(self, id).await
    }

    async fn update_document(&self, request: UpdateDocumentRequest) -> Result<Document, ApiError> {
        OutlineClient::update_document(self, &request).await
    }
}
