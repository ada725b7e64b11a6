//! HTTP client for the relay backend

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::api::{ChatReply, ChatRequest, HealthReply, PdfRequest};

/// Error type for relay operations
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned HTTP {0}")]
    Status(StatusCode),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// The relay's three endpoints, behind a trait so tests can fake the server
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST /chat`: run one exchange and return the assistant's reply
    async fn chat(&self, request: &ChatRequest) -> BackendResult<ChatReply>;

    /// `POST /pdf`: render a transcript to PDF bytes
    async fn export_pdf(&self, request: &PdfRequest) -> BackendResult<Vec<u8>>;

    /// `GET /health`: relay liveness and version
    async fn health(&self) -> BackendResult<HealthReply>;
}

/// [`ChatBackend`] over HTTP.
///
/// No timeout and no retry: an exchange is one request awaited to
/// completion, and the caller serializes sends.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::builder()
                .http1_only() // Force HTTP/1.1 to avoid issues with some local servers
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat(&self, request: &ChatRequest) -> BackendResult<ChatReply> {
        let url = format!("{}/chat", self.base_url);
        debug!("POST {} (model {})", url, request.model);

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("bad /chat body: {}", e)))
    }

    async fn export_pdf(&self, request: &PdfRequest) -> BackendResult<Vec<u8>> {
        let url = format!("{}/pdf", self.base_url);
        debug!("POST {} ({} messages)", url, request.messages.len());

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn health(&self) -> BackendResult<HealthReply> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("bad /health body: {}", e)))
    }
}
