//! Wire types for the relay backend
//!
//! Field names are the relay's API contract; do not rename them.

use minerva_core::session::Message;
use serde::{Deserialize, Serialize};

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The user's prompt text
    pub message: String,
    /// Id of the conversation this exchange belongs to
    pub session_id: String,
    /// Provider API key, passed through to the upstream call
    pub openai_api_key: String,
    /// Tavily search API key used by the relay's research step
    pub tavily_api_key: String,
    /// Provider base URL
    pub base_url: String,
    /// Provider model name
    pub model: String,
}

/// Body of a successful `POST /chat` response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub content: String,
}

/// Body of `POST /pdf`
#[derive(Debug, Clone, Serialize)]
pub struct PdfRequest {
    pub session_id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReply {
    pub status: String,
    pub version: String,
}
