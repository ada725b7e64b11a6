//! The send exchange and PDF export

use minerva_core::config::CredentialsConfig;
use minerva_core::session::{Message, SessionStore};
use minerva_providers::{BackendError, ChatBackend, ChatRequest, PdfRequest, Provider};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for a send exchange
#[derive(Error, Debug)]
pub enum SendError {
    /// Both the provider API key and the search API key must be set.
    /// Returned before anything is appended or sent.
    #[error("missing credentials: set both the provider API key and the search API key")]
    MissingCredentials,

    /// The relay call failed; a synthesized error notice was appended to
    /// the transcript in place of a reply.
    #[error("{0}")]
    Backend(#[from] BackendError),
}

/// Error type for a PDF export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("nothing to export: the conversation is empty")]
    EmptyConversation,

    #[error("{0}")]
    Backend(#[from] BackendError),
}

/// Runs exchanges against the relay and keeps the session store current.
///
/// One exchange at a time: the caller must not start a second send until
/// the previous one resolved.
pub struct ChatClient {
    backend: Arc<dyn ChatBackend>,
}

impl ChatClient {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Run one request/response exchange for `session_id`.
    ///
    /// The user's message is appended and persisted before the relay call.
    /// On success the reply is appended and persisted and its content
    /// returned. On failure a notice reading `Error: ...` is appended and
    /// persisted instead, and the error returned; the user's message stays.
    pub async fn send(
        &self,
        store: &mut SessionStore,
        session_id: &str,
        prompt: &str,
        credentials: &CredentialsConfig,
        provider: Provider,
    ) -> Result<String, SendError> {
        if !credentials.complete() {
            return Err(SendError::MissingCredentials);
        }

        let mut transcript = store.messages_of(session_id);
        transcript.push(Message::user(prompt));
        store.update_messages(session_id, transcript.clone(), true);

        let endpoint = provider.endpoint();
        let request = ChatRequest {
            message: prompt.to_string(),
            session_id: session_id.to_string(),
            openai_api_key: credentials.api_key.clone(),
            tavily_api_key: credentials.search_key.clone(),
            base_url: endpoint.base_url.to_string(),
            model: endpoint.model.to_string(),
        };

        debug!("Sending exchange for session {} via {}", session_id, provider);

        match self.backend.chat(&request).await {
            Ok(reply) => {
                transcript.push(Message::assistant(reply.content.clone()));
                store.update_messages(session_id, transcript, true);
                Ok(reply.content)
            }
            Err(e) => {
                warn!("Exchange failed for session {}: {}", session_id, e);
                transcript.push(Message::assistant(format!("Error: {}", e)));
                store.update_messages(session_id, transcript, true);
                Err(SendError::Backend(e))
            }
        }
    }

    /// Render the transcript of `session_id` to PDF bytes via the relay
    pub async fn export(
        &self,
        store: &SessionStore,
        session_id: &str,
        title: &str,
    ) -> Result<Vec<u8>, ExportError> {
        let messages = store.messages_of(session_id);
        if messages.is_empty() {
            return Err(ExportError::EmptyConversation);
        }

        let request = PdfRequest {
            session_id: session_id.to_string(),
            title: title.to_string(),
            messages,
        };
        Ok(self.backend.export_pdf(&request).await?)
    }
}
