//! Provider registry and relay client for minerva
//!
//! The relay backend owns the LLM conversation; this crate owns how we talk
//! to the relay and which provider endpoint/model pair gets forwarded.

pub mod api;
pub mod backend;
pub mod registry;

pub use api::{ChatReply, ChatRequest, HealthReply, PdfRequest};
pub use backend::{BackendError, BackendResult, ChatBackend, HttpBackend};
pub use registry::{Endpoint, Provider};
