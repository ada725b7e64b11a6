//! Session management for conversation history
//!
//! All conversations persist together as a single JSON document so one
//! write replaces the whole history (last write wins).

pub mod manager;
pub mod store;

pub use manager::{SessionPatch, SessionStore};
pub use store::{derive_title, Message, Role, Session, DEFAULT_TITLE, TITLE_PREVIEW_CHARS};
