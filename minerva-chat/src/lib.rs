//! Chat exchange orchestration for minerva
//!
//! One exchange per send: check credentials, persist the user's message,
//! call the relay, persist the reply or a synthesized error notice. The
//! user's message is durable before the network is touched and is never
//! rolled back.

pub mod client;

pub use client::{ChatClient, ExportError, SendError};
