//! Core types for minerva
//!
//! This crate provides the session store, configuration, and logging
//! used by all other minerva components.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod utils;

pub use error::{Error, Result};
