//! Configuration schema definitions

use crate::utils::expand_tilde;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration for minerva
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chat relay settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// API credentials forwarded to the relay
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Local storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chat relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the relay backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Selected provider key (see the registry labels)
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            provider: default_provider(),
        }
    }
}

/// API credentials forwarded to the relay with every exchange.
///
/// Both keys may be empty in the file; sending enforces that both are set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    /// Provider API key
    #[serde(default)]
    pub api_key: String,
    /// Tavily search API key
    #[serde(default)]
    pub search_key: String,
}

impl CredentialsConfig {
    /// True when both keys are non-empty
    pub fn complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.search_key.trim().is_empty()
    }
}

/// Local storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sessions document
    #[serde(default = "default_storage_dir")]
    pub dir: String,
}

fn default_storage_dir() -> String {
    "~/.minerva".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

impl StorageConfig {
    /// Path of the sessions document
    pub fn sessions_path(&self) -> PathBuf {
        expand_tilde(&self.dir).join("sessions.json")
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "~/.minerva/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}
