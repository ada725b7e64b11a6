//! Provider registry
//!
//! The supported providers are a closed set. The relay composes its
//! upstream call from a base URL + model pair and those pairs are fixed
//! here, so a provider choice can never mix one provider's URL with
//! another's model. Adding a provider is a code change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A provider's endpoint: base URL and model, always selected together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: &'static str,
    pub model: &'static str,
}

/// The supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    DeepSeek,
    Moonshot,
    Qwen,
}

impl Provider {
    /// Every supported provider, in menu order
    pub const ALL: [Provider; 4] = [
        Provider::OpenAi,
        Provider::DeepSeek,
        Provider::Moonshot,
        Provider::Qwen,
    ];

    /// Canonical key used in configuration
    pub fn key(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::DeepSeek => "deepseek",
            Provider::Moonshot => "moonshot",
            Provider::Qwen => "qwen",
        }
    }

    /// Human-readable label for menus and status output
    pub fn label(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::DeepSeek => "DeepSeek",
            Provider::Moonshot => "Moonshot (Kimi)",
            Provider::Qwen => "Aliyun (Qwen)",
        }
    }

    /// The endpoint pair forwarded to the relay
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Provider::OpenAi => Endpoint {
                base_url: "https://api.openai.com/v1",
                model: "gpt-3.5-turbo",
            },
            Provider::DeepSeek => Endpoint {
                base_url: "https://api.deepseek.com",
                model: "deepseek-chat",
            },
            Provider::Moonshot => Endpoint {
                base_url: "https://api.moonshot.cn/v1",
                model: "moonshot-v1-8k",
            },
            Provider::Qwen => Endpoint {
                base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1",
                model: "qwen-plus",
            },
        }
    }

    /// Resolve a provider from its key or label, case-insensitively
    pub fn from_name(name: &str) -> Option<Provider> {
        let name = name.trim();
        Provider::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(name) || p.label().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_pairs_are_fixed() {
        let openai = Provider::OpenAi.endpoint();
        assert_eq!(openai.base_url, "https://api.openai.com/v1");
        assert_eq!(openai.model, "gpt-3.5-turbo");

        let deepseek = Provider::DeepSeek.endpoint();
        assert_eq!(deepseek.base_url, "https://api.deepseek.com");
        assert_eq!(deepseek.model, "deepseek-chat");

        let moonshot = Provider::Moonshot.endpoint();
        assert_eq!(moonshot.base_url, "https://api.moonshot.cn/v1");
        assert_eq!(moonshot.model, "moonshot-v1-8k");

        let qwen = Provider::Qwen.endpoint();
        assert_eq!(
            qwen.base_url,
            "https://dashscope.aliyuncs.com/compatible-mode/v1"
        );
        assert_eq!(qwen.model, "qwen-plus");
    }

    #[test]
    fn test_from_name_accepts_key_and_label() {
        assert_eq!(Provider::from_name("deepseek"), Some(Provider::DeepSeek));
        assert_eq!(Provider::from_name("DeepSeek"), Some(Provider::DeepSeek));
        assert_eq!(
            Provider::from_name("Moonshot (Kimi)"),
            Some(Provider::Moonshot)
        );
        assert_eq!(Provider::from_name("Aliyun (Qwen)"), Some(Provider::Qwen));
        assert_eq!(Provider::from_name(" openai "), Some(Provider::OpenAi));
        assert_eq!(Provider::from_name("claude"), None);
    }

    #[test]
    fn test_serde_uses_canonical_key() {
        assert_eq!(serde_json::to_string(&Provider::Qwen).unwrap(), "\"qwen\"");
        let parsed: Provider = serde_json::from_str("\"moonshot\"").unwrap();
        assert_eq!(parsed, Provider::Moonshot);
    }

    #[test]
    fn test_every_provider_resolves_by_key() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_name(provider.key()), Some(provider));
        }
    }
}
