//! Chat-completion API configuration.

use std::time::Duration;

use duration_str::deserialize_duration;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Model requested when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for the hosted chat-completion endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Bearer token for the API. A missing token is not an error here; the
    /// endpoint rejects the request instead.
    pub api_key: Option<SecretString>,

    /// Custom base URL for the API, `https://api.openai.com/v1` when not set.
    pub base_url: Option<Url>,

    /// Model identifier sent with every request.
    pub model: String,

    /// Request timeout.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}
