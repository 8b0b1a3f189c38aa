mod input;
mod output;

use std::error::Error as _;

use async_trait::async_trait;
use config::OpenAiConfig;
use reqwest::{Client, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use self::{input::OpenAIRequest, output::OpenAIResponse};

use crate::{
    error::GenerationError,
    generator::{Generation, StoryGenerator},
    messages::ChatMessage,
};

const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Story generator backed by an OpenAI-compatible chat-completion endpoint.
pub struct OpenAiStoryClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl OpenAiStoryClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            log::error!("Failed to create HTTP client for story generation: {e}");
            GenerationError::Transport(describe(&e))
        })?;

        let base_url = config
            .base_url
            .as_ref()
            .map(|url| url.as_str().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string());

        Ok(Self {
            client,
            url: format!("{base_url}/chat/completions"),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// The endpoint requests are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl StoryGenerator for OpenAiStoryClient {
    async fn generate_story(&self, messages: &[ChatMessage]) -> Result<Generation, GenerationError> {
        if messages.is_empty() {
            return Err(GenerationError::EmptyConversation);
        }

        let request = OpenAIRequest::new(&self.model, messages);

        log::debug!(
            "Requesting story from {} with model {} and {} messages",
            self.url,
            self.model,
            messages.len()
        );

        let mut request_builder = self.client.post(&self.url);

        match &self.api_key {
            Some(key) => {
                request_builder = request_builder.header(AUTHORIZATION, format!("Bearer {}", key.expose_secret()));
            }
            None => log::debug!("No API key configured, sending request without authorization"),
        }

        let response = request_builder
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("Failed to send request: {}", describe(&e))))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Chat-completion API error ({status}): {error_text}");

            let message = if error_text.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                error_text
            };

            return Err(GenerationError::Server {
                status: status.as_u16(),
                message,
            });
        }

        // First get the response as text to log if parsing fails
        let response_text = response.text().await.map_err(|e| {
            log::error!("Failed to read chat-completion response body: {e}");
            GenerationError::Transport(format!("Failed to read response: {}", describe(&e)))
        })?;

        let response: OpenAIResponse = sonic_rs::from_str(&response_text).map_err(|e| {
            log::error!("Failed to parse chat-completion response: {e}");
            log::debug!("Raw response that failed to parse: {response_text}");
            GenerationError::Decoding(e.to_string())
        })?;

        let generation = Generation::from(response);

        if generation == Generation::NoContent {
            log::warn!("Chat-completion response contained no choices");
        }

        Ok(generation)
    }
}

/// Flattens an error and its sources into one line. reqwest hides the
/// interesting part (refused connection, DNS failure) in the source chain.
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        let cause_text = cause.to_string();

        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }

        source = cause.source();
    }

    message
}
