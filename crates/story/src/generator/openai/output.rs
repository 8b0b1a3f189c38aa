use serde::Deserialize;

use crate::generator::Generation;

/// Response body of the Chat Completions API.
///
/// `choices` may be missing altogether. That, an empty list, and a first
/// choice without text all become [`Generation::NoContent`].
#[derive(Debug, Deserialize)]
pub(super) struct OpenAIResponse {
    #[serde(default)]
    pub(super) choices: Option<Vec<OpenAIChoice>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIChoice {
    pub(super) message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIResponseMessage {
    #[serde(default)]
    pub(super) content: Option<String>,
}

impl From<OpenAIResponse> for Generation {
    fn from(response: OpenAIResponse) -> Self {
        let content = response
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message.content);

        match content {
            Some(story) if !story.trim().is_empty() => Generation::Story(story),
            _ => Generation::NoContent,
        }
    }
}
