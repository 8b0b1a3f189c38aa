use serde::Serialize;

use crate::messages::{ChatMessage, Role};

/// Request body for the Chat Completions API.
///
/// Only the fields StoryGenie sets are modelled; the endpoint applies its own
/// defaults for sampling and length.
#[derive(Debug, Serialize)]
pub(super) struct OpenAIRequest<'a> {
    /// ID of the model to use.
    pub(super) model: &'a str,

    /// The conversation so far, oldest first.
    pub(super) messages: Vec<OpenAIMessage<'a>>,
}

/// A chat message projected to the wire shape.
#[derive(Debug, Serialize)]
pub(super) struct OpenAIMessage<'a> {
    pub(super) role: Role,
    pub(super) content: &'a str,
}

impl<'a> From<&'a ChatMessage> for OpenAIMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: message.role(),
            content: message.content(),
        }
    }
}

impl<'a> OpenAIRequest<'a> {
    pub(super) fn new(model: &'a str, messages: &'a [ChatMessage]) -> Self {
        Self {
            model,
            messages: messages.iter().map(OpenAIMessage::from).collect(),
        }
    }
}
