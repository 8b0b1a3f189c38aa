mod openai;

pub use openai::OpenAiStoryClient;

use async_trait::async_trait;

use crate::{error::GenerationError, messages::ChatMessage};

/// Outcome of a successful generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Content of the first choice.
    Story(String),
    /// The reply was well-formed but carried no choice.
    NoContent,
}

impl Generation {
    pub fn story(&self) -> Option<&str> {
        match self {
            Generation::Story(story) => Some(story),
            Generation::NoContent => None,
        }
    }
}

/// Turns a conversation into a story.
///
/// Note for async_trait: the composer holds generators as `Arc<dyn StoryGenerator>`,
/// so the trait must stay dyn-compatible.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// Send the whole ordered history and return the first completion.
    ///
    /// Implementations hold no state between calls and never retry.
    async fn generate_story(&self, messages: &[ChatMessage]) -> Result<Generation, GenerationError>;
}
