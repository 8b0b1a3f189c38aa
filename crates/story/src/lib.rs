//! Story generation, favorites and the story library.
//!
//! The crate is UI-agnostic: front ends drive a [`StoryComposer`] for the
//! "create a story" flow, read a [`Library`], and keep favorites in a
//! [`FavoritesStore`].

pub mod composer;
mod error;
pub mod favorites;
mod generator;
pub mod library;
mod messages;
pub mod storage;

pub use composer::{ComposerState, Phase, StoryComposer, StoryOutcome};
pub use error::{FavoritesError, GenerationError, StorageError};
pub use favorites::{FavoriteStory, FavoritesStore};
pub use generator::{Generation, OpenAiStoryClient, StoryGenerator};
pub use library::{Library, Story};
pub use messages::{ChatMessage, Role};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
