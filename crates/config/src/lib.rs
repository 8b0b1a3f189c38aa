//! StoryGenie configuration structures to map the storygenie.toml configuration.

#![deny(missing_docs)]

mod loader;
mod openai;

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

pub use openai::{DEFAULT_MODEL, OpenAiConfig};
use serde::Deserialize;

/// Main configuration structure for the StoryGenie application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Chat-completion API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Local favorites storage settings.
    #[serde(default)]
    pub favorites: FavoritesConfig,
    /// Story library settings.
    #[serde(default)]
    pub library: LibraryConfig,
    /// Story prompt settings.
    #[serde(default)]
    pub story: StoryConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }
}

/// Where favorite stories are persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FavoritesConfig {
    /// Directory backing the key-value store that holds the favorites.
    pub path: PathBuf,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./.storygenie"),
        }
    }
}

/// Bundled story library settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    /// Optional directory of `.txt` stories, title on the first line.
    pub path: Option<PathBuf>,
}

/// Settings for how a user prompt becomes a chat message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoryConfig {
    /// Sentence the user prompt completes, e.g. "Can you generate a children story about".
    /// Empty by default, which sends the prompt as-is.
    pub prompt_prefix: Cow<'static, str>,
}

impl StoryConfig {
    /// The prompt prefix, or `None` when disabled.
    pub fn prompt_prefix(&self) -> Option<&str> {
        let prefix = self.prompt_prefix.trim();
        (!prefix.is_empty()).then_some(prefix)
    }
}
