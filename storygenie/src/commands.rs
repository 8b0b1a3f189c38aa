use std::sync::Arc;

use anyhow::{Context, bail};
use config::Config;
use jiff::{Timestamp, tz::TimeZone};
use story::{FavoritesStore, FileStore, Library, OpenAiStoryClient, Phase, StoryComposer};

/// Runs one generation and prints the outcome. Returns `false` when generation failed.
pub(crate) async fn generate(config: &Config, prompt: &str, save: bool) -> anyhow::Result<bool> {
    let client = OpenAiStoryClient::new(&config.openai)?;
    let mut composer = StoryComposer::new(Arc::new(client));

    if let Some(prefix) = config.story.prompt_prefix() {
        composer = composer.with_prompt_prefix(prefix);
    }

    composer.set_prompt(prompt);

    let Some(handle) = composer.generate() else {
        bail!("The story prompt is empty");
    };

    log::info!("Generating a story with {}", config.openai.model);

    tokio::select! {
        result = handle => result.context("Generation task failed")?,
        Ok(()) = tokio::signal::ctrl_c() => {
            composer.dismiss();
            log::info!("Generation cancelled");

            return Ok(false);
        }
    }

    let state = composer.state();

    let Phase::Finished(outcome) = &state.phase else {
        bail!("Generation ended without an outcome");
    };

    println!("{}", outcome.display_text());

    if save {
        match composer.favorite() {
            Some(favorite) => {
                let saved = FavoritesStore::open(favorites_storage(config)).and_then(|mut store| store.add(favorite));

                match saved {
                    Ok(()) => log::info!("Story saved to favorites"),
                    Err(e) => log::error!("Failed to save favorite story: {e}"),
                }
            }
            None => log::warn!("No story to save"),
        }
    }

    Ok(!outcome.is_failure())
}

pub(crate) fn favorites(config: &Config) -> anyhow::Result<()> {
    let mut store = FavoritesStore::open(favorites_storage(config)).context("Failed to open favorites")?;
    let favorites = store.reload()?;

    if favorites.is_empty() {
        println!("No favorite stories yet.");
        return Ok(());
    }

    for favorite in favorites {
        println!("{}", preview(favorite.content()));
        println!("Created on: {}", created_on(favorite.created_at()));
        println!();
    }

    Ok(())
}

pub(crate) fn stories(config: &Config) {
    for story in library(config).stories() {
        println!("{}", story.title());
    }
}

pub(crate) fn read(config: &Config, title: &str) -> anyhow::Result<()> {
    let library = library(config);

    let Some(story) = library.find(title) else {
        bail!("No story titled '{title}'");
    };

    println!("{}\n", story.title());
    println!("{}", story.content());

    Ok(())
}

fn favorites_storage(config: &Config) -> FileStore {
    FileStore::new(&config.favorites.path)
}

/// Bundled stories, then stories from the configured directory, then favorites.
fn library(config: &Config) -> Library {
    let mut library = Library::builtin();

    if let Some(dir) = &config.library.path {
        match Library::load_dir(dir) {
            Ok(loaded) => library.extend(loaded.stories().iter().cloned()),
            Err(e) => log::warn!("Failed to read stories from {}: {e}", dir.display()),
        }
    }

    match FavoritesStore::open(favorites_storage(config)) {
        Ok(store) => library.extend(store.favorites().iter().map(|favorite| favorite.to_story())),
        Err(e) => log::warn!("Failed to load favorite stories: {e}"),
    }

    library
}

/// First two lines of a story.
fn preview(content: &str) -> String {
    content.lines().take(2).collect::<Vec<_>>().join("\n")
}

fn created_on(timestamp: Timestamp) -> String {
    timestamp.to_zoned(TimeZone::system()).strftime("%b %d, %Y at %H:%M").to_string()
}
