//! Favorite stories, persisted as one JSON list under a single key.
//!
//! Storage is the source of truth. The in-memory list is a cache that is
//! replaced wholesale by [`FavoritesStore::reload`], and it only changes after
//! the corresponding write has succeeded.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::FavoritesError, library::Story, storage::KeyValueStore};

/// Storage key holding the favorites list.
pub const FAVORITES_KEY: &str = "Favorites";

/// Title shown for favorites in story listings.
pub const FAVORITE_TITLE: &str = "Favorite Story";

/// A generated story the user chose to keep.
///
/// The identifier lives only in memory: it is assigned on construction and
/// again on every load, the persisted record holds `content` and `createdAt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStory {
    #[serde(skip, default = "Uuid::new_v4")]
    id: Uuid,
    content: String,
    created_at: Timestamp,
}

impl FavoriteStory {
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_created_at(content, Timestamp::now())
    }

    pub fn with_created_at(content: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// The favorite as a library entry.
    pub fn to_story(&self) -> Story {
        Story::new(FAVORITE_TITLE, self.content.clone(), self.created_at)
    }
}

/// Owns the favorites storage and its cached contents.
///
/// Every mutation takes `&mut self`, so the single owner serializes all
/// read-modify-write cycles.
#[derive(Debug)]
pub struct FavoritesStore<S> {
    storage: S,
    favorites: Vec<FavoriteStory>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Open the store and load whatever is persisted. A missing key is an empty list.
    pub fn open(storage: S) -> Result<Self, FavoritesError> {
        let favorites = load(&storage)?;

        Ok(Self { storage, favorites })
    }

    /// Replace the cache with the persisted list.
    pub fn reload(&mut self) -> Result<&[FavoriteStory], FavoritesError> {
        self.favorites = load(&self.storage)?;

        Ok(&self.favorites)
    }

    /// Cached favorites, oldest first.
    pub fn favorites(&self) -> &[FavoriteStory] {
        &self.favorites
    }

    /// Append a favorite. The cache is left untouched if the write fails.
    pub fn add(&mut self, favorite: FavoriteStory) -> Result<(), FavoritesError> {
        let mut updated = self.favorites.clone();
        updated.push(favorite);

        self.save(updated)?;
        log::info!("Added favorite, {} stored", self.favorites.len());

        Ok(())
    }

    /// Delete a favorite by identifier. Returns whether one was removed.
    pub fn remove(&mut self, id: Uuid) -> Result<bool, FavoritesError> {
        let updated: Vec<_> = self.favorites.iter().filter(|f| f.id != id).cloned().collect();

        if updated.len() == self.favorites.len() {
            return Ok(false);
        }

        self.save(updated)?;
        log::info!("Removed favorite {id}, {} stored", self.favorites.len());

        Ok(true)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn save(&mut self, updated: Vec<FavoriteStory>) -> Result<(), FavoritesError> {
        let bytes = encode(&updated)?;

        self.storage.set(FAVORITES_KEY, &bytes).inspect_err(|e| {
            log::error!("Failed to save favorites: {e}");
        })?;

        self.favorites = updated;

        Ok(())
    }
}

fn load<S: KeyValueStore>(storage: &S) -> Result<Vec<FavoriteStory>, FavoritesError> {
    match storage.get(FAVORITES_KEY)? {
        Some(bytes) => {
            let favorites = decode(&bytes)?;
            log::debug!("Loaded {} favorites", favorites.len());

            Ok(favorites)
        }
        None => Ok(Vec::new()),
    }
}

/// Serialize a favorites list in the persisted format.
pub fn encode(favorites: &[FavoriteStory]) -> Result<Vec<u8>, FavoritesError> {
    serde_json::to_vec_pretty(favorites).map_err(FavoritesError::Encode)
}

/// Parse a favorites list from the persisted format.
pub fn decode(bytes: &[u8]) -> Result<Vec<FavoriteStory>, FavoritesError> {
    serde_json::from_slice(bytes).map_err(FavoritesError::Decode)
}
