use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::Comic;
use crate::storage::KeyValueStore;

pub const FAVORITES_KEY: &str = "favorites";
pub const CLEAR_PROMPT: &str = "Are you sure you want to clear all favorites?";

/// Yes/no gate in front of destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Favorite comics keyed by id. Stored in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet {
    comics: Vec<Comic>,
}

impl FavoriteSet {
    /// Build a set, keeping the first occurrence of each id.
    pub fn from_comics(comics: impl IntoIterator<Item = Comic>) -> Self {
        let mut seen = HashSet::new();
        let comics = comics.into_iter().filter(|c| seen.insert(c.id)).collect();
        FavoriteSet { comics }
    }

    pub fn contains(&self, comic_id: i64) -> bool {
        self.comics.iter().any(|c| c.id == comic_id)
    }

    pub fn get(&self, comic_id: i64) -> Option<&Comic> {
        self.comics.iter().find(|c| c.id == comic_id)
    }

    pub fn len(&self) -> usize {
        self.comics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comic> {
        self.comics.iter()
    }

    /// Copy of the set with `comic` removed if present by id, added otherwise.
    pub fn toggled(&self, comic: Comic) -> FavoriteSet {
        let mut comics = self.comics.clone();
        if let Some(pos) = comics.iter().position(|c| c.id == comic.id) {
            comics.remove(pos);
        } else {
            comics.push(comic);
        }
        FavoriteSet { comics }
    }

    /// Alphabetical by title, letter case only breaking ties (lowercase
    /// first). Identical titles keep storage order.
    pub fn sorted_by_title(&self) -> Vec<&Comic> {
        let mut sorted: Vec<&Comic> = self.comics.iter().collect();
        sorted.sort_by(|a, b| compare_titles(&a.title, &b.title));
        sorted
    }
}

/// Dictionary order: case-insensitive first, then lowercase before uppercase.
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Persisted favorites. Every mutation writes the whole set before the
/// in-memory copy changes, so a failed write leaves both sides as they were.
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStore>,
    favorites: FavoriteSet,
}

impl FavoritesStore {
    /// Read the persisted set. Missing or unreadable data starts an empty set.
    #[tracing::instrument(level = "debug", skip(storage))]
    pub async fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let favorites = match storage.get(FAVORITES_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Comic>>(&raw) {
                Ok(comics) => FavoriteSet::from_comics(comics),
                Err(e) => {
                    tracing::warn!(error = %e, "stored favorites are corrupt, starting empty");
                    FavoriteSet::default()
                }
            },
            Ok(None) => FavoriteSet::default(),
            Err(e) => {
                tracing::warn!(error = %format!("{:?}", e), "failed to read favorites, starting empty");
                FavoriteSet::default()
            }
        };
        tracing::debug!(count = favorites.len(), "loaded favorites");
        FavoritesStore { storage, favorites }
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn is_favorite(&self, comic_id: i64) -> bool {
        self.favorites.contains(comic_id)
    }

    pub fn sorted_by_title(&self) -> Vec<&Comic> {
        self.favorites.sorted_by_title()
    }

    #[tracing::instrument(level = "debug", skip(self, comic), fields(comic_id = comic.id))]
    pub async fn toggle(&mut self, comic: Comic) -> anyhow::Result<&FavoriteSet> {
        let next = self.favorites.toggled(comic);
        self.commit(next).await?;
        Ok(&self.favorites)
    }

    /// Empty the set if `confirm` agrees; otherwise nothing changes.
    #[tracing::instrument(level = "debug", skip(self, confirm))]
    pub async fn clear<C>(&mut self, confirm: &C) -> anyhow::Result<&FavoriteSet>
    where
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(CLEAR_PROMPT) {
            tracing::debug!("clear declined");
            return Ok(&self.favorites);
        }
        self.commit(FavoriteSet::default()).await?;
        tracing::info!("favorites cleared");
        Ok(&self.favorites)
    }

    async fn commit(&mut self, next: FavoriteSet) -> anyhow::Result<()> {
        let raw = serde_json::to_string(&next).context("Failed to encode favorites")?;
        self.storage
            .set(FAVORITES_KEY, &raw)
            .await
            .context("Failed to persist favorites")?;
        self.favorites = next;
        Ok(())
    }
}
