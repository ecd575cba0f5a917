//! Feed of recent comics, grown one random batch at a time.
//!
//! Each round asks the upstream for a batch at a random offset (newest
//! modified first), shuffles it, and appends the displayable comics the feed
//! has not seen yet. The random offset and the shuffle both exist for
//! variety; neither is meant to be unpredictable in a security sense, so the
//! RNG can be seeded and the shuffle switched off.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::domain::Comic;
use crate::marvel_client::ComicSource;

pub const DEFAULT_BATCH_SIZE: u32 = 10;
pub const MAX_RANDOM_OFFSET: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// This many new comics were appended.
    Appended(usize),
    /// The round finished but added nothing: every comic was a duplicate or
    /// had no image, or the fetch failed.
    NothingNew,
    /// Another round was still in flight; nothing was fetched.
    AlreadyInProgress,
}

impl RoundOutcome {
    pub fn appended(&self) -> usize {
        match self {
            RoundOutcome::Appended(n) => *n,
            _ => 0,
        }
    }
}

struct FeedState {
    comics: Vec<Comic>,
    seen: HashSet<i64>,
    rng: StdRng,
    shuffle: bool,
    /// Bumped by `reset`; a round that straddles a reset drops its batch.
    generation: u64,
}

impl FeedState {
    fn append_new(&mut self, batch: Vec<Comic>) -> usize {
        let FeedState { comics, seen, .. } = self;
        let before = comics.len();
        comics.extend(
            batch
                .into_iter()
                .filter(|c| c.is_displayable() && seen.insert(c.id)),
        );
        comics.len() - before
    }
}

pub struct FeedAccumulator<S> {
    source: S,
    batch_size: u32,
    state: Mutex<FeedState>,
    loading: AtomicBool,
}

/// Clears the loading flag when a round ends, however it ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadingGuard(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: ComicSource> FeedAccumulator<S> {
    pub fn new(source: S) -> Self {
        FeedAccumulator {
            source,
            batch_size: DEFAULT_BATCH_SIZE,
            state: Mutex::new(FeedState {
                comics: Vec::new(),
                seen: HashSet::new(),
                rng: StdRng::from_entropy(),
                shuffle: true,
                generation: 0,
            }),
            loading: AtomicBool::new(false),
        }
    }

    pub fn with_rng(self, rng: StdRng) -> Self {
        self.lock().rng = rng;
        self
    }

    pub fn with_shuffle(self, shuffle: bool) -> Self {
        self.lock().shuffle = shuffle;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Append the displayable comics of `batch` whose ids are new, in order.
    /// Returns how many were appended; zero leaves the feed untouched.
    pub fn extend(&self, batch: Vec<Comic>) -> usize {
        self.lock().append_new(batch)
    }

    /// Fetch one random batch and append what is new. At most one round runs at a time.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load_more(&self) -> RoundOutcome {
        let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
            tracing::debug!("round already in flight");
            return RoundOutcome::AlreadyInProgress;
        };

        let (offset, generation) = {
            let mut state = self.lock();
            (state.rng.gen_range(0..MAX_RANDOM_OFFSET), state.generation)
        };
        let mut batch = match self.source.recent_comics(self.batch_size, offset).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = %e, offset, "failed to fetch recent comics");
                return RoundOutcome::NothingNew;
            }
        };

        let fetched = batch.len();
        let appended = {
            let mut state = self.lock();
            if state.generation != generation {
                tracing::debug!(fetched, offset, "feed was reset mid-round, discarding batch");
                return RoundOutcome::NothingNew;
            }
            if state.shuffle {
                batch.shuffle(&mut state.rng);
            }
            state.append_new(batch)
        };

        match appended {
            0 => {
                tracing::info!(fetched, offset, "no more unique comics to load");
                RoundOutcome::NothingNew
            }
            n => {
                tracing::debug!(fetched, appended = n, offset, "feed extended");
                RoundOutcome::Appended(n)
            }
        }
    }

    pub fn comics(&self) -> Vec<Comic> {
        self.lock().comics.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().comics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().comics.is_empty()
    }

    /// Empty the feed. A round already in flight appends nothing.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.comics.clear();
        state.seen.clear();
        state.generation += 1;
    }

    /// Comics whose on-sale year equals `year`. A blank filter matches everything.
    pub fn filter_by_year(&self, year: &str) -> Vec<Comic> {
        let year = year.trim();
        let state = self.lock();
        if year.is_empty() {
            return state.comics.clone();
        }
        state
            .comics
            .iter()
            .filter(|c| c.release_year().is_some_and(|y| y.to_string() == year))
            .cloned()
            .collect()
    }
}
