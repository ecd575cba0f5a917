use std::time::Duration;

use crate::domain::ComicDetail;
use crate::marvel_client::ComicSource;

pub const DEFAULT_DISPLAY_DELAY: Duration = Duration::from_secs(1);

/// Loads a comic and its characters side by side. Either half can fail
/// without taking the other down.
pub struct DetailLoader<S> {
    source: S,
    display_delay: Duration,
}

impl<S: ComicSource> DetailLoader<S> {
    pub fn new(source: S) -> Self {
        DetailLoader {
            source,
            display_delay: DEFAULT_DISPLAY_DELAY,
        }
    }

    /// Minimum time before a loaded comic is handed back, so a loading
    /// indicator does not flash. `Duration::ZERO` turns it off.
    pub fn with_display_delay(mut self, delay: Duration) -> Self {
        self.display_delay = delay;
        self
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load_detail(&self, comic_id: i64) -> ComicDetail {
        let comic = async {
            match self.source.comic(comic_id).await {
                Ok(Some(comic)) => {
                    if !self.display_delay.is_zero() {
                        tokio::time::sleep(self.display_delay).await;
                    }
                    Some(comic)
                }
                Ok(None) => {
                    tracing::info!(comic_id, "comic not found");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, comic_id, "failed to load comic");
                    None
                }
            }
        };
        let characters = async {
            self.source
                .characters(comic_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, comic_id, "failed to load characters");
                    Vec::new()
                })
        };

        let (comic, characters) = tokio::join!(comic, characters);
        tracing::debug!(comic_id, found = comic.is_some(), characters = characters.len(), "detail loaded");
        ComicDetail { comic, characters }
    }
}
