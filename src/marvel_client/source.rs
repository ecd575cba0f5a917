// Seam between the HTTP client and the feed/detail logic

use std::sync::Arc;

use super::{ApiError, MarvelClient};
use crate::domain::{Character, Comic};

#[async_trait::async_trait]
pub trait ComicSource: Send + Sync {
    async fn recent_comics(&self, limit: u32, offset: u32) -> Result<Vec<Comic>, ApiError>;
    async fn comic(&self, comic_id: i64) -> Result<Option<Comic>, ApiError>;
    async fn characters(&self, comic_id: i64) -> Result<Vec<Character>, ApiError>;
}

#[async_trait::async_trait]
impl ComicSource for MarvelClient {
    async fn recent_comics(&self, limit: u32, offset: u32) -> Result<Vec<Comic>, ApiError> {
        self.get_recent_comics(limit, offset).await
    }

    async fn comic(&self, comic_id: i64) -> Result<Option<Comic>, ApiError> {
        self.get_comic(comic_id).await
    }

    async fn characters(&self, comic_id: i64) -> Result<Vec<Character>, ApiError> {
        self.get_comic_characters(comic_id).await
    }
}

#[async_trait::async_trait]
impl<T: ComicSource + ?Sized> ComicSource for Arc<T> {
    async fn recent_comics(&self, limit: u32, offset: u32) -> Result<Vec<Comic>, ApiError> {
        (**self).recent_comics(limit, offset).await
    }

    async fn comic(&self, comic_id: i64) -> Result<Option<Comic>, ApiError> {
        (**self).comic(comic_id).await
    }

    async fn characters(&self, comic_id: i64) -> Result<Vec<Character>, ApiError> {
        (**self).characters(comic_id).await
    }
}
