use std::sync::Arc;

use crate::config::Config;
use crate::marvel_client::{AuthSigner, MarvelClient};
use crate::services::{DetailLoader, FavoritesStore, FeedAccumulator};
use crate::storage::{KeyValueStore, SqliteKeyValueStore};

/// Owns every piece of application state for the life of the process.
pub struct Catalog {
    pub client: Arc<MarvelClient>,
    pub feed: FeedAccumulator<Arc<MarvelClient>>,
    pub details: DetailLoader<Arc<MarvelClient>>,
    pub favorites: FavoritesStore,
}

impl Catalog {
    /// Connect storage, load favorites and build the API-backed services.
    pub async fn bootstrap(config: &Config) -> anyhow::Result<Self> {
        let storage = SqliteKeyValueStore::connect(&config.db_connection_string).await?;
        Self::assemble(config, Arc::new(storage)).await
    }

    pub async fn assemble(config: &Config, storage: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let signer = AuthSigner::new(&config.public_key, &config.private_key);
        let client = Arc::new(MarvelClient::with_timeout(
            &config.base_url,
            signer,
            Some(config.request_timeout),
        )?);
        tracing::info!(base_url = %config.base_url, has_keys = !config.public_key.is_empty(), "configured API client");

        let favorites = FavoritesStore::load(storage).await;
        Ok(Catalog {
            feed: FeedAccumulator::new(client.clone()),
            details: DetailLoader::new(client.clone()).with_display_delay(config.detail_delay),
            favorites,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::services::RoundOutcome;
    use crate::storage::MemoryKeyValueStore;

    #[tokio::test]
    async fn assembled_catalog_loads_feed_and_toggles_favorites() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "results": [
                { "id": 1, "title": "B", "thumbnail": { "path": "http://i.example/1", "extension": "jpg" } },
                { "id": 2, "title": "A", "thumbnail": { "path": "http://i.example/2", "extension": "jpg" } },
                { "id": 3, "title": "C", "thumbnail": null }
            ] } })))
            .mount(&server)
            .await;

        let config = Config::from_lookup(|name| match name {
            "MARVEL_PUBLIC_KEY" => Some("pub".into()),
            "MARVEL_PRIVATE_KEY" => Some("priv".into()),
            "MARVEL_BASE_URL" => Some(server.uri()),
            _ => None,
        });
        let mut catalog = Catalog::assemble(&config, Arc::new(MemoryKeyValueStore::new()))
            .await
            .unwrap();

        assert_eq!(catalog.feed.load_more().await, RoundOutcome::Appended(2));
        for comic in catalog.feed.comics() {
            catalog.favorites.toggle(comic).await.unwrap();
        }
        let titles: Vec<&str> = catalog
            .favorites
            .sorted_by_title()
            .into_iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }
}
