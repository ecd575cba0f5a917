pub mod auth;
pub mod error;
pub mod source;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub use auth::{AuthParams, AuthSigner};
pub use error::ApiError;
pub use source::ComicSource;

use crate::domain::mapping::{map_character, map_comic};
use crate::domain::{Character, Comic};

pub const DEFAULT_BASE_URL: &str = "https://gateway.marvel.com:443/v1/public";
const BODY_SNIPPET_LEN: usize = 2000;

#[derive(Debug)]
pub struct MarvelClient {
    base_url: String,
    signer: AuthSigner,
    client: reqwest::Client,
    config_error_reported: AtomicBool,
}

impl MarvelClient {
    /// Create a new client with the given base URL (e.g. "https://gateway.marvel.com:443/v1/public").
    pub fn new(base_url: impl Into<String>, signer: AuthSigner) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, signer, None)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        signer: AuthSigner,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        let base_url_str = base_url.into();
        tracing::debug!(base_url = %base_url_str, "creating MarvelClient");
        Ok(MarvelClient {
            base_url: base_url_str.trim_end_matches('/').to_string(),
            signer,
            client,
            config_error_reported: AtomicBool::new(false),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Build the full request URL: auth params first, then the caller's params.
    pub fn build_url(
        &self,
        endpoint: &str,
        auth: &AuthParams,
        params: &[(&str, String)],
    ) -> Result<Url, ApiError> {
        let query = auth
            .as_query()
            .into_iter()
            .chain(params.iter().map(|(k, v)| (*k, v.clone())))
            .collect::<Vec<_>>();
        Url::parse_with_params(&self.url(endpoint), &query)
            .map_err(|e| ApiError::Configuration(format!("invalid base URL {}: {}", self.base_url, e)))
    }

    /// GET `endpoint` and return `data.results` from the response envelope.
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let result = self.dispatch(endpoint, params).await;
        if let Err(e) = &result {
            self.report(endpoint, e);
        }
        result
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let auth = self.signer.sign()?;
        let url = self.build_url(endpoint, &auth, params)?;
        tracing::debug!(%endpoint, ts = auth.ts, "GET");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(parsed) => {
                tracing::debug!(%endpoint, total = ?parsed.data.total, count = parsed.data.results.len(), "parsed response envelope");
                Ok(parsed.data.results)
            }
            Err(e) => {
                let snippet = snippet(&body);
                tracing::error!(error = %e, body_snippet = %snippet, %endpoint, "failed to parse response envelope");
                Err(ApiError::Malformed(e.to_string()))
            }
        }
    }

    fn report(&self, endpoint: &str, err: &ApiError) {
        match err {
            ApiError::Configuration(_) => {
                if !self.config_error_reported.swap(true, Ordering::SeqCst) {
                    tracing::error!(error = %err, "requests cannot be signed; check API credentials");
                }
            }
            ApiError::NotFound => tracing::debug!(%endpoint, "resource not found"),
            _ => tracing::warn!(error = %err, %endpoint, "request failed"),
        }
    }

    /// GET /comics ordered by most recently modified
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_recent_comics(&self, limit: u32, offset: u32) -> Result<Vec<Comic>, ApiError> {
        let params = [
            ("orderBy", "-modified".to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        let results: Vec<ComicDto> = self.request("/comics", &params).await?;
        Ok(results.into_iter().map(map_comic).collect())
    }

    /// GET /comics/:id. Zero results and 404 both mean "no such comic".
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_comic(&self, comic_id: i64) -> Result<Option<Comic>, ApiError> {
        match self
            .request::<ComicDto>(&format!("/comics/{}", comic_id), &[])
            .await
        {
            Ok(results) => Ok(results.into_iter().next().map(map_comic)),
            Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// GET /comics/:id/characters
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_comic_characters(&self, comic_id: i64) -> Result<Vec<Character>, ApiError> {
        let results: Vec<CharacterDto> = self
            .request(&format!("/comics/{}/characters", comic_id), &[])
            .await?;
        Ok(results.into_iter().map(map_character).collect())
    }
}

fn snippet(body: &str) -> &str {
    let mut end = body.len().min(BODY_SNIPPET_LEN);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Upstream error bodies use either `message` or `status` for the text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.status))
        .unwrap_or_else(|| snippet(body).to_string())
}

// ============ Wire types ============

#[derive(Debug, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub data: EnvelopeData<T>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct EnvelopeData<T> {
    pub total: Option<i64>,
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ImageDto {
    pub path: Option<String>,
    pub extension: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct DateDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComicDto {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<ImageDto>,
    #[serde(default)]
    pub dates: Vec<DateDto>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct CharacterDto {
    pub id: i64,
    pub name: Option<String>,
    pub thumbnail: Option<ImageDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> MarvelClient {
        MarvelClient::new(base, AuthSigner::new("pub", "priv")).unwrap()
    }

    fn comic_json(id: i64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "description": null,
            "thumbnail": { "path": format!("http://i.example/{id}"), "extension": "jpg" },
            "dates": [ { "type": "onsaleDate", "date": "2019-01-02T00:00:00-0500" } ]
        })
    }

    fn envelope(results: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "code": 200, "status": "Ok", "data": { "offset": 0, "limit": 10, "total": results.len(), "count": results.len(), "results": results } })
    }

    #[test]
    fn build_url_puts_auth_first() {
        let c = client("https://gateway.example.com/v1/public/");
        let auth = c.signer.sign_at(1).unwrap();
        let url = c
            .build_url("/comics", &auth, &[("orderBy", "-modified".into()), ("limit", "10".into())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            format!(
                "https://gateway.example.com/v1/public/comics?ts=1&apikey=pub&hash={}&orderBy=-modified&limit=10",
                auth.hash
            )
        );
    }

    #[test]
    fn build_url_rejects_bad_base() {
        let c = client("not a url");
        let auth = c.signer.sign_at(1).unwrap();
        let err = c.build_url("/comics", &auth, &[]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn envelope_deserialize_example() {
        let body = envelope(vec![comic_json(1, "A")]).to_string();
        let parsed: Envelope<ComicDto> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.data.total, Some(1));
        assert_eq!(parsed.data.results.len(), 1);
        assert_eq!(parsed.data.results[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn envelope_tolerates_fields_it_does_not_read() {
        let body = json!({
            "code": 200,
            "etag": "abc",
            "data": {
                "offset": 20,
                "results": [{ "id": 7, "title": "B", "issueNumber": 3.5, "modified": "2020-01-01T00:00:00-0500", "dates": [] }]
            }
        })
        .to_string();
        let parsed: Envelope<ComicDto> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.data.total, None);
        assert_eq!(parsed.data.results[0].id, 7);
    }

    #[tokio::test]
    async fn recent_comics_sends_signed_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comics"))
            .and(query_param("apikey", "pub"))
            .and(query_param("orderBy", "-modified"))
            .and(query_param("limit", "10"))
            .and(query_param("offset", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![
                comic_json(1, "A"),
                comic_json(2, "B"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let comics = client(&server.uri()).get_recent_comics(10, 7).await.unwrap();
        assert_eq!(comics.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(comics[0].is_displayable());
    }

    #[tokio::test]
    async fn comic_by_id_returns_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comics/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![
                comic_json(42, "First"),
                comic_json(43, "Second"),
            ])))
            .mount(&server)
            .await;

        let comic = client(&server.uri()).get_comic(42).await.unwrap().unwrap();
        assert_eq!(comic.title, "First");
    }

    #[tokio::test]
    async fn comic_by_id_absent_on_empty_results_and_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comics/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/comics/2"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "code": 404, "status": "We couldn't find that comic_issue" })),
            )
            .mount(&server)
            .await;

        let c = client(&server.uri());
        assert_eq!(c.get_comic(1).await.unwrap(), None);
        assert_eq!(c.get_comic(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_results_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comics/5/characters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "results": "nope" } })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/comics/6/characters"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let c = client(&server.uri());
        assert!(matches!(c.get_comic_characters(5).await, Err(ApiError::Malformed(_))));
        assert!(matches!(c.get_comic_characters(6).await, Err(ApiError::Malformed(_))));
    }

    #[tokio::test]
    async fn non_success_status_is_rejected_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comics"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "code": "InvalidCredentials", "message": "That hash, timestamp and key combination is invalid." })),
            )
            .mount(&server)
            .await;

        let err = client(&server.uri()).get_recent_comics(10, 0).await.unwrap_err();
        match err {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("invalid"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let err = client("http://127.0.0.1:9").get_recent_comics(10, 0).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn missing_credentials_never_hit_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![])))
            .expect(0)
            .mount(&server)
            .await;

        let c = MarvelClient::new(server.uri(), AuthSigner::new("", "")).unwrap();
        assert!(c.get_recent_comics(10, 0).await.unwrap_err().is_configuration());
        assert!(c.get_comic(1).await.unwrap_err().is_configuration());
    }

    #[test]
    fn characters_deserialize_example() {
        let body = json!({ "data": { "results": [
            { "id": 1009610, "name": "Spider-Man (Peter Parker)", "thumbnail": { "path": "http://i.example/spidey", "extension": "jpg" } },
            { "id": 1009220, "name": "Captain America", "thumbnail": null }
        ] } })
        .to_string();
        let parsed: Envelope<CharacterDto> = serde_json::from_str(&body).unwrap();
        let characters: Vec<Character> = parsed.data.results.into_iter().map(map_character).collect();
        assert_eq!(characters[0].image_url(), "http://i.example/spidey.jpg");
        assert_eq!(characters[1].thumbnail, None);
    }
}
