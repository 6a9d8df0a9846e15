//! Backend API access.
//!
//! [`StatsSource`] is the seam views depend on. [`ApiClient`] implements it
//! over HTTP; [`memory::InMemorySource`] implements it from fixtures.

pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ApiConfig, ConfigError};
use crate::models::{HeroId, HeroesResponse, Match, RatingBracket, StatsType, User};

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request task failed: {0}")]
    Task(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ConfigError> for FetchError {
    fn from(e: ConfigError) -> Self {
        FetchError::InvalidUrl(e.to_string())
    }
}

/// Source of profile, catalog and statistics data.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// `GET /api/me`
    async fn user_profile(&self) -> Result<User, FetchError>;

    /// `GET /api/me/matches`
    async fn matches(&self) -> Result<Vec<Match>, FetchError>;

    /// `GET /api/heroes`
    async fn heroes(&self) -> Result<HeroesResponse, FetchError>;

    /// `GET /api/stats/{hero}/?rating_id=..&types=..`
    async fn hero_stats(
        &self,
        rating: RatingBracket,
        hero: HeroId,
        stats_type: StatsType,
    ) -> Result<Value, FetchError>;

    /// `GET /api/stats/?rating_id=..&types=..`
    async fn all_stats(
        &self,
        rating: RatingBracket,
        stats_type: StatsType,
    ) -> Result<Value, FetchError>;
}

/// Fetch several all-hero series concurrently.
///
/// Results come back in completion order; callers join them by type.
/// Duplicate types are requested once. The first failure aborts the rest.
pub async fn fetch_series(
    source: Arc<dyn StatsSource>,
    rating: RatingBracket,
    types: &[StatsType],
) -> Result<Vec<(StatsType, Value)>, FetchError> {
    let mut unique: Vec<StatsType> = types.to_vec();
    unique.sort();
    unique.dedup();

    let mut tasks = JoinSet::new();
    for stats_type in unique {
        let source = Arc::clone(&source);
        tasks.spawn(async move {
            let value = source.all_stats(rating, stats_type).await?;
            Ok::<_, FetchError>((stats_type, value))
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (stats_type, value) = joined.map_err(|e| FetchError::Task(e.to_string()))??;
        debug!("Series {} (rating {}) arrived", stats_type, rating);
        results.push((stats_type, value));
    }
    Ok(results)
}

/// HTTP client for the stats backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client. The session id, if any, is sent as a cookie on
    /// every request.
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let base_url = config.base_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("dota-dash/0.1.0")),
        );
        match &config.session_id {
            Some(session) => {
                let cookie = HeaderValue::from_str(&format!("session_id={}", session.trim()))
                    .map_err(|_| {
                        FetchError::InvalidUrl("session_id contains invalid characters".into())
                    })?;
                headers.insert(COOKIE, cookie);
            }
            None => warn!("No session_id configured; profile requests will likely fail"),
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a relative API path with optional query parameters.
    fn url_for(&self, path: &str, query: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn stats_query(rating: RatingBracket, stats_type: StatsType) -> [(&'static str, String); 2] {
        [
            ("rating_id", rating.to_string()),
            ("types", stats_type.as_str().to_string()),
        ]
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        debug!("{} returned {} bytes", url, body.len());
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl StatsSource for ApiClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn user_profile(&self) -> Result<User, FetchError> {
        let user: User = self.get_json(self.url_for("me", &[])?).await?;
        debug!("Profile {} with {} embedded matches", user.id_, user.matches.len());
        Ok(user)
    }

    async fn matches(&self) -> Result<Vec<Match>, FetchError> {
        let matches: Vec<Match> = self.get_json(self.url_for("me/matches", &[])?).await?;
        debug!("Received {} matches", matches.len());
        Ok(matches)
    }

    async fn heroes(&self) -> Result<HeroesResponse, FetchError> {
        self.get_json(self.url_for("heroes", &[])?).await
    }

    async fn hero_stats(
        &self,
        rating: RatingBracket,
        hero: HeroId,
        stats_type: StatsType,
    ) -> Result<Value, FetchError> {
        let url = self.url_for(
            &format!("stats/{}/", hero),
            &Self::stats_query(rating, stats_type),
        )?;
        self.get_json(url).await
    }

    async fn all_stats(
        &self,
        rating: RatingBracket,
        stats_type: StatsType,
    ) -> Result<Value, FetchError> {
        let url = self.url_for("stats/", &Self::stats_query(rating, stats_type))?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::memory::InMemorySource;
    use serde_json::json;

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            session_id: Some("318334842".to_string()),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_for_plain_paths() {
        let api = client("http://localhost:8080/api");
        assert_eq!(
            api.url_for("me", &[]).unwrap().as_str(),
            "http://localhost:8080/api/me"
        );
        assert_eq!(
            api.url_for("me/matches", &[]).unwrap().as_str(),
            "http://localhost:8080/api/me/matches"
        );
    }

    #[test]
    fn test_url_for_stats_query() {
        let api = client("http://localhost:8080/api/");
        let rating = RatingBracket::new(43).unwrap();

        let url = api
            .url_for("stats/", &ApiClient::stats_query(rating, StatsType::Gpm))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/stats/?rating_id=43&types=gpm"
        );

        let url = api
            .url_for(
                &format!("stats/{}/", HeroId::new(2)),
                &ApiClient::stats_query(rating, StatsType::Raw),
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/stats/2/?rating_id=43&types=raw"
        );
    }

    #[test]
    fn test_invalid_session_rejected() {
        let result = ApiClient::new(&ApiConfig {
            session_id: Some("bad\nvalue".to_string()),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_client_without_session() {
        let api = ApiClient::new(&ApiConfig::default()).unwrap();
        assert_eq!(api.base_url().as_str(), "http://localhost:8080/api/");
    }

    #[tokio::test]
    async fn test_fetch_series_collects_every_type_once() {
        let source = InMemorySource::new()
            .with_series(StatsType::Raw, json!([{"hero_id": 1, "win_rate": 0.5}]))
            .with_series(StatsType::Gpm, json!({"1": 500}))
            .with_series(StatsType::Xpm, json!({"1": 600}));
        let source = Arc::new(source);

        let mut results = fetch_series(
            source.clone(),
            RatingBracket::default(),
            &[StatsType::Xpm, StatsType::Raw, StatsType::Gpm, StatsType::Raw],
        )
        .await
        .unwrap();
        results.sort_by_key(|(t, _)| *t);

        let types: Vec<StatsType> = results.iter().map(|(t, _)| *t).collect();
        assert_eq!(types, vec![StatsType::Raw, StatsType::Xpm, StatsType::Gpm]);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_fetch_series_propagates_failure() {
        let source = InMemorySource::new().with_series(StatsType::Raw, json!([]));
        let result = fetch_series(
            Arc::new(source),
            RatingBracket::default(),
            &[StatsType::Raw, StatsType::Gpm],
        )
        .await;
        assert!(matches!(result, Err(FetchError::HttpStatus { status: 404, .. })));
    }
}
