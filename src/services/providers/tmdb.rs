//! TMDB poster provider
//!
//! API Flow:
//! 1. `GET /3/movie/{id}?api_key=…&language=en-US` → movie details
//! 2. `poster_path` is joined onto the w500 image base
//!
//! Successful lookups are cached for a day when a Redis cache is configured.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    services::providers::{PosterResolver, PLACEHOLDER_POSTER_URL},
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

const POSTER_CACHE_TTL: u64 = 86400; // 1 day
const POSTER_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
const LANGUAGE: &str = "en-US";

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    #[serde(default)]
    poster_path: Option<String>,
}

#[derive(Clone)]
pub struct TmdbPosterResolver {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: Option<Cache>,
}

impl TmdbPosterResolver {
    /// Creates a resolver whose requests are bounded by `timeout`
    ///
    /// Without an API key every lookup returns the placeholder and no request
    /// is made.
    pub fn new(
        api_key: Option<String>,
        api_url: String,
        timeout: Duration,
        cache: Option<Cache>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        let api_key = api_key.filter(|key| !key.trim().is_empty());

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    async fn fetch_poster(&self, api_key: &str, movie_id: i64) -> AppResult<String> {
        let url = format!("{}/3/movie/{}", self.api_url, movie_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", api_key), ("language", LANGUAGE)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {} for movie {}",
                response.status(),
                movie_id
            )));
        }

        let details: TmdbMovieDetails = response.json().await?;

        details
            .poster_path
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}{}", POSTER_IMAGE_BASE, path))
            .ok_or_else(|| AppError::ExternalApi(format!("No poster for movie {}", movie_id)))
    }

    async fn lookup(&self, api_key: &str, movie_id: i64) -> AppResult<String> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::Poster(movie_id),
                POSTER_CACHE_TTL,
                self.fetch_poster(api_key, movie_id)
            ),
            None => self.fetch_poster(api_key, movie_id).await,
        }
    }
}

#[async_trait::async_trait]
impl PosterResolver for TmdbPosterResolver {
    async fn resolve(&self, movie_id: i64) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return PLACEHOLDER_POSTER_URL.to_string();
        };

        match self.lookup(api_key, movie_id).await {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(movie_id, error = %e, "Poster unavailable, using placeholder");
                PLACEHOLDER_POSTER_URL.to_string()
            }
        }
    }

    fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
