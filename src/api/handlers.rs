use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Movie, Recommendation},
};

use super::AppState;

const DEFAULT_MOVIE_LIMIT: usize = 50;
const MAX_MOVIE_LIMIT: usize = 1000;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct MovieQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub movie_id: i64,
    pub title: String,
    pub year: Option<i32>,
}

impl From<&Movie> for MovieResponse {
    fn from(movie: &Movie) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            year: movie.year,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub title: String,
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub query: String,
    /// False when the title is not in the catalog
    pub found: bool,
    pub count: usize,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub loaded: bool,
    pub movies: Option<usize>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub posters_enabled: bool,
    pub poster_provider: &'static str,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Reports whether the model is loaded, without loading it
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let loaded = state.artifacts.loaded();
    let posters = state.recommender.posters();

    Json(StatusResponse {
        loaded: loaded.is_some(),
        movies: loaded.as_ref().map(|a| a.catalog.len()),
        loaded_at: loaded.as_ref().map(|a| a.loaded_at),
        posters_enabled: posters.enabled(),
        poster_provider: posters.name(),
    })
}

/// Lists catalog titles, optionally filtered by a substring
pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<MovieQuery>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_MOVIE_LIMIT)
        .min(MAX_MOVIE_LIMIT);
    let artifacts = state.artifacts.get().await?;

    let movies = artifacts
        .catalog
        .search(params.q.as_deref().unwrap_or(""), limit)
        .into_iter()
        .map(MovieResponse::from)
        .collect();

    Ok(Json(movies))
}

/// `GET /recommendations?title=…&k=…`
pub async fn recommend_query(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(request): Query<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    recommend(state, request_id, request).await.map(Json)
}

/// `POST /recommendations` with a JSON body
pub async fn recommend_json(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    recommend(state, request_id, request).await.map(Json)
}

async fn recommend(
    state: AppState,
    request_id: RequestId,
    request: RecommendationRequest,
) -> AppResult<RecommendationResponse> {
    let title = request.title.as_str();
    if title.trim().is_empty() {
        return Err(AppError::InvalidInput("title cannot be empty".to_string()));
    }

    let k = request.k.unwrap_or(state.default_k);
    if k == 0 || k > state.max_k {
        return Err(AppError::InvalidInput(format!(
            "k must be between 1 and {}",
            state.max_k
        )));
    }

    tracing::info!(
        request_id = %request_id,
        title = %title,
        k,
        "Processing recommendation request"
    );

    let artifacts = state.artifacts.get().await?;

    let recommendations = state
        .recommender
        .recommend(&artifacts.catalog, &artifacts.matrix, title, k)
        .await;

    let found = recommendations.is_some();
    if !found {
        tracing::info!(request_id = %request_id, title = %title, "Movie not found in catalog");
    }
    let recommendations = recommendations.unwrap_or_default();

    Ok(RecommendationResponse {
        query: title.to_string(),
        found,
        count: recommendations.len(),
        recommendations,
    })
}
