//! Poster lookup abstraction
//!
//! The recommender only needs an image URL per movie. Resolvers absorb every
//! failure and fall back to [`PLACEHOLDER_POSTER_URL`], so a missing poster can
//! never fail a recommendation request.
pub mod tmdb;

pub use tmdb::TmdbPosterResolver;

/// Image shown when no poster can be resolved
pub const PLACEHOLDER_POSTER_URL: &str = "https://via.placeholder.com/500x750.png?text=No+Image";

/// Trait for poster providers
#[cfg_attr(test, mockall::automock)]
// automock must be placed before async_trait
#[async_trait::async_trait]
pub trait PosterResolver: Send + Sync {
    /// Returns a display URL for the movie's poster, or the placeholder
    async fn resolve(&self, movie_id: i64) -> String;

    /// Whether lookups can return real posters at all
    fn enabled(&self) -> bool;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
