use serde::{Deserialize, Serialize};

use super::Movie;

/// Upper bound of the star scale
pub const MAX_STARS: f64 = 5.0;

/// Display rating derived from a similarity score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StarRating {
    /// Rating on the 0..=5 scale
    pub stars: f64,
    /// Fill width of the star glyphs, 0..=100
    pub stars_pct: f64,
}

impl StarRating {
    /// Clamps `stars` into range and derives the fill percentage from it
    ///
    /// NaN maps to zero stars.
    pub fn new(stars: f64) -> Self {
        let stars = if stars.is_nan() {
            0.0
        } else {
            stars.clamp(0.0, MAX_STARS)
        };
        Self {
            stars,
            stars_pct: stars / MAX_STARS * 100.0,
        }
    }
}

/// A ranked candidate before poster resolution
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMovie {
    /// 1-based position in the result list
    pub rank: usize,
    pub index: usize,
    pub score: f64,
    pub rating: StarRating,
}

/// One recommendation as returned to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub rank: usize,
    pub movie_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub poster: String,
    /// Raw similarity score
    pub score: f64,
    pub stars: f64,
    pub stars_pct: f64,
}

impl Recommendation {
    pub fn new(ranked: &RankedMovie, movie: &Movie, poster: String) -> Self {
        Self {
            rank: ranked.rank,
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            year: movie.year,
            poster,
            score: ranked.score,
            stars: ranked.rating.stars,
            stars_pct: ranked.rating.stars_pct,
        }
    }
}
