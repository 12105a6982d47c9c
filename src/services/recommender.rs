use std::cmp::Ordering;
use std::sync::Arc;

use crate::{
    models::{Catalog, RankedMovie, Recommendation, SimilarityMatrix, StarRating, MAX_STARS},
    services::providers::PosterResolver,
};

/// Minimum number of candidates the star scale is computed over
pub const POOL_FLOOR: usize = 16;

/// Maps a similarity score onto the star scale of its pool
///
/// The scale is local to one query: `s_min` maps to zero stars and `s_max` to
/// five. A flat pool gets five stars for positive scores and zero otherwise.
pub fn star_rating(score: f64, s_min: f64, s_max: f64) -> StarRating {
    if s_max <= s_min {
        let stars = if score > 0.0 { MAX_STARS } else { 0.0 };
        return StarRating::new(stars);
    }
    StarRating::new(MAX_STARS * (score - s_min) / (s_max - s_min))
}

/// Descending by score; NaN sorts last
fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Ranks the movies most similar to `title` and rates the top `k`
///
/// The title is matched case-insensitively and exactly; duplicates resolve to
/// the first catalog entry. The query movie is excluded by index. Star ratings
/// are scaled over the best `max(k, pool_floor)` candidates. Returns `None`
/// when the title is not in the catalog; `k == 0` yields an empty list.
pub fn rank(
    catalog: &Catalog,
    matrix: &SimilarityMatrix,
    title: &str,
    k: usize,
    pool_floor: usize,
) -> Option<Vec<RankedMovie>> {
    let query = catalog.find_by_title(title)?;
    if k == 0 {
        return Some(Vec::new());
    }
    let Some(row) = matrix.row(query.index) else {
        tracing::warn!(index = query.index, "Catalog entry has no similarity row");
        return Some(Vec::new());
    };

    let mut ranked: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
    // Stable, so equal scores keep column order
    ranked.sort_by(|a, b| by_score_desc(a.1, b.1));

    let pool: Vec<(usize, f64)> = ranked
        .into_iter()
        .filter(|&(index, _)| index != query.index)
        .take(k.max(pool_floor))
        .collect();

    let (s_min, s_max) = pool
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, score)| {
            (lo.min(score), hi.max(score))
        });

    let ranked = pool
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, (index, score))| RankedMovie {
            rank: i + 1,
            index,
            score,
            rating: star_rating(score, s_min, s_max),
        })
        .collect();

    Some(ranked)
}

/// Ranks candidates and attaches a poster to each one
#[derive(Clone)]
pub struct Recommender {
    posters: Arc<dyn PosterResolver>,
    pool_floor: usize,
}

impl Recommender {
    pub fn new(posters: Arc<dyn PosterResolver>) -> Self {
        Self {
            posters,
            pool_floor: POOL_FLOOR,
        }
    }

    pub fn with_pool_floor(mut self, pool_floor: usize) -> Self {
        self.pool_floor = pool_floor;
        self
    }

    pub fn posters(&self) -> &dyn PosterResolver {
        self.posters.as_ref()
    }

    /// Returns up to `k` recommendations for `title`, best first, or `None`
    /// when the title is unknown
    ///
    /// Posters are resolved one at a time in rank order.
    pub async fn recommend(
        &self,
        catalog: &Catalog,
        matrix: &SimilarityMatrix,
        title: &str,
        k: usize,
    ) -> Option<Vec<Recommendation>> {
        let ranked = rank(catalog, matrix, title, k, self.pool_floor)?;

        let mut recommendations = Vec::with_capacity(ranked.len());
        for candidate in &ranked {
            let Some(movie) = catalog.get(candidate.index) else {
                continue;
            };
            let poster = self.posters.resolve(movie.movie_id).await;
            recommendations.push(Recommendation::new(candidate, movie, poster));
        }

        tracing::debug!(
            title = %title,
            k,
            returned = recommendations.len(),
            provider = self.posters.name(),
            "Recommendations computed"
        );

        Some(recommendations)
    }
}
