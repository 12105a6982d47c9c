use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A single catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Position in the catalog; row/column key into the similarity matrix
    pub index: usize,
    /// External (TMDB) identifier used for poster lookups
    pub movie_id: i64,
    /// Display title, not guaranteed unique
    pub title: String,
    pub year: Option<i32>,
}

/// Column-oriented catalog blob as stored on the file host
///
/// Extra columns are ignored so the blob can carry training-only data.
#[derive(Debug, Deserialize)]
pub struct CatalogColumns {
    pub movie_id: Vec<i64>,
    pub title: Vec<String>,
    #[serde(default)]
    pub year: Option<Vec<Option<i32>>>,
}

/// Ordered, immutable list of movies
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movies: Vec<Movie>,
}

impl Catalog {
    /// Builds a catalog from `(movie_id, title, year)` rows, indexing them in order
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (i64, S, Option<i32>)>,
        S: Into<String>,
    {
        let movies = rows
            .into_iter()
            .enumerate()
            .map(|(index, (movie_id, title, year))| Movie {
                index,
                movie_id,
                title: title.into(),
                year,
            })
            .collect();

        Self { movies }
    }

    /// Builds a catalog from the column-oriented blob layout
    pub fn from_columns(columns: CatalogColumns) -> AppResult<Self> {
        let len = columns.title.len();
        if columns.movie_id.len() != len {
            return Err(AppError::InvalidArtifact(format!(
                "catalog column length mismatch: {} titles, {} movie ids",
                len,
                columns.movie_id.len()
            )));
        }

        let years = match columns.year {
            Some(years) if years.len() != len => {
                return Err(AppError::InvalidArtifact(format!(
                    "catalog column length mismatch: {} titles, {} years",
                    len,
                    years.len()
                )));
            }
            Some(years) => years,
            None => vec![None; len],
        };

        let rows = columns
            .movie_id
            .into_iter()
            .zip(columns.title)
            .zip(years)
            .map(|((movie_id, title), year)| (movie_id, title, year));

        Ok(Self::from_rows(rows))
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.movies.iter()
    }

    /// Finds a movie by case-insensitive exact title match
    ///
    /// Duplicate titles resolve to the first match in catalog order.
    pub fn find_by_title(&self, title: &str) -> Option<&Movie> {
        let needle = title.to_lowercase();
        self.movies
            .iter()
            .find(|movie| movie.title.to_lowercase() == needle)
    }

    /// Lists movies whose title contains `query` (case-insensitive), in catalog order
    pub fn search<'a>(&'a self, query: &str, limit: usize) -> Vec<&'a Movie> {
        let needle = query.trim().to_lowercase();
        self.movies
            .iter()
            .filter(|movie| needle.is_empty() || movie.title.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::from_rows(vec![
            (27205, "Inception", Some(2010)),
            (603, "The Matrix", Some(1999)),
            (155, "The Dark Knight", Some(2008)),
            (999, "INCEPTION", None),
        ])
    }

    #[test]
    fn test_rows_are_indexed_in_order() {
        let catalog = sample();
        assert_eq!(catalog.len(), 4);
        for (i, movie) in catalog.iter().enumerate() {
            assert_eq!(movie.index, i);
        }
        assert_eq!(catalog.get(1).unwrap().title, "The Matrix");
        assert!(catalog.get(4).is_none());
    }

    #[test]
    fn test_find_by_title_ignores_case() {
        let catalog = sample();
        let movie = catalog.find_by_title("the matrix").unwrap();
        assert_eq!(movie.movie_id, 603);
    }

    #[test]
    fn test_find_by_title_is_exact_not_prefix() {
        let catalog = sample();
        assert!(catalog.find_by_title("The Mat").is_none());
        assert!(catalog.find_by_title("Zzzznonexistent").is_none());
    }

    #[test]
    fn test_find_by_title_takes_first_duplicate() {
        let catalog = sample();
        let movie = catalog.find_by_title("InCePtIoN").unwrap();
        assert_eq!(movie.index, 0);
        assert_eq!(movie.movie_id, 27205);
    }

    #[test]
    fn test_search_filters_and_limits() {
        let catalog = sample();
        let hits = catalog.search("the", 10);
        let titles: Vec<&str> = hits.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["The Matrix", "The Dark Knight"]);

        assert_eq!(catalog.search("", 2).len(), 2);
        assert_eq!(catalog.search("  ", 10).len(), 4);
    }

    #[test]
    fn test_from_columns_without_year() {
        let columns: CatalogColumns = serde_json::from_str(
            r#"{"movie_id": [1, 2], "title": ["A", "B"], "tags": ["x", "y"]}"#,
        )
        .unwrap();
        let catalog = Catalog::from_columns(columns).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap().year, None);
    }

    #[test]
    fn test_from_columns_with_nullable_year() {
        let columns: CatalogColumns = serde_json::from_str(
            r#"{"movie_id": [1, 2], "title": ["A", "B"], "year": [2001, null]}"#,
        )
        .unwrap();
        let catalog = Catalog::from_columns(columns).unwrap();
        assert_eq!(catalog.get(0).unwrap().year, Some(2001));
        assert_eq!(catalog.get(1).unwrap().year, None);
    }

    #[test]
    fn test_from_columns_rejects_length_mismatch() {
        let columns: CatalogColumns =
            serde_json::from_str(r#"{"movie_id": [1], "title": ["A", "B"]}"#).unwrap();
        assert!(matches!(
            Catalog::from_columns(columns),
            Err(AppError::InvalidArtifact(_))
        ));
    }
}
