pub mod movie;
pub mod recommendation;
pub mod similarity;

pub use movie::{Catalog, CatalogColumns, Movie};
pub use recommendation::{RankedMovie, Recommendation, StarRating, MAX_STARS};
pub use similarity::SimilarityMatrix;
