pub mod artifacts;
pub mod providers;
pub mod recommender;

pub use artifacts::{ArtifactLoader, ArtifactStore, Artifacts};
pub use recommender::{rank, star_rating, Recommender, POOL_FLOOR};
