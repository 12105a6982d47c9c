use std::sync::Arc;

use crate::config::Config;
use crate::services::{providers::PosterResolver, ArtifactStore, Recommender};

/// Shared application state
///
/// Everything here is read-only after startup; the artifact store loads its
/// model at most once.
#[derive(Clone)]
pub struct AppState {
    pub artifacts: ArtifactStore,
    pub recommender: Recommender,
    /// `k` used when a request does not give one
    pub default_k: usize,
    /// Largest `k` a request may ask for
    pub max_k: usize,
}

impl AppState {
    pub fn new(
        config: &Config,
        artifacts: ArtifactStore,
        posters: Arc<dyn PosterResolver>,
    ) -> Self {
        Self {
            artifacts,
            recommender: Recommender::new(posters).with_pool_floor(config.pool_floor),
            default_k: config.default_k,
            max_k: config.max_k,
        }
    }
}
