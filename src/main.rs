use std::sync::Arc;

use movie_recommender::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, Cache},
    services::{
        artifacts::{ArtifactLoader, ArtifactStore},
        providers::{PosterResolver, TmdbPosterResolver},
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_recommender=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Poster cache is optional; without Redis every lookup goes to TMDB
    let mut cache_handle = None;
    let cache = match config.redis_url.as_deref() {
        Some(url) => {
            let client = create_redis_client(url)?;
            let (cache, handle) = Cache::new(client).await;
            cache_handle = Some(handle);
            Some(cache)
        }
        None => None,
    };

    let posters = TmdbPosterResolver::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.poster_timeout(),
        cache,
    )?;
    if !posters.enabled() {
        tracing::warn!("No TMDB_API_KEY set, posters will use placeholders");
    }
    let posters: Arc<dyn PosterResolver> = Arc::new(posters);

    let loader = ArtifactLoader::from_config(&config)?;
    let artifacts = ArtifactStore::new(loader);

    // Warm the store; a failure here is retried by the first request
    if let Err(e) = artifacts.get().await {
        tracing::error!(error = %e, "Failed to load model files at startup");
    }

    let state = AppState::new(&config, artifacts, posters);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
