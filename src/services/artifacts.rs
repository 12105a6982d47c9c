use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::{
    config::{Config, CATALOG_FILE_NAME, SIMILARITY_FILE_NAME},
    error::{AppError, AppResult},
    models::{Catalog, CatalogColumns, SimilarityMatrix},
};

/// The loaded model: catalog plus the aligned similarity matrix
#[derive(Debug)]
pub struct Artifacts {
    pub catalog: Catalog,
    pub matrix: SimilarityMatrix,
    pub loaded_at: DateTime<Utc>,
}

impl Artifacts {
    /// Pairs a catalog with its matrix, checking `catalog[i]` ↔ `matrix[i]` alignment
    pub fn new(catalog: Catalog, matrix: SimilarityMatrix) -> AppResult<Self> {
        if catalog.is_empty() {
            return Err(AppError::InvalidArtifact("movie catalog is empty".to_string()));
        }
        if catalog.len() != matrix.dim() {
            return Err(AppError::InvalidArtifact(format!(
                "catalog has {} movies but similarity matrix is {}x{}",
                catalog.len(),
                matrix.dim(),
                matrix.dim()
            )));
        }

        Ok(Self {
            catalog,
            matrix,
            loaded_at: Utc::now(),
        })
    }
}

/// Downloads the model files into a local directory and parses them
///
/// Files already present on disk are reused, so a restart does not download
/// again. A file that fails to parse is removed and fetched on the next load.
#[derive(Clone)]
pub struct ArtifactLoader {
    http_client: HttpClient,
    base_url: String,
    dir: PathBuf,
    catalog_file_id: String,
    similarity_file_id: String,
}

impl ArtifactLoader {
    pub fn new(
        base_url: String,
        dir: PathBuf,
        catalog_file_id: String,
        similarity_file_id: String,
    ) -> AppResult<Self> {
        Ok(Self {
            http_client: HttpClient::builder().build()?,
            base_url,
            dir,
            catalog_file_id,
            similarity_file_id,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.artifact_base_url.clone(),
            config.artifact_dir.clone(),
            config.catalog_file_id.clone(),
            config.similarity_file_id.clone(),
        )
    }

    /// Fetches (if absent) and parses both model files
    pub async fn load(&self) -> AppResult<Artifacts> {
        let catalog_path = self
            .download_once(&self.catalog_file_id, CATALOG_FILE_NAME)
            .await?;
        let similarity_path = self
            .download_once(&self.similarity_file_id, SIMILARITY_FILE_NAME)
            .await?;

        let catalog = match parse_json_file::<CatalogColumns>(catalog_path.clone())
            .await
            .and_then(Catalog::from_columns)
        {
            Ok(catalog) => catalog,
            Err(e) => {
                discard(&[catalog_path.as_path()], &e).await;
                return Err(e);
            }
        };
        let matrix = match parse_json_file::<SimilarityMatrix>(similarity_path.clone()).await {
            Ok(matrix) => matrix,
            Err(e) => {
                discard(&[similarity_path.as_path()], &e).await;
                return Err(e);
            }
        };

        let artifacts = match Artifacts::new(catalog, matrix) {
            Ok(artifacts) => artifacts,
            Err(e) => {
                discard(&[catalog_path.as_path(), similarity_path.as_path()], &e).await;
                return Err(e);
            }
        };

        tracing::info!(
            movies = artifacts.catalog.len(),
            dir = %self.dir.display(),
            "Loaded model files"
        );

        Ok(artifacts)
    }

    /// Downloads `file_id` to `dir/file_name` unless the file already exists
    async fn download_once(&self, file_id: &str, file_name: &str) -> AppResult<PathBuf> {
        let path = self.dir.join(file_name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "Model file present, skipping download");
            return Ok(path);
        }

        tracing::info!(file_id = %file_id, path = %path.display(), "Downloading model file");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("id", file_id)])
            .send()
            .await
            .map_err(|e| unavailable(file_name, e))?;

        if !response.status().is_success() {
            return Err(unavailable(
                file_name,
                format!("file host returned status {}", response.status()),
            ));
        }

        // The host answers with an HTML interstitial instead of the file when
        // it cannot serve it directly
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));
        if is_html {
            return Err(unavailable(file_name, "file host returned an HTML page"));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| unavailable(file_name, e))?;

        write_atomically(&path, &bytes)
            .await
            .map_err(|e| unavailable(file_name, e))?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Model file downloaded");

        Ok(path)
    }
}

/// Removes model files that failed to load so the next attempt downloads them
/// again
async fn discard(paths: &[&Path], cause: &AppError) {
    if !matches!(cause, AppError::InvalidArtifact(_)) {
        return;
    }
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::warn!(
                path = %path.display(),
                error = %cause,
                "Removed invalid model file"
            ),
            Err(e) => tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to remove invalid model file"
            ),
        }
    }
}

fn unavailable(file_name: &str, reason: impl std::fmt::Display) -> AppError {
    AppError::ArtifactUnavailable(format!("{}: {}", file_name, reason))
}

/// Writes through a `.part` file so an interrupted download is never mistaken
/// for a complete one
async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let partial = path.with_extension("part");
    tokio::fs::write(&partial, bytes).await?;
    tokio::fs::rename(&partial, path).await
}

async fn parse_json_file<T>(path: PathBuf) -> AppResult<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::ArtifactUnavailable(format!("{}: {}", path.display(), e)))?;

    tokio::task::spawn_blocking(move || {
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::InvalidArtifact(format!("{}: {}", path.display(), e)))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}

/// Process-wide, load-once holder of the model
///
/// Concurrent first requests share a single load. A failed load leaves the
/// store empty, so a later request tries again.
#[derive(Clone)]
pub struct ArtifactStore {
    loader: Option<ArtifactLoader>,
    cell: Arc<OnceCell<Arc<Artifacts>>>,
}

impl ArtifactStore {
    pub fn new(loader: ArtifactLoader) -> Self {
        Self {
            loader: Some(loader),
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// A store that already holds `artifacts` and never downloads
    pub fn preloaded(artifacts: Artifacts) -> Self {
        Self {
            loader: None,
            cell: Arc::new(OnceCell::from(Arc::new(artifacts))),
        }
    }

    /// Returns the model, loading it on first use
    pub async fn get(&self) -> AppResult<Arc<Artifacts>> {
        self.cell
            .get_or_try_init(|| async {
                match &self.loader {
                    Some(loader) => loader.load().await.map(Arc::new),
                    None => Err(AppError::ArtifactUnavailable(
                        "no artifact source configured".to_string(),
                    )),
                }
            })
            .await
            .cloned()
    }

    /// The model if it has been loaded, without triggering a load
    pub fn loaded(&self) -> Option<Arc<Artifacts>> {
        self.cell.get().cloned()
    }
}
