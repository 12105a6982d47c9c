use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key; posters fall back to placeholders when absent
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Per-request timeout for poster lookups, in seconds
    #[serde(default = "default_poster_timeout_secs")]
    pub poster_timeout_secs: u64,

    /// Redis connection URL for the poster cache
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Download endpoint of the file host; file ids are passed as `?id=`
    #[serde(default = "default_artifact_base_url")]
    pub artifact_base_url: String,

    /// Local directory the artifacts are downloaded into
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// File id of the movie catalog blob
    #[serde(default = "default_catalog_file_id")]
    pub catalog_file_id: String,

    /// File id of the similarity matrix blob
    #[serde(default = "default_similarity_file_id")]
    pub similarity_file_id: String,

    /// Minimum number of candidates used for star scaling
    #[serde(default = "default_pool_floor")]
    pub pool_floor: usize,

    /// Number of recommendations when the request does not say
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Largest `k` accepted over HTTP
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

pub const CATALOG_FILE_NAME: &str = "movie_dic.json";
pub const SIMILARITY_FILE_NAME: &str = "similarity.json";

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org".to_string()
}

fn default_poster_timeout_secs() -> u64 {
    12
}

fn default_artifact_base_url() -> String {
    "https://drive.google.com/uc".to_string()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_catalog_file_id() -> String {
    "1DwzwzVJ_rwpNt-IN92ymqYRbWsREpivZ".to_string()
}

fn default_similarity_file_id() -> String {
    "1wOIEQa6K6aVwklVrgH8-RyxrbocFr-GT".to_string()
}

fn default_pool_floor() -> usize {
    16
}

fn default_k() -> usize {
    12
}

fn default_max_k() -> usize {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_api_url: default_tmdb_api_url(),
            poster_timeout_secs: default_poster_timeout_secs(),
            redis_url: None,
            artifact_base_url: default_artifact_base_url(),
            artifact_dir: default_artifact_dir(),
            catalog_file_id: default_catalog_file_id(),
            similarity_file_id: default_similarity_file_id(),
            pool_floor: default_pool_floor(),
            default_k: default_k(),
            max_k: default_max_k(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.default_k == 0 || config.default_k > config.max_k {
            anyhow::bail!(
                "DEFAULT_K must lie in 1..={}, got {}",
                config.max_k,
                config.default_k
            );
        }

        Ok(config)
    }

    pub fn poster_timeout(&self) -> Duration {
        Duration::from_secs(self.poster_timeout_secs)
    }
}
