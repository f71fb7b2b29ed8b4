//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Frontend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrontConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Metadata store backend.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Number of chunks every uploaded file is split into.
    #[serde(default = "default_chunks_per_file")]
    pub chunks_per_file: u32,
    /// Interval between node statistics refreshes, in seconds.
    #[serde(default = "default_stats_refresh_secs")]
    pub stats_refresh_secs: u64,
}

impl FrontConfig {
    /// Stats refresh interval as a Duration.
    pub fn stats_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.stats_refresh_secs.max(1))
    }

    /// Create a test configuration backed by the given metadata path.
    pub fn for_testing(metadata_path: PathBuf) -> Self {
        Self {
            bind: "127.0.0.1:0".to_string(),
            metadata: MetadataConfig::Sqlite {
                path: metadata_path,
            },
            chunks_per_file: default_chunks_per_file(),
            stats_refresh_secs: default_stats_refresh_secs(),
        }
    }
}

impl Default for FrontConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metadata: MetadataConfig::default(),
            chunks_per_file: default_chunks_per_file(),
            stats_refresh_secs: default_stats_refresh_secs(),
        }
    }
}

/// Metadata store backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database file.
    Sqlite {
        /// Path to the database file.
        path: PathBuf,
    },
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("scatter.db"),
        }
    }
}

/// Storage node configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Root directory for chunk storage.
    #[serde(default = "default_chunks_dir")]
    pub chunks_dir: PathBuf,
    /// Frontend base URL to register with.
    #[serde(default = "default_front_url")]
    pub front_url: String,
    /// Base URL advertised to the frontend. Defaults to
    /// `http://<hostname>:<bind port>` when unset.
    #[serde(default)]
    pub advertise_url: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            chunks_dir: default_chunks_dir(),
            front_url: default_front_url(),
            advertise_url: None,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_chunks_per_file() -> u32 {
    crate::CHUNKS_PER_FILE
}

fn default_stats_refresh_secs() -> u64 {
    crate::STATS_REFRESH_INTERVAL_SECS
}

fn default_chunks_dir() -> PathBuf {
    PathBuf::from("/chunks")
}

fn default_front_url() -> String {
    "http://front:8080".to_string()
}
