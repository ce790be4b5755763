use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_cache_directory")]
    pub cache_directory: String,
    #[serde(default = "default_artifact_directory")]
    pub artifact_directory: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Defaults to twice the worker count.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    #[serde(default = "default_memory_cache_capacity")]
    pub memory_cache_capacity: u64,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_batch_concurrency() -> usize {
    5
}

fn default_memory_cache_capacity() -> u64 {
    64
}

fn data_root() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("ifcpipe")
}

fn default_cache_directory() -> String {
    dirs::cache_dir()
        .map(|p| p.join("ifcpipe").join("tables"))
        .unwrap_or_else(|| data_root().join("tables"))
        .to_string_lossy()
        .to_string()
}

fn default_artifact_directory() -> String {
    data_root().join("artifacts").to_string_lossy().to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            cache_directory: default_cache_directory(),
            artifact_directory: default_artifact_directory(),
            worker_count: default_worker_count(),
            queue_capacity: None,
            batch_concurrency: default_batch_concurrency(),
            memory_cache_capacity: default_memory_cache_capacity(),
        }
    }
}

impl Config {
    /// Default settings rooted at the given storage directories.
    pub fn with_directories(cache: impl AsRef<Path>, artifacts: impl AsRef<Path>) -> Self {
        Self {
            cache_directory: cache.as_ref().to_string_lossy().to_string(),
            artifact_directory: artifacts.as_ref().to_string_lossy().to_string(),
            ..Self::default()
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.cache_directory)
    }

    pub fn artifact_dir(&self) -> PathBuf {
        PathBuf::from(&self.artifact_directory)
    }

    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or(self.worker_count.saturating_mul(2))
            .max(1)
    }

    /// Creates the storage directories. Called once at startup; a failure
    /// here means the process cannot do useful work.
    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        for dir in [self.cache_dir(), self.artifact_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| StorageError::CreateDirectory {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}
