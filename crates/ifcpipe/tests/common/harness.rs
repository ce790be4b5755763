//! Isolated environment for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use assert_fs::prelude::*;
use assert_fs::TempDir;

use ifcpipe::config::Config;
use ifcpipe::extract::Extractor;
use ifcpipe::{IfcPipe, TaskStatus};

pub const WAIT: Duration = Duration::from_secs(30);

/// Temporary input, cache and artifact directories plus a service rooted in
/// them.
pub struct TestHarness {
    temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub config: Config,
    pub pipe: IfcPipe,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Harness whose fresh tier goes through `extractor`.
    pub fn with_extractor(extractor: Arc<dyn Extractor>) -> Self {
        Self::build(Some(extractor))
    }

    fn build(extractor: Option<Arc<dyn Extractor>>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");

        let mut config = Config::with_directories(
            temp_dir.path().join("cache"),
            temp_dir.path().join("artifacts"),
        );
        config.worker_count = 2;
        config.ensure_directories().expect("Failed to create storage dirs");

        let pipe = match extractor {
            Some(extractor) => IfcPipe::with_extractor(config.clone(), extractor),
            None => IfcPipe::new(config.clone()),
        }
        .expect("Failed to start service");

        Self {
            temp_dir,
            input_dir,
            config,
            pipe,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes a model into the input directory.
    pub fn write_model(&self, filename: &str, content: &str) -> PathBuf {
        let child = self.temp_dir.child("input").child(filename);
        child.write_str(content).expect("Failed to write model");
        child.path().to_path_buf()
    }

    /// Writes and submits a model, returning its file id.
    pub fn submit(&self, filename: &str, content: &str) -> String {
        let path = self.write_model(filename, content);
        self.pipe.submit(&path).expect("Failed to submit")
    }

    /// Submits a model and waits for its task to finish.
    pub fn ingest(&self, filename: &str, content: &str) -> (String, TaskStatus) {
        let id = self.submit(filename, content);
        let status = self.pipe.wait_for(&id, WAIT).expect("Task did not finish");
        (id, status)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.config.cache_dir()
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.config.artifact_dir()
    }

    /// Files currently in the cache directory.
    pub fn cached_files(&self) -> Vec<PathBuf> {
        list(&self.cache_dir())
    }

    pub fn artifact_files(&self) -> Vec<PathBuf> {
        list(&self.artifact_dir())
    }
}

fn list(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default();
    files.sort();
    files
}
