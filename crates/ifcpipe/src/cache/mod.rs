//! Property table cache: persisted JSON, then memory, then a fresh extraction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use moka::sync::Cache;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, StorageError};
use crate::extract::{Extractor, PropertyTable};
use crate::sanitize;
use crate::storage::FileStorage;

/// Result of running the fresh tier.
#[derive(Debug, Clone)]
pub struct Computed {
    pub table: Arc<PropertyTable>,
    /// Where the table was persisted; `None` for empty tables or when the
    /// write failed.
    pub persisted: Option<PathBuf>,
}

pub struct CacheManager {
    storage: FileStorage,
    memory: Cache<String, Arc<PropertyTable>>,
    extractor: Arc<dyn Extractor>,
}

impl CacheManager {
    pub fn new(storage: FileStorage, memory_capacity: u64, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            storage,
            memory: Cache::new(memory_capacity),
            extractor,
        }
    }

    /// File name of the persisted table for `file_id`. The stem never holds
    /// `_`, so mapping `-` onto it keeps keys distinct.
    pub fn cache_key(file_id: &str) -> String {
        format!("{}_table.json", sanitize::file_stem(file_id).replace('-', "_"))
    }

    pub fn persisted_path(&self, file_id: &str) -> Option<PathBuf> {
        let key = Self::cache_key(file_id);
        self.storage.exists(&key).then(|| self.storage.path_for(&key))
    }

    /// Returns the property table for `file_id`, trying the persisted copy,
    /// the in-memory copy and finally a fresh extraction of `source`.
    /// Never fails: extraction errors are logged and yield an empty table.
    pub fn resolve(&self, file_id: &str, source: &Path) -> Arc<PropertyTable> {
        match self.load_persisted(file_id) {
            Ok(Some(table)) => {
                debug!(file_id, rows = table.len(), "Cache hit (persisted)");
                return Arc::new(table);
            }
            Ok(None) => {}
            Err(e) => warn!(file_id, error = %e, "Ignoring unreadable persisted table"),
        }

        if let Some(table) = self.memory.get(file_id) {
            debug!(file_id, rows = table.len(), "Cache hit (memory)");
            return table;
        }

        match self.compute(file_id, source) {
            Ok(computed) => computed.table,
            Err(e) => {
                warn!(file_id, error = %e, "Extraction failed, no data available");
                Arc::new(PropertyTable::new())
            }
        }
    }

    /// Runs the extractor, attaches the result in memory and persists it when
    /// it has rows. A stale persisted copy is removed when the new table is
    /// empty so the persisted copy is always the latest result.
    pub fn compute(&self, file_id: &str, source: &Path) -> Result<Computed, ExtractError> {
        let table = Arc::new(self.extractor.extract(source)?);
        self.memory.insert(file_id.to_string(), Arc::clone(&table));

        let key = Self::cache_key(file_id);
        let persisted = if table.is_empty() {
            if let Err(e) = self.storage.remove(&key) {
                warn!(file_id, error = %e, "Failed to remove stale persisted table");
            }
            info!(file_id, "Extraction produced no rows; not persisting");
            None
        } else {
            match self.persist(&key, &table) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(file_id, error = %e, "Failed to persist table");
                    if let Err(e) = self.storage.remove(&key) {
                        warn!(file_id, error = %e, "Failed to remove stale persisted table");
                    }
                    None
                }
            }
        };

        Ok(Computed { table, persisted })
    }

    /// Memory tier lookup only.
    pub fn cached(&self, file_id: &str) -> Option<Arc<PropertyTable>> {
        self.memory.get(file_id)
    }

    pub fn load_persisted(&self, file_id: &str) -> Result<Option<PropertyTable>, StorageError> {
        let key = Self::cache_key(file_id);
        if !self.storage.exists(&key) {
            return Ok(None);
        }
        let bytes = self.storage.read(&key)?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Decode {
                path: self.storage.path_for(&key),
                source: e,
            })
    }

    fn persist(&self, key: &str, table: &PropertyTable) -> Result<PathBuf, StorageError> {
        let bytes = serde_json::to_vec(table).map_err(|e| StorageError::Encode {
            path: self.storage.path_for(key),
            source: e,
        })?;
        self.storage.write(key, &bytes)
    }
}
