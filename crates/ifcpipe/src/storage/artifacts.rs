use std::path::PathBuf;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{csv, FileStorage};
use crate::error::StorageError;
use crate::extract::{PropertyTable, COLUMNS};
use crate::sanitize;

/// Locations of the two exports written for a completed parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Writes the flat (CSV) and structured (JSON) exports of a property table,
/// named after the file id so a re-run overwrites instead of accumulating.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    storage: FileStorage,
}

impl ArtifactWriter {
    pub fn new(storage: FileStorage) -> Self {
        Self { storage }
    }

    pub fn csv_name(file_id: &str) -> String {
        format!("{}.csv", sanitize::file_stem(file_id))
    }

    pub fn json_name(file_id: &str) -> String {
        format!("{}.json", sanitize::file_stem(file_id))
    }

    /// Writes both exports. Either both exist afterwards or neither does.
    pub fn write(&self, file_id: &str, table: &PropertyTable) -> Result<ArtifactPaths, StorageError> {
        let csv_name = Self::csv_name(file_id);
        let json_name = Self::json_name(file_id);

        let result = self.write_both(table, &csv_name, &json_name);
        if let Err(e) = &result {
            warn!("Writing artifacts for {} failed, cleaning up: {}", file_id, e);
            for name in [&csv_name, &json_name] {
                if let Err(cleanup) = self.storage.remove(name) {
                    warn!("Failed to remove partial artifact {}: {}", name, cleanup);
                }
            }
        }
        result
    }

    fn write_both(
        &self,
        table: &PropertyTable,
        csv_name: &str,
        json_name: &str,
    ) -> Result<ArtifactPaths, StorageError> {
        let flat = csv::render(&COLUMNS, table.iter().map(|r| r.cells()));
        let csv = self.storage.write(csv_name, flat.as_bytes())?;
        debug!("Wrote {}", csv_name);

        let json_path = self.storage.path_for(json_name);
        let structured =
            serde_json::to_vec_pretty(table).map_err(|e| StorageError::Encode {
                path: json_path,
                source: e,
            })?;
        let json = self.storage.write(json_name, &structured)?;
        debug!("Wrote {}", json_name);

        Ok(ArtifactPaths { csv, json })
    }
}
