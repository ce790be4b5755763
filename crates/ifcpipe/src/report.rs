//! Flat report of a combined multi-file table.

use std::path::Path;

use tracing::info;

use crate::batch::CombinedTable;
use crate::error::StorageError;
use crate::sanitize;
use crate::storage::csv;

/// Writes `table` as CSV with the source-model column last. Parent
/// directories are created as needed.
pub fn write_csv_report(table: &CombinedTable, path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let content = csv::render(&CombinedTable::columns(), table.rows.iter().map(|r| r.cells()));
    std::fs::write(path, content).map_err(|e| StorageError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(
        rows = table.total_rows(),
        files = table.contributing_files,
        report = %sanitize::redact_path(path),
        "Report written"
    );
    Ok(())
}
