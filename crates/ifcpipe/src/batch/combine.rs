use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{BatchOutcome, Skipped};
use crate::extract::{PropertyRecord, PropertyTable, COLUMNS};
use crate::tasks::FileRecord;

/// Header of the source column added to combined rows.
pub const SOURCE_COLUMN: &str = "SourceModel";

/// A property row tagged with the display name of the file it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedRecord {
    #[serde(flatten)]
    pub record: PropertyRecord,
    #[serde(rename = "SourceModel")]
    pub source_model: String,
}

impl TaggedRecord {
    /// Cells in [`CombinedTable::columns`] order.
    pub fn cells(&self) -> Vec<String> {
        let mut cells = self.record.cells().to_vec();
        cells.push(self.source_model.clone());
        cells
    }
}

/// Rows of several files concatenated in request order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedTable {
    pub rows: Vec<TaggedRecord>,
    /// Files that contributed at least one row.
    pub contributing_files: usize,
    pub skipped: Vec<Skipped>,
    /// Files whose operation failed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl CombinedTable {
    pub fn columns() -> Vec<&'static str> {
        let mut columns = COLUMNS.to_vec();
        columns.push(SOURCE_COLUMN);
        columns
    }

    pub(crate) fn from_outcome(outcome: BatchOutcome<PropertyTable>) -> Self {
        let mut combined = CombinedTable {
            skipped: outcome.skipped,
            ..Default::default()
        };

        for file in outcome.outcomes {
            match file.result {
                Ok(table) if !table.is_empty() => {
                    combined.contributing_files += 1;
                    combined.rows.extend(table.into_iter().map(|record| TaggedRecord {
                        record,
                        source_model: file.display_name.clone(),
                    }));
                }
                Ok(_) => {}
                Err(e) => combined.failed.push((file.file_id, e)),
            }
        }

        combined
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Human-readable summary of the extraction.
    pub fn message(&self) -> String {
        if self.contributing_files == 0 {
            "No data extracted. Selected files might be empty or failed processing.".to_string()
        } else {
            format!(
                "Data extracted from {} file(s). Total records: {}.",
                self.contributing_files,
                self.total_rows()
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCount {
    pub entity: String,
    pub count: usize,
}

/// Row counts by element type for one file, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub file_id: String,
    pub filename: String,
    pub counts: Vec<EntityCount>,
}

impl EntityCounts {
    pub fn from_table(record: &FileRecord, table: &PropertyTable) -> Self {
        let mut by_entity: HashMap<&str, usize> = HashMap::new();
        for row in table {
            *by_entity.entry(row.entity.as_str()).or_default() += 1;
        }

        let mut counts: Vec<EntityCount> = by_entity
            .into_iter()
            .map(|(entity, count)| EntityCount {
                entity: entity.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.entity.cmp(&b.entity)));

        Self {
            file_id: record.id.clone(),
            filename: record.display_name.clone(),
            counts,
        }
    }
}
