//! Multi-file queries over completed parses.

mod common;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{containment_model, three_row_model, IfcBuilder, TestHarness};
use ifcpipe::batch::{SkipReason, SOURCE_COLUMN};
use ifcpipe::cache::CacheManager;
use ifcpipe::extract::{Extractor, IfcExtractor, PropertyTable};
use ifcpipe::{write_csv_report, ExtractError, TaskState};

/// Reads models from disk and counts how often it was asked to.
#[derive(Default)]
struct CountingExtractor {
    calls: AtomicUsize,
}

impl Extractor for CountingExtractor {
    fn extract(&self, path: &Path) -> Result<PropertyTable, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        IfcExtractor.extract(path)
    }
}

fn two_wall_model(file_name: &str) -> String {
    let mut b = IfcBuilder::new(file_name);
    let wall = b.wall("w", "Wall");
    let door = b.door("d", "Door");
    b.property_set(&[wall, door], "Pset_Common", &[("Reference", "IFCIDENTIFIER('R1')")]);
    b.build()
}

#[test]
fn test_completed_and_unknown_ids() {
    let harness = TestHarness::new();
    let (a, _) = harness.ingest("a.ifc", &three_row_model("a.ifc"));

    let table = harness
        .pipe
        .extract_table(&[a.clone(), "unknown-id".to_string()]);

    assert_eq!(table.total_rows(), 3);
    assert_eq!(table.contributing_files, 1);
    assert!(table.rows.iter().all(|r| r.source_model == "a.ifc"));
    assert_eq!(table.skipped.len(), 1);
    assert_eq!(table.skipped[0].file_id, "unknown-id");
    assert_eq!(table.skipped[0].reason, SkipReason::Unknown);
    assert!(table.failed.is_empty());
}

#[test]
fn test_failed_file_is_skipped() {
    let harness = TestHarness::new();
    let (failed, status) = harness.ingest("empty.ifc", &containment_model("empty.ifc"));
    assert_eq!(status.state, TaskState::Failed);

    let table = harness.pipe.extract_table(&[failed]);
    assert!(table.is_empty());
    assert_eq!(
        table.skipped[0].reason,
        SkipReason::NotCompleted {
            state: TaskState::Failed
        }
    );
    assert_eq!(
        table.message(),
        "No data extracted. Selected files might be empty or failed processing."
    );
}

#[test]
fn test_files_appended_in_request_order() {
    let harness = TestHarness::new();
    let (a, _) = harness.ingest("a.ifc", &three_row_model("a.ifc"));
    let (b, _) = harness.ingest("b.ifc", &two_wall_model("b.ifc"));

    let table = harness.pipe.extract_table(&[b, a]);
    let sources: Vec<&str> = table.rows.iter().map(|r| r.source_model.as_str()).collect();
    assert_eq!(sources, vec!["b.ifc", "b.ifc", "a.ifc", "a.ifc", "a.ifc"]);

    let a_props: Vec<&str> = table.rows[2..]
        .iter()
        .map(|r| r.record.property_name.as_str())
        .collect();
    assert_eq!(a_props, vec!["IsExternal", "FireRating", "Width"]);
    assert_eq!(
        table.message(),
        "Data extracted from 2 file(s). Total records: 5."
    );
}

#[test]
fn test_empty_request_is_empty_success() {
    let harness = TestHarness::new();
    let table = harness.pipe.extract_table(&[]);
    assert!(table.is_empty());
    assert_eq!(table.contributing_files, 0);
    assert!(table.skipped.is_empty());
}

#[test]
fn test_repeated_queries_reuse_cached_table() {
    let extractor = Arc::new(CountingExtractor::default());
    let harness = TestHarness::with_extractor(extractor.clone());
    let (id, _) = harness.ingest("a.ifc", &three_row_model("a.ifc"));
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);

    let first = harness.pipe.extract_table(&[id.clone()]);
    let second = harness.pipe.extract_table(&[id.clone()]);

    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.rows, second.rows);
    assert!(harness
        .cache_dir()
        .join(CacheManager::cache_key(&id))
        .is_file());
    assert_eq!(harness.cached_files().len(), 1);
}

#[test]
fn test_missing_persisted_copy_falls_back_to_memory() {
    let extractor = Arc::new(CountingExtractor::default());
    let harness = TestHarness::with_extractor(extractor.clone());
    let (id, _) = harness.ingest("a.ifc", &three_row_model("a.ifc"));

    std::fs::remove_file(harness.cache_dir().join(CacheManager::cache_key(&id))).unwrap();
    let table = harness.pipe.extract_table(&[id]);

    assert_eq!(table.total_rows(), 3);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_entity_counts() {
    let harness = TestHarness::new();
    let (a, _) = harness.ingest("a.ifc", &three_row_model("a.ifc"));
    let (b, _) = harness.ingest("b.ifc", &two_wall_model("b.ifc"));

    let counts = harness.pipe.entity_counts(&[a.clone(), b.clone(), "nope".into()]);
    assert_eq!(counts.len(), 2);

    assert_eq!(counts[0].file_id, a);
    assert_eq!(counts[0].filename, "a.ifc");
    assert_eq!(counts[0].counts.len(), 1);
    assert_eq!(counts[0].counts[0].entity, "IfcWall");
    assert_eq!(counts[0].counts[0].count, 3);

    let b_entities: Vec<(&str, usize)> = counts[1]
        .counts
        .iter()
        .map(|c| (c.entity.as_str(), c.count))
        .collect();
    assert_eq!(b_entities, vec![("IfcDoor", 1), ("IfcWall", 1)]);
}

#[test]
fn test_combined_report() {
    let harness = TestHarness::new();
    let (a, _) = harness.ingest("a.ifc", &three_row_model("a.ifc"));
    let (b, _) = harness.ingest("b.ifc", &two_wall_model("b.ifc"));
    let table = harness.pipe.extract_table(&[a, b]);

    let report = harness.temp_path().join("out").join("combined.csv");
    write_csv_report(&table, &report).unwrap();

    let content = std::fs::read_to_string(&report).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].ends_with(SOURCE_COLUMN));
    assert!(lines[1].ends_with(",a.ifc"));
    assert!(lines[5].ends_with(",b.ifc"));
}
