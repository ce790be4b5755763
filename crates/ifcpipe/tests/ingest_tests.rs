//! Submission, task lifecycle and per-file artifacts.

mod common;

use common::{containment_model, deeply_nested_model, services_model, three_row_model, TestHarness};
use ifcpipe::cache::CacheManager;
use ifcpipe::extract::{PropertyTable, PropertyValue, COLUMNS};
use ifcpipe::{IfcPipeError, TaskError, TaskState};

#[test]
fn test_upload_completes_with_both_artifacts() {
    let harness = TestHarness::new();
    let (id, status) = harness.ingest("tower.ifc", &three_row_model("tower.ifc"));

    assert_eq!(status.state, TaskState::Completed, "{:?}", status.error);
    assert_eq!(status.filename, "tower.ifc");
    assert!(status.error.is_none());
    let artifacts = status.artifacts.expect("artifact locations");
    assert!(artifacts.csv.is_file());
    assert!(artifacts.json.is_file());

    let table = harness.pipe.extract_table(&[id]);
    assert_eq!(table.total_rows(), 3);
    assert_eq!(table.contributing_files, 1);
    for row in &table.rows {
        assert_eq!(row.source_model, "tower.ifc");
        assert_eq!(row.record.file_name, "tower.ifc");
        assert_eq!(row.record.entity, "IfcWall");
    }
    let elements: std::collections::BTreeSet<_> = table
        .rows
        .iter()
        .filter_map(|r| r.record.global_id.clone())
        .collect();
    assert_eq!(elements.len(), 2);
}

#[test]
fn test_artifacts_named_from_file_id() {
    let harness = TestHarness::new();
    let (id, status) = harness.ingest("tower.ifc", &three_row_model("tower.ifc"));
    let artifacts = status.artifacts.unwrap();

    assert_eq!(artifacts.csv, harness.artifact_dir().join(format!("{}.csv", id)));
    assert_eq!(artifacts.json, harness.artifact_dir().join(format!("{}.json", id)));

    let csv = std::fs::read_to_string(&artifacts.csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
    assert_eq!(lines.count(), 3);

    let json: PropertyTable =
        serde_json::from_slice(&std::fs::read(&artifacts.json).unwrap()).unwrap();
    assert_eq!(json.len(), 3);
    let values: Vec<&PropertyValue> = json.iter().map(|r| &r.value).collect();
    assert_eq!(
        values,
        vec![
            &PropertyValue::Bool(true),
            &PropertyValue::Text("REI60".into()),
            &PropertyValue::Real(0.25),
        ]
    );
}

#[test]
fn test_model_without_properties_fails_and_persists_nothing() {
    let harness = TestHarness::new();
    let (id, status) = harness.ingest("shell.ifc", &containment_model("shell.ifc"));

    assert_eq!(status.state, TaskState::Failed);
    assert_eq!(
        status.error.as_deref(),
        Some("Parsing completed but no output files were generated.")
    );
    assert!(status.artifacts.is_none());
    assert!(harness.artifact_files().is_empty());
    assert!(!harness
        .cache_dir()
        .join(CacheManager::cache_key(&id))
        .exists());
    assert!(harness.pipe.file(&id).unwrap().cached_table.is_none());
}

#[test]
fn test_corrupt_file_fails() {
    let harness = TestHarness::new();
    let (_, status) = harness.ingest("broken.ifc", "this is not a STEP file");

    assert_eq!(status.state, TaskState::Failed);
    assert!(status.error.unwrap().contains("Failed to open model"));
    assert!(harness.artifact_files().is_empty());
}

#[test]
fn test_deeply_nested_file_fails_and_service_keeps_running() {
    let harness = TestHarness::new();
    let (_, status) = harness.ingest("nested.ifc", &deeply_nested_model("nested.ifc", 200_000));

    assert_eq!(status.state, TaskState::Failed);
    assert!(status.error.unwrap().contains("Failed to open model"));
    assert!(harness.artifact_files().is_empty());

    let (_, next) = harness.ingest("tower.ifc", &three_row_model("tower.ifc"));
    assert_eq!(next.state, TaskState::Completed);
}

#[test]
fn test_building_services_elements_are_extracted() {
    let harness = TestHarness::new();
    let (id, status) = harness.ingest("plant.ifc", &services_model("plant.ifc"));
    assert_eq!(status.state, TaskState::Completed, "{:?}", status.error);

    let table = harness.pipe.extract_table(&[id]);
    let entities: Vec<&str> = table.rows.iter().map(|r| r.record.entity.as_str()).collect();
    assert_eq!(
        entities,
        vec!["IfcWall", "IfcUnitaryEquipment", "IfcDamper", "IfcOutlet", "IfcController"]
    );
}

#[test]
fn test_status_of_unknown_id() {
    let harness = TestHarness::new();
    let result = harness.pipe.status("does-not-exist");
    assert!(matches!(
        result,
        Err(IfcPipeError::Task(TaskError::NotFound(_)))
    ));
}

#[test]
fn test_metadata_recorded_at_submission() {
    let harness = TestHarness::new();
    let (id, _) = harness.ingest("tower.ifc", &three_row_model("tower.ifc"));

    let record = harness.pipe.file(&id).unwrap();
    assert_eq!(record.metadata.file_name.as_deref(), Some("tower.ifc"));
    assert_eq!(record.metadata.schema, "IFC4");
    assert_eq!(record.metadata.authoring_software, "Test Modeler 1.0");
}

#[test]
fn test_metadata_unknown_for_unreadable_file() {
    let harness = TestHarness::new();
    let (id, _) = harness.ingest("broken.ifc", "garbage");

    let record = harness.pipe.file(&id).unwrap();
    assert_eq!(record.metadata.schema, "Unknown");
    assert_eq!(record.metadata.authoring_software, "Unknown");
}

#[test]
fn test_state_changes_are_broadcast() {
    let harness = TestHarness::new();
    let mut events = harness.pipe.subscribe();
    let (id, _) = harness.ingest("tower.ifc", &three_row_model("tower.ifc"));

    // the completion event can trail the status update slightly
    let states: Vec<TaskState> = (0..3)
        .map(|_| {
            let event = events.blocking_recv().unwrap();
            assert_eq!(event.file_id, id);
            event.state
        })
        .collect();
    assert_eq!(
        states,
        vec![TaskState::Pending, TaskState::Processing, TaskState::Completed]
    );
}

#[test]
fn test_many_submissions_all_finish() {
    let harness = TestHarness::new();
    let ids: Vec<String> = (0..8)
        .map(|i| {
            let name = format!("model{}.ifc", i);
            harness.submit(&name, &three_row_model(&name))
        })
        .collect();

    let statuses = harness.pipe.wait_all(&ids, common::harness::WAIT).unwrap();
    assert!(statuses.iter().all(|s| s.state == TaskState::Completed));
    assert_eq!(harness.pipe.statuses().len(), 8);
    assert_eq!(harness.pipe.extract_table(&ids).total_rows(), 24);
}
