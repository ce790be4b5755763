//! Relationship graphs of completed parses.

mod common;

use common::{containment_model, services_model, IfcBuilder, TestHarness};
use ifcpipe::{IfcPipeError, RelationKind, TaskError, TaskState};

/// A wall in a storey, with one property so the parse completes.
fn storey_model() -> String {
    let mut b = IfcBuilder::new("storey.ifc");
    let wall = b.wall("wall-1", "Wall A");
    let storey = b.storey("storey-1", "Level 1");
    b.contained_in(&[wall], storey);
    b.property_set(&[wall], "Pset_WallCommon", &[("IsExternal", "IFCBOOLEAN(.F.)")]);
    b.build()
}

#[test]
fn test_containment_graph() {
    let harness = TestHarness::new();
    let (id, status) = harness.ingest("storey.ifc", &storey_model());
    assert_eq!(status.state, TaskState::Completed);

    let build = harness.pipe.render_graph(&id).unwrap();
    let graph = &build.graph;
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);

    let (source, target, edge) = graph.edges().next().unwrap();
    assert_eq!(source.global_id, "wall-1");
    assert_eq!(target.global_id, "storey-1");
    assert_eq!(edge.kind, RelationKind::IsContainedIn);
    assert_eq!(edge.kind.label(), "is_contained_in");
    assert_eq!(source.name.as_deref(), Some("Wall A"));
    assert_eq!(build.metadata.authoring_software, "Test Modeler 1.0");
}

#[test]
fn test_every_relation_kind() {
    let mut b = IfcBuilder::new("house.ifc");
    let building = b.building("building", "House");
    let storey = b.storey("storey", "Ground");
    let wall = b.wall("wall", "Wall");
    let opening = b.opening("opening");
    let door = b.door("door", "Front door");
    b.aggregates(building, &[storey]);
    b.contained_in(&[wall, door], storey);
    b.voids(wall, opening);
    b.fills(opening, door);
    b.property_set(&[wall], "Pset_WallCommon", &[("LoadBearing", "IFCBOOLEAN(.T.)")]);

    let harness = TestHarness::new();
    let (id, _) = harness.ingest("house.ifc", &b.build());
    let build = harness.pipe.render_graph(&id).unwrap();

    let edges: Vec<(String, String, &str)> = build
        .graph
        .edges()
        .map(|(s, t, e)| (s.global_id.clone(), t.global_id.clone(), e.kind.label()))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("wall".into(), "storey".into(), "is_contained_in"),
            ("door".into(), "storey".into(), "is_contained_in"),
            ("storey".into(), "building".into(), "is_part_of"),
            ("opening".into(), "wall".into(), "voids_in_element"),
            ("door".into(), "opening".into(), "fills_opening"),
        ]
    );
    assert_eq!(build.graph.node_count(), 5);
    assert_eq!(build.dropped_edges, 0);

    let export = serde_json::to_value(build.graph.to_export()).unwrap();
    assert_eq!(export["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(export["edges"][3]["relation"], "voids_in_element");
    assert_eq!(export["edges"][3]["relationType"], "IfcRelVoidsElement");
}

#[test]
fn test_services_elements_and_clashes() {
    let harness = TestHarness::new();
    let (id, status) = harness.ingest("plant.ifc", &services_model("plant.ifc"));
    assert_eq!(status.state, TaskState::Completed);

    let build = harness.pipe.render_graph(&id).unwrap();
    let graph = &build.graph;
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.node("outlet-1").unwrap().ifc_type, "IfcOutlet");

    let clashes: Vec<_> = graph.edges_of_kind(RelationKind::ConnectsTo).collect();
    assert_eq!(clashes.len(), 1);
    let (source, target, edge) = clashes[0];
    assert_eq!(source.global_id, "ahu-1");
    assert_eq!(target.global_id, "damper-1");
    assert_eq!(edge.relation_type, "IfcRelInterferesElements");
}

#[test]
fn test_graph_of_unknown_file() {
    let harness = TestHarness::new();
    assert!(matches!(
        harness.pipe.render_graph("missing"),
        Err(IfcPipeError::Task(TaskError::NotFound(_)))
    ));
}

#[test]
fn test_graph_of_failed_file() {
    let harness = TestHarness::new();
    let (id, status) = harness.ingest("shell.ifc", &containment_model("shell.ifc"));
    assert_eq!(status.state, TaskState::Failed);

    match harness.pipe.render_graph(&id) {
        Err(IfcPipeError::Task(TaskError::NotCompleted { state, .. })) => {
            assert_eq!(state, TaskState::Failed)
        }
        other => panic!("expected NotCompleted, got {:?}", other.map(|b| b.graph.node_count())),
    }
}
