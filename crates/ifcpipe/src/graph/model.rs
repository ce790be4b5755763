use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Semantic kind of a relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Element -> containing spatial structure.
    IsContainedIn,
    /// Part -> aggregate whole.
    IsPartOf,
    /// Relating element -> related element.
    ConnectsTo,
    /// Opening -> voided element.
    VoidsInElement,
    /// Filling element -> filled opening.
    FillsOpening,
}

impl RelationKind {
    pub fn label(self) -> &'static str {
        match self {
            RelationKind::IsContainedIn => "is_contained_in",
            RelationKind::IsPartOf => "is_part_of",
            RelationKind::ConnectsTo => "connects_to",
            RelationKind::VoidsInElement => "voids_in_element",
            RelationKind::FillsOpening => "fills_opening",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub global_id: String,
    /// Most-derived entity name, e.g. `IfcWallStandardCase`.
    pub ifc_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Instance id in the source file (`#42` -> 42).
    pub step_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub kind: RelationKind,
    /// Entity name of the relationship, e.g. `IfcRelContainedInSpatialStructure`.
    pub relation_type: String,
    /// The relationship's own `Name`, when it has one.
    pub name: Option<String>,
    pub relation_id: u64,
}

/// Directed element graph keyed by global id. Parallel edges are allowed.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    graph: DiGraph<GraphNode, GraphEdge>,
    index: HashMap<String, NodeIndex>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node unless its global id is already present. Returns the index
    /// of the node holding that id.
    pub fn add_node(&mut self, node: GraphNode) -> (NodeIndex, bool) {
        if let Some(idx) = self.index.get(&node.global_id) {
            return (*idx, false);
        }
        let key = node.global_id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        (idx, true)
    }

    pub(crate) fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, edge: GraphEdge) {
        self.graph.add_edge(source, target, edge);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_node(&self, global_id: &str) -> bool {
        self.index.contains_key(global_id)
    }

    pub fn node(&self, global_id: &str) -> Option<&GraphNode> {
        self.index.get(global_id).map(|idx| &self.graph[*idx])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Edges in insertion order as (source, target, edge).
    pub fn edges(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode, &GraphEdge)> {
        self.graph.edge_references().map(move |e| {
            (
                &self.graph[e.source()],
                &self.graph[e.target()],
                e.weight(),
            )
        })
    }

    pub fn edges_of_kind(&self, kind: RelationKind) -> impl Iterator<Item = (&GraphNode, &GraphNode, &GraphEdge)> {
        self.edges().filter(move |(_, _, e)| e.kind == kind)
    }

    /// Outgoing edges of a node.
    pub fn neighbors(&self, global_id: &str) -> Vec<(&GraphNode, &GraphEdge)> {
        let Some(idx) = self.index.get(global_id) else {
            return Vec::new();
        };
        let mut out: Vec<_> = self
            .graph
            .edges(*idx)
            .map(|e| (e.id(), &self.graph[e.target()], e.weight()))
            .collect();
        out.sort_by_key(|(id, _, _)| *id);
        out.into_iter().map(|(_, n, e)| (n, e)).collect()
    }

    /// Flat, serializable copy of the graph.
    pub fn to_export(&self) -> GraphExport {
        GraphExport {
            nodes: self.nodes().cloned().collect(),
            edges: self
                .edges()
                .map(|(s, t, e)| EdgeExport {
                    source: s.global_id.clone(),
                    target: t.global_id.clone(),
                    relation: e.kind,
                    relation_type: e.relation_type.clone(),
                    name: e.name.clone(),
                    relation_id: e.relation_id,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeExport {
    pub source: String,
    pub target: String,
    pub relation: RelationKind,
    pub relation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub relation_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EdgeExport>,
}
