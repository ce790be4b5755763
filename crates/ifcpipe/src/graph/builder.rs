use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use petgraph::graph::NodeIndex;
use tracing::{debug, info, info_span, warn};

use crate::error::ExtractError;
use crate::model::schema::{self, attr};
use crate::model::{IfcModel, ModelMetadata};
use crate::step::EntityInstance;

use super::model::{GraphEdge, GraphModel, GraphNode, RelationKind};

/// Result of one graph build.
#[derive(Debug, Clone)]
pub struct GraphBuild {
    pub graph: GraphModel,
    pub metadata: ModelMetadata,
    pub elapsed: Duration,
    /// Products left out for lack of a global id.
    pub skipped_nodes: usize,
    /// Relationship endpoints that did not resolve to a node.
    pub dropped_edges: usize,
}

/// Opens the model at `path` and builds its relationship graph.
pub fn build_from_path(path: &Path) -> Result<GraphBuild, ExtractError> {
    let model = IfcModel::open(path).map_err(|source| ExtractError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(build(&model))
}

/// Builds the element graph: one node per product carrying a global id and
/// one edge per resolvable relationship endpoint pair.
pub fn build(model: &IfcModel) -> GraphBuild {
    let _span = info_span!("build_graph", instances = model.len()).entered();
    let started = Instant::now();

    let mut builder = Builder {
        model,
        graph: GraphModel::new(),
        nodes: HashMap::new(),
        skipped_nodes: 0,
        dropped_edges: 0,
    };
    builder.add_products();

    // Contained element -> spatial structure
    builder.add_relations(
        schema::IFC_REL_CONTAINED_IN_SPATIAL_STRUCTURE,
        RelationKind::IsContainedIn,
        |rel| {
            let structure = rel.ref_arg(attr::CONTAINED_RELATING_STRUCTURE);
            rel.ref_list_arg(attr::CONTAINED_RELATED_ELEMENTS)
                .into_iter()
                .map(|element| (Some(element), structure))
                .collect()
        },
    );

    // Part -> whole
    builder.add_relations(schema::IFC_REL_AGGREGATES, RelationKind::IsPartOf, |rel| {
        let whole = rel.ref_arg(attr::AGGREGATES_RELATING_OBJECT);
        rel.ref_list_arg(attr::AGGREGATES_RELATED_OBJECTS)
            .into_iter()
            .map(|part| (Some(part), whole))
            .collect()
    });

    builder.add_relations(
        schema::IFC_REL_CONNECTS_ELEMENTS,
        RelationKind::ConnectsTo,
        |rel| {
            vec![(
                rel.ref_arg(attr::CONNECTS_RELATING_ELEMENT),
                rel.ref_arg(attr::CONNECTS_RELATED_ELEMENT),
            )]
        },
    );
    builder.add_relations(
        schema::IFC_REL_INTERFERES_ELEMENTS,
        RelationKind::ConnectsTo,
        |rel| {
            vec![(
                rel.ref_arg(attr::INTERFERES_RELATING_ELEMENT),
                rel.ref_arg(attr::INTERFERES_RELATED_ELEMENT),
            )]
        },
    );

    // Opening -> voided element
    builder.add_relations(
        schema::IFC_REL_VOIDS_ELEMENT,
        RelationKind::VoidsInElement,
        |rel| {
            vec![(
                rel.ref_arg(attr::VOIDS_RELATED_OPENING_ELEMENT),
                rel.ref_arg(attr::VOIDS_RELATING_BUILDING_ELEMENT),
            )]
        },
    );

    // Filling element -> opening
    builder.add_relations(
        schema::IFC_REL_FILLS_ELEMENT,
        RelationKind::FillsOpening,
        |rel| {
            vec![(
                rel.ref_arg(attr::FILLS_RELATED_BUILDING_ELEMENT),
                rel.ref_arg(attr::FILLS_RELATING_OPENING_ELEMENT),
            )]
        },
    );

    let elapsed = started.elapsed();
    info!(
        nodes = builder.graph.node_count(),
        edges = builder.graph.edge_count(),
        skipped_nodes = builder.skipped_nodes,
        dropped_edges = builder.dropped_edges,
        elapsed_ms = elapsed.as_millis() as u64,
        "Graph built"
    );

    GraphBuild {
        graph: builder.graph,
        metadata: ModelMetadata::from_model(model),
        elapsed,
        skipped_nodes: builder.skipped_nodes,
        dropped_edges: builder.dropped_edges,
    }
}

struct Builder<'a> {
    model: &'a IfcModel,
    graph: GraphModel,
    /// Instance id -> node; two instances sharing a global id share a node.
    nodes: HashMap<u64, NodeIndex>,
    skipped_nodes: usize,
    dropped_edges: usize,
}

impl Builder<'_> {
    fn add_products(&mut self) {
        for product in self.model.by_type(schema::IFC_PRODUCT) {
            let Some(global_id) = product.str_arg(attr::GLOBAL_ID) else {
                warn!(step_id = product.id, "Product without GlobalId skipped");
                self.skipped_nodes += 1;
                continue;
            };

            let (idx, added) = self.graph.add_node(GraphNode {
                global_id: global_id.to_string(),
                ifc_type: self.model.type_of(product).to_string(),
                name: product.str_arg(attr::NAME).map(str::to_string),
                description: product.str_arg(attr::DESCRIPTION).map(str::to_string),
                step_id: product.id,
            });
            if !added {
                warn!(step_id = product.id, global_id, "Duplicate GlobalId");
            }
            self.nodes.insert(product.id, idx);
        }
    }

    fn add_relations<F>(&mut self, entity: &str, kind: RelationKind, endpoints: F)
    where
        F: Fn(&EntityInstance) -> Vec<(Option<u64>, Option<u64>)>,
    {
        let model = self.model;
        for rel in model.by_type(entity) {
            for (source, target) in endpoints(rel) {
                let resolved = (
                    source.and_then(|id| self.nodes.get(&id)),
                    target.and_then(|id| self.nodes.get(&id)),
                );
                let (Some(&source), Some(&target)) = resolved else {
                    debug!(relation_id = rel.id, relation = %kind, "Dangling relationship endpoint");
                    self.dropped_edges += 1;
                    continue;
                };

                self.graph.add_edge(
                    source,
                    target,
                    GraphEdge {
                        kind,
                        relation_type: model.type_of(rel).to_string(),
                        name: rel.str_arg(attr::NAME).map(str::to_string),
                        relation_id: rel.id,
                    },
                );
            }
        }
    }
}
