//! Directed graph of spatial, aggregation, connection, void and fill
//! relationships between model elements.

pub mod builder;
pub mod model;

pub use builder::{build, build_from_path, GraphBuild};
pub use model::{EdgeExport, GraphEdge, GraphExport, GraphModel, GraphNode, RelationKind};
