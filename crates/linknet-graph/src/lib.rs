//! Relationship-graph construction and rendering for linknet.
//!
//! Builds a star-shaped graph with the archive owner at the hub and one node
//! per sufficiently frequent column value, then renders it to JSON or
//! Graphviz DOT through the [`render::GraphRenderer`] seam.

pub mod builder;
pub mod render;

pub use builder::{build_graph, GraphConfig, GraphEdge, GraphNode, RelationshipGraph, SizeScale};
pub use render::{DotRenderer, GraphRenderer, JsonRenderer};
