//! Modgraph Core - Module dependency graph construction, filtering and export
//!
//! This crate provides the core functionality of graph generation:
//! - The module graph model with validated dependency edges
//! - A mapper pipeline of pure graph-to-graph transformations
//! - Filter mappers (target names, platform, test targets, external dependencies)
//! - Exporters for Graphviz DOT and two JSON schemas (current and legacy)
//! - A manifest loader that builds the initial graph from `Project.toml` files

pub mod environment;
pub mod export;
pub mod filters;
pub mod graph;
pub mod loader;
pub mod mapper;

// Re-exports for convenience
pub use environment::{MapperEnvironment, PruneReason, PrunedModule};
pub use export::{
    DotRenderer, ExportError, GraphEncoder, GraphFormat, GraphToVisualMapper, LayoutAlgorithm,
    VisualGraph, VisualGraphMapper, VisualGraphRenderer,
};
pub use filters::{
    ExternalDependencyFilter, GraphFilters, PlatformFilter, PlatformSelection, TargetNameFilter,
    TargetSelection, TestTargetFilter,
};
pub use graph::{Graph, GraphError, Module, Platform, Product};
pub use loader::{LoadIssue, LoadedGraph, LoaderError, ManifestLoader};
pub use mapper::{GraphMapper, MapperError, MapperPipeline};
