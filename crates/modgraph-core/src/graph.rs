//! Module Graph Model
//!
//! This module defines the in-memory dependency graph: modules (buildable
//! units such as apps, frameworks and test bundles) and the dependency edges
//! between them.
//!
//! A [`Graph`] is an immutable value snapshot. It is validated once on
//! construction (every dependency must resolve to a module of the same graph)
//! and every transformation produces a new graph instead of mutating in place.
//!
//! Internally the dependency lists are mirrored into a `petgraph::StableGraph`
//! so traversals (dependency closure, reverse edges, cycle detection) run on
//! adjacency lists. Cycles are permitted; every traversal tracks visited nodes.

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::Dfs;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while constructing or querying a graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A dependency edge references a module that is not part of the graph
    #[error("invalid graph: module '{module}' depends on unknown module '{dependency}'")]
    InvalidGraph { module: String, dependency: String },

    /// Two modules share the same identifier
    #[error("invalid graph: duplicate module identifier '{0}'")]
    DuplicateModule(String),

    /// A lookup referenced a module that does not exist
    #[error("module '{0}' not found in graph")]
    UnknownModule(String),

    /// A string could not be parsed into a graph value
    #[error("invalid {kind} '{value}'")]
    InvalidValue { kind: &'static str, value: String },
}

// ============================================================================
// Platforms and Products
// ============================================================================

/// Platforms a module can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Macos,
    Tvos,
    Watchos,
    Visionos,
}

impl Platform {
    /// All platforms, in display order.
    pub const ALL: [Platform; 5] = [
        Platform::Ios,
        Platform::Macos,
        Platform::Tvos,
        Platform::Watchos,
        Platform::Visionos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Macos => "macos",
            Platform::Tvos => "tvos",
            Platform::Watchos => "watchos",
            Platform::Visionos => "visionos",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "macos" => Ok(Platform::Macos),
            "tvos" => Ok(Platform::Tvos),
            "watchos" => Ok(Platform::Watchos),
            "visionos" => Ok(Platform::Visionos),
            _ => Err(GraphError::InvalidValue {
                kind: "platform",
                value: s.to_string(),
            }),
        }
    }
}

/// The kind of artifact a module produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Product {
    App,
    Framework,
    StaticLibrary,
    DynamicLibrary,
    Bundle,
    UnitTests,
    UiTests,
    CommandLineTool,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::App => "app",
            Product::Framework => "framework",
            Product::StaticLibrary => "static-library",
            Product::DynamicLibrary => "dynamic-library",
            Product::Bundle => "bundle",
            Product::UnitTests => "unit-tests",
            Product::UiTests => "ui-tests",
            Product::CommandLineTool => "command-line-tool",
        }
    }

    /// Whether modules of this product are test bundles
    pub fn is_test(&self) -> bool {
        matches!(self, Product::UnitTests | Product::UiTests)
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Module
// ============================================================================

/// A buildable unit and a node of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Unique identifier (`<project path>:<name>`)
    pub id: String,

    /// Display name
    pub name: String,

    /// Path of the owning project
    pub project: PathBuf,

    /// Produced artifact
    pub product: Product,

    /// Platforms the module builds for. Empty means platform-agnostic.
    pub platforms: BTreeSet<Platform>,

    /// Test bundle flag
    pub is_test: bool,

    /// Sourced from a dependency manager rather than the local workspace
    pub is_external: bool,

    /// Identifiers of direct dependencies, in declaration order
    pub dependencies: Vec<String>,
}

impl Module {
    /// Create a module owned by `project`. The test flag follows the product.
    pub fn new(project: impl Into<PathBuf>, name: impl Into<String>, product: Product) -> Self {
        let project = project.into();
        let name = name.into();
        Self {
            id: Self::make_id(&project, &name),
            name,
            project,
            product,
            platforms: BTreeSet::new(),
            is_test: product.is_test(),
            is_external: false,
            dependencies: Vec::new(),
        }
    }

    /// Build the identifier of the module `name` in `project`.
    pub fn make_id(project: &Path, name: &str) -> String {
        format!("{}:{}", project.display(), name)
    }

    pub fn with_platforms(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.platforms = platforms.into_iter().collect();
        self
    }

    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn with_test(mut self, is_test: bool) -> Self {
        self.is_test = is_test;
        self
    }

    pub fn with_external(mut self, is_external: bool) -> Self {
        self.is_external = is_external;
        self
    }

    /// Whether this module can be built for `platform`
    pub fn supports(&self, platform: Platform) -> bool {
        self.platforms.is_empty() || self.platforms.contains(&platform)
    }
}

// ============================================================================
// Graph
// ============================================================================

/// A validated module dependency graph.
///
/// Modules are kept in insertion order, which is the order used by every
/// traversal and exporter.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    path: PathBuf,

    /// Module nodes with one edge per dependency
    graph: StableGraph<Module, (), petgraph::Directed>,

    /// Map from module ID to petgraph NodeIndex for O(1) lookup
    node_index_map: HashMap<String, NodeIndex>,
}

impl Graph {
    /// Build a graph from module records.
    ///
    /// Fails with [`GraphError::InvalidGraph`] if any dependency does not
    /// resolve to a module in `modules`. Repeated dependency entries are
    /// collapsed to their first occurrence.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        modules: impl IntoIterator<Item = Module>,
    ) -> Result<Self, GraphError> {
        let mut graph = StableGraph::new();
        let mut node_index_map = HashMap::new();

        for mut module in modules {
            if node_index_map.contains_key(&module.id) {
                return Err(GraphError::DuplicateModule(module.id));
            }
            let mut seen = HashSet::new();
            module.dependencies.retain(|dep| seen.insert(dep.clone()));

            let id = module.id.clone();
            let idx = graph.add_node(module);
            node_index_map.insert(id, idx);
        }

        let indices: Vec<NodeIndex> = graph.node_indices().collect();
        for source in indices {
            let targets = graph[source]
                .dependencies
                .iter()
                .map(|dep| {
                    node_index_map
                        .get(dep)
                        .copied()
                        .ok_or_else(|| GraphError::InvalidGraph {
                            module: graph[source].id.clone(),
                            dependency: dep.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            for target in targets {
                graph.add_edge(source, target, ());
            }
        }

        Ok(Self {
            name: name.into(),
            path: path.into(),
            graph,
            node_index_map,
        })
    }

    /// Create a graph with no modules
    pub fn empty(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            graph: StableGraph::new(),
            node_index_map: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of dependency edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    /// Iterate over all modules in insertion order
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx))
    }

    /// Get a module by its identifier
    pub fn module(&self, id: &str) -> Option<&Module> {
        self.node_index_map
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index_map.contains_key(id)
    }

    /// Modules whose display name equals `name`
    pub fn modules_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Module> + 'a {
        self.modules().filter(move |m| m.name == name)
    }

    /// Distinct project paths, in order of first appearance
    pub fn projects(&self) -> Vec<&Path> {
        let mut seen = HashSet::new();
        self.modules()
            .map(|m| m.project.as_path())
            .filter(|p| seen.insert(*p))
            .collect()
    }

    /// Modules owned by the project at `project`
    pub fn modules_in_project<'a>(
        &'a self,
        project: &'a Path,
    ) -> impl Iterator<Item = &'a Module> + 'a {
        self.modules().filter(move |m| m.project == project)
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    /// Direct dependencies of a module, in declaration order
    pub fn dependencies(&self, id: &str) -> Result<Vec<&Module>, GraphError> {
        let module = self
            .module(id)
            .ok_or_else(|| GraphError::UnknownModule(id.to_string()))?;
        Ok(module
            .dependencies
            .iter()
            .filter_map(|dep| self.module(dep))
            .collect())
    }

    /// Modules that directly depend on `id`, in insertion order
    pub fn dependents(&self, id: &str) -> Result<Vec<&Module>, GraphError> {
        let idx = self
            .node_index_map
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownModule(id.to_string()))?;
        let sources: HashSet<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect();
        Ok(self
            .graph
            .node_indices()
            .filter(|i| sources.contains(i))
            .filter_map(|i| self.graph.node_weight(i))
            .collect())
    }

    /// The given modules plus everything they transitively depend on.
    ///
    /// Unknown identifiers are ignored. The result is in insertion order.
    pub fn dependency_closure<'a, I>(&self, roots: I) -> Vec<&Module>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut dfs = Dfs::empty(&self.graph);
        let mut reached = HashSet::new();

        for root in roots {
            let Some(&start) = self.node_index_map.get(root) else {
                continue;
            };
            dfs.move_to(start);
            while let Some(idx) = dfs.next(&self.graph) {
                reached.insert(idx);
            }
        }

        self.graph
            .node_indices()
            .filter(|i| reached.contains(i))
            .filter_map(|i| self.graph.node_weight(i))
            .collect()
    }

    /// Whether the dependency edges form at least one cycle
    pub fn has_cycles(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    // ------------------------------------------------------------------------
    // Rewriting
    // ------------------------------------------------------------------------

    /// Build a new graph with only the modules matching `keep`.
    ///
    /// Dependencies on dropped modules are removed from the survivors. Returns
    /// the new graph together with the dropped modules.
    pub fn retain<F>(&self, mut keep: F) -> Result<(Graph, Vec<Module>), GraphError>
    where
        F: FnMut(&Module) -> bool,
    {
        let (kept, dropped): (Vec<Module>, Vec<Module>) =
            self.modules().cloned().partition(|m| keep(m));

        let surviving: HashSet<String> = kept.iter().map(|m| m.id.clone()).collect();
        let kept = kept.into_iter().map(|mut module| {
            module.dependencies.retain(|dep| surviving.contains(dep));
            module
        });

        let graph = Graph::new(self.name.clone(), self.path.clone(), kept)?;
        Ok((graph, dropped))
    }

    /// Consume the graph, returning its modules in insertion order
    pub fn into_modules(self) -> Vec<Module> {
        let mut graph = self.graph;
        let indices: Vec<NodeIndex> = graph.node_indices().collect();
        indices
            .into_iter()
            .filter_map(|idx| graph.remove_node(idx))
            .collect()
    }
}

impl PartialEq for Graph {
    /// Graphs are equal when name, path and the module set match; module
    /// order is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.path == other.path
            && self.len() == other.len()
            && self
                .modules()
                .all(|m| other.module(&m.id).is_some_and(|o| o == m))
    }
}

impl Eq for Graph {}
