//! Mapper Pipeline
//!
//! A mapper is a pure transformation `(Graph, MapperEnvironment) ->
//! (Graph, MapperEnvironment)`. The pipeline runs an explicit, caller-supplied
//! list of mappers in order and stops at the first failure.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modgraph_core::{GraphFilters, MapperEnvironment};
//!
//! let pipeline = GraphFilters::default().pipeline();
//! let (graph, env) = pipeline.run(graph, MapperEnvironment::new())?;
//! ```

use thiserror::Error;
use tracing::debug;

use crate::environment::MapperEnvironment;
use crate::graph::{Graph, GraphError};

/// Errors produced by a mapper.
#[derive(Debug, Error)]
pub enum MapperError {
    /// The mapper produced a graph that failed validation
    #[error("mapper '{mapper}' produced an invalid graph: {source}")]
    Graph {
        mapper: String,
        #[source]
        source: GraphError,
    },

    /// The mapper could not complete
    #[error("mapper '{mapper}' failed: {message}")]
    Failed { mapper: String, message: String },
}

impl MapperError {
    /// Create a Graph error for `mapper`.
    pub fn graph(mapper: impl Into<String>, source: GraphError) -> Self {
        Self::Graph {
            mapper: mapper.into(),
            source,
        }
    }

    /// Create a Failed error for `mapper`.
    pub fn failed(mapper: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            mapper: mapper.into(),
            message: message.into(),
        }
    }

    /// Name of the mapper that failed
    pub fn mapper(&self) -> &str {
        match self {
            Self::Graph { mapper, .. } | Self::Failed { mapper, .. } => mapper,
        }
    }
}

/// A graph-to-graph transformation.
///
/// Implementations must not touch shared state: everything a mapper produces
/// is carried in the returned graph and environment.
pub trait GraphMapper: Send + Sync {
    /// Stable name used in logs, errors and the environment
    fn name(&self) -> &'static str;

    fn map(
        &self,
        graph: Graph,
        environment: MapperEnvironment,
    ) -> Result<(Graph, MapperEnvironment), MapperError>;
}

/// An ordered sequence of mappers.
#[derive(Default)]
pub struct MapperPipeline {
    mappers: Vec<Box<dyn GraphMapper>>,
}

impl MapperPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mapper to the end of the pipeline
    pub fn with(mut self, mapper: impl GraphMapper + 'static) -> Self {
        self.mappers.push(Box::new(mapper));
        self
    }

    pub fn push(&mut self, mapper: Box<dyn GraphMapper>) {
        self.mappers.push(mapper);
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Mapper names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.mappers.iter().map(|m| m.name()).collect()
    }

    /// Run every mapper in order, short-circuiting on the first error.
    pub fn run(
        &self,
        graph: Graph,
        environment: MapperEnvironment,
    ) -> Result<(Graph, MapperEnvironment), MapperError> {
        let mut graph = graph;
        let mut environment = environment;

        for mapper in &self.mappers {
            let before = graph.len();
            let (mapped, mut env) = mapper.map(graph, environment)?;
            env.record_applied(mapper.name());
            debug!(
                mapper = mapper.name(),
                before,
                after = mapped.len(),
                "Applied graph mapper"
            );
            graph = mapped;
            environment = env;
        }

        Ok((graph, environment))
    }
}

impl std::fmt::Debug for MapperPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperPipeline")
            .field("mappers", &self.names())
            .finish()
    }
}
