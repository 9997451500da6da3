//! Export Mappers
//!
//! Renders a final [`Graph`] into one of the supported external formats:
//!
//! | Format | Extension | Encoder |
//! |--------|-----------|---------|
//! | `dot` | `graph.dot` | [`GraphToVisualMapper`] + [`VisualGraphRenderer`] |
//! | `json` | `graph.json` | [`json::encode`] (current schema) |
//! | `legacy-json` | `graph.json` | [`legacy::encode`] (legacy schema) |

pub mod dot;
pub mod json;
pub mod legacy;
pub mod visual;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{Graph, GraphError};

pub use dot::{DotRenderer, LayoutAlgorithm, VisualGraphRenderer};
pub use visual::{GraphToVisualMapper, VisualGraph, VisualGraphMapper};

/// Errors that can occur while encoding a graph.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON encoding or decoding failed
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A decoded document does not describe a valid graph
    #[error("decoded graph is invalid: {0}")]
    Graph(#[from] GraphError),

    /// Writing DOT text failed
    #[error("failed to format visual graph: {0}")]
    Format(#[from] std::fmt::Error),

    /// A renderer could not produce output
    #[error("failed to render visual graph: {0}")]
    Render(String),

    /// A format or layout name was not recognized
    #[error("unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

/// Output formats of a graph export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphFormat {
    /// Graphviz DOT
    #[default]
    Dot,
    /// Current JSON schema
    Json,
    /// Legacy JSON schema
    LegacyJson,
}

impl GraphFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphFormat::Dot => "dot",
            GraphFormat::Json => "json",
            GraphFormat::LegacyJson => "legacy-json",
        }
    }

    /// File extension of the exported artifact
    pub fn extension(&self) -> &'static str {
        match self {
            GraphFormat::Dot => "dot",
            GraphFormat::Json | GraphFormat::LegacyJson => "json",
        }
    }

    /// Fixed artifact file name (`graph.<extension>`)
    pub fn file_name(&self) -> String {
        format!("graph.{}", self.extension())
    }
}

impl std::fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GraphFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            "legacy-json" | "legacyjson" | "legacy_json" => Ok(Self::LegacyJson),
            _ => Err(ExportError::UnknownValue {
                kind: "graph format",
                value: s.to_string(),
            }),
        }
    }
}

/// Encodes graphs in any [`GraphFormat`].
///
/// The visual mapping and the renderer are pluggable so callers can swap in
/// a different layout engine.
pub struct GraphEncoder {
    visual_mapper: Box<dyn GraphToVisualMapper>,
    renderer: Box<dyn VisualGraphRenderer>,
}

impl Default for GraphEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphEncoder {
    /// Encoder using [`VisualGraphMapper`] and [`DotRenderer`]
    pub fn new() -> Self {
        Self {
            visual_mapper: Box::new(VisualGraphMapper::new()),
            renderer: Box::new(DotRenderer::new()),
        }
    }

    pub fn with_visual_mapper(mut self, mapper: impl GraphToVisualMapper + 'static) -> Self {
        self.visual_mapper = Box::new(mapper);
        self
    }

    pub fn with_renderer(mut self, renderer: impl VisualGraphRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Encode `graph` in `format`. `layout` only affects the visual format.
    pub fn encode(
        &self,
        graph: &Graph,
        format: GraphFormat,
        layout: LayoutAlgorithm,
    ) -> Result<Vec<u8>, ExportError> {
        match format {
            GraphFormat::Dot => {
                let visual = self.visual_mapper.map(graph);
                self.renderer.render(&visual, layout)
            }
            GraphFormat::Json => json::encode(graph).map(String::into_bytes),
            GraphFormat::LegacyJson => legacy::encode(graph).map(String::into_bytes),
        }
    }
}

impl std::fmt::Debug for GraphEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphEncoder").finish_non_exhaustive()
    }
}
