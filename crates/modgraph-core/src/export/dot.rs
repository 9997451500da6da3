//! DOT rendering
//!
//! Renders a [`VisualGraph`] to Graphviz DOT text. The layout algorithm is
//! written as the `layout` graph attribute and has no influence on the
//! visual structure itself.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::visual::{VisualGraph, VisualNode};
use super::ExportError;

/// Text of a visual graph with no nodes, edges or clusters.
pub const EMPTY_GRAPH: &str = "graph { }";

/// Named graph layout strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutAlgorithm {
    #[default]
    Dot,
    Neato,
    Twopi,
    Circo,
    Fdp,
    Sfdp,
    Patchwork,
    Osage,
}

impl LayoutAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutAlgorithm::Dot => "dot",
            LayoutAlgorithm::Neato => "neato",
            LayoutAlgorithm::Twopi => "twopi",
            LayoutAlgorithm::Circo => "circo",
            LayoutAlgorithm::Fdp => "fdp",
            LayoutAlgorithm::Sfdp => "sfdp",
            LayoutAlgorithm::Patchwork => "patchwork",
            LayoutAlgorithm::Osage => "osage",
        }
    }
}

impl std::fmt::Display for LayoutAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LayoutAlgorithm {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" => Ok(Self::Dot),
            "neato" => Ok(Self::Neato),
            "twopi" => Ok(Self::Twopi),
            "circo" => Ok(Self::Circo),
            "fdp" => Ok(Self::Fdp),
            "sfdp" => Ok(Self::Sfdp),
            "patchwork" => Ok(Self::Patchwork),
            "osage" => Ok(Self::Osage),
            _ => Err(ExportError::UnknownValue {
                kind: "layout algorithm",
                value: s.to_string(),
            }),
        }
    }
}

/// Renders a visual graph to bytes.
pub trait VisualGraphRenderer: Send + Sync {
    fn render(&self, graph: &VisualGraph, layout: LayoutAlgorithm) -> Result<Vec<u8>, ExportError>;
}

/// Renders Graphviz DOT source.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

impl DotRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render to a DOT string.
    pub fn render_to_string(
        &self,
        graph: &VisualGraph,
        layout: LayoutAlgorithm,
    ) -> Result<String, ExportError> {
        if graph.is_empty() {
            return Ok(EMPTY_GRAPH.to_string());
        }

        let (keyword, arrow) = if graph.directed {
            ("digraph", "->")
        } else {
            ("graph", "--")
        };

        let mut out = String::new();
        writeln!(out, "{} {{", keyword)?;
        writeln!(out, "  layout={}", layout.as_str())?;

        for (index, cluster) in graph.clusters.iter().enumerate() {
            writeln!(out, "  subgraph \"cluster_{}\" {{", index)?;
            writeln!(out, "    label={}", quote(&cluster.label))?;
            for node in graph.nodes_in(&cluster.id) {
                write_node(&mut out, node, "    ")?;
            }
            writeln!(out, "  }}")?;
        }

        let clustered: std::collections::HashSet<&str> =
            graph.clusters.iter().map(|c| c.id.as_str()).collect();
        for node in graph
            .nodes
            .iter()
            .filter(|n| !n.cluster.as_deref().is_some_and(|c| clustered.contains(c)))
        {
            write_node(&mut out, node, "  ")?;
        }

        for edge in &graph.edges {
            writeln!(out, "  {} {} {}", quote(&edge.from), arrow, quote(&edge.to))?;
        }

        out.push('}');
        Ok(out)
    }
}

impl VisualGraphRenderer for DotRenderer {
    fn render(&self, graph: &VisualGraph, layout: LayoutAlgorithm) -> Result<Vec<u8>, ExportError> {
        self.render_to_string(graph, layout).map(String::into_bytes)
    }
}

fn write_node(out: &mut String, node: &VisualNode, indent: &str) -> std::fmt::Result {
    writeln!(
        out,
        "{}{} [label={}, shape={}, style=filled, fillcolor={}]",
        indent,
        quote(&node.id),
        quote(&node.label),
        node.shape.as_str(),
        node.fill.as_str()
    )
}

/// Quote a DOT identifier.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
