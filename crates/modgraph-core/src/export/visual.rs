//! Visual graph mapping
//!
//! Turns a [`Graph`] into an abstract node/edge/cluster structure for a
//! layout renderer: one node per module, one cluster per owning project and
//! one edge per dependency. Display attributes follow the module's product.

use std::collections::HashMap;
use std::path::Path;

use crate::graph::{Graph, Module, Product};

/// Node outline shapes understood by graph layout engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeShape {
    Box,
    Box3d,
    Octagon,
    Folder,
    Component,
    Ellipse,
}

impl NodeShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeShape::Box => "box",
            NodeShape::Box3d => "box3d",
            NodeShape::Octagon => "octagon",
            NodeShape::Folder => "folder",
            NodeShape::Component => "component",
            NodeShape::Ellipse => "ellipse",
        }
    }
}

/// Node fill colors (X11 color names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillColor {
    DeepSkyBlue,
    DarkGoldenrod,
    LightSeaGreen,
    Grey90,
    Plum,
    LightGray,
    White,
}

impl FillColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillColor::DeepSkyBlue => "deepskyblue",
            FillColor::DarkGoldenrod => "darkgoldenrod1",
            FillColor::LightSeaGreen => "lightseagreen",
            FillColor::Grey90 => "grey90",
            FillColor::Plum => "plum",
            FillColor::LightGray => "lightgray",
            FillColor::White => "white",
        }
    }
}

/// A group of nodes drawn together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualCluster {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
    pub fill: FillColor,
    /// Identifier of the enclosing cluster
    pub cluster: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualEdge {
    pub from: String,
    pub to: String,
}

/// Layout-agnostic visual graph. Built fresh for every export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisualGraph {
    pub directed: bool,
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
    pub clusters: Vec<VisualCluster>,
}

impl VisualGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.clusters.is_empty()
    }

    /// Nodes that belong to `cluster`
    pub fn nodes_in<'a>(&'a self, cluster: &'a str) -> impl Iterator<Item = &'a VisualNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.cluster.as_deref() == Some(cluster))
    }
}

/// Maps a dependency graph to a visual graph.
pub trait GraphToVisualMapper: Send + Sync {
    fn map(&self, graph: &Graph) -> VisualGraph;
}

/// Default visual mapping: clusters by project, styles by product.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualGraphMapper;

impl VisualGraphMapper {
    pub fn new() -> Self {
        Self
    }

    fn style(module: &Module) -> (NodeShape, FillColor) {
        if module.is_test {
            return (NodeShape::Octagon, FillColor::LightSeaGreen);
        }
        match module.product {
            Product::App => (NodeShape::Box3d, FillColor::DeepSkyBlue),
            Product::Framework | Product::StaticLibrary | Product::DynamicLibrary => {
                if module.is_external {
                    (NodeShape::Box, FillColor::LightGray)
                } else {
                    (NodeShape::Box, FillColor::DarkGoldenrod)
                }
            }
            Product::Bundle => (NodeShape::Folder, FillColor::Grey90),
            Product::CommandLineTool => (NodeShape::Component, FillColor::Plum),
            Product::UnitTests | Product::UiTests => (NodeShape::Ellipse, FillColor::White),
        }
    }
}

fn project_label(project: &Path) -> String {
    project
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| project.display().to_string())
}

impl GraphToVisualMapper for VisualGraphMapper {
    fn map(&self, graph: &Graph) -> VisualGraph {
        let mut clusters = Vec::new();
        let mut cluster_ids: HashMap<&Path, String> = HashMap::new();
        for project in graph.projects() {
            let id = project.display().to_string();
            clusters.push(VisualCluster {
                id: id.clone(),
                label: project_label(project),
            });
            cluster_ids.insert(project, id);
        }

        let nodes = graph
            .modules()
            .map(|module| {
                let (shape, fill) = Self::style(module);
                VisualNode {
                    id: module.id.clone(),
                    label: module.name.clone(),
                    shape,
                    fill,
                    cluster: cluster_ids.get(module.project.as_path()).cloned(),
                }
            })
            .collect();

        let edges = graph
            .modules()
            .flat_map(|module| {
                module.dependencies.iter().map(move |dep| VisualEdge {
                    from: module.id.clone(),
                    to: dep.clone(),
                })
            })
            .collect();

        VisualGraph {
            directed: true,
            nodes,
            edges,
            clusters,
        }
    }
}
