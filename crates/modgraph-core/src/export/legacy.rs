//! Legacy JSON schema
//!
//! The older project-automation format, kept for consumers that have not
//! moved to the current schema. Projects carry `targets` and dependencies are
//! tagged by kind:
//!
//! ```json
//! {"name":"graph","path":"/ws","projects":{"/ws/App":{"name":"App","path":"/ws/App",
//!   "isExternal":false,"targets":[{"name":"App","product":"app","platforms":["ios"],
//!   "dependencies":[{"target":{"name":"Core"}},{"project":{"target":"Kit","path":"/ws/Kit"}},
//!   {"external":{"name":"Alamofire"}}]}]}}}
//! ```
//!
//! Output is compact so that it stays byte-for-byte reproducible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ExportError;
use crate::graph::{Graph, Module, Platform, Product};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyGraph {
    pub name: String,
    pub path: String,
    pub projects: BTreeMap<String, LegacyProject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProject {
    pub name: String,
    pub path: String,
    pub is_external: bool,
    pub targets: Vec<LegacyTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTarget {
    pub name: String,
    pub product: String,
    pub platforms: Vec<Platform>,
    pub dependencies: Vec<LegacyDependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegacyDependency {
    /// Module in the same project
    Target { name: String },
    /// Module in another local project
    Project { target: String, path: String },
    /// Module from a dependency manager
    External { name: String },
}

/// Product names as spelled by the legacy format.
fn legacy_product(product: Product) -> &'static str {
    match product {
        Product::App => "app",
        Product::Framework => "framework",
        Product::StaticLibrary => "staticLibrary",
        Product::DynamicLibrary => "dynamicLibrary",
        Product::Bundle => "bundle",
        Product::UnitTests => "unitTests",
        Product::UiTests => "uiTests",
        Product::CommandLineTool => "commandLineTool",
    }
}

fn legacy_dependency(owner: &Module, dependency: &Module) -> LegacyDependency {
    if dependency.is_external {
        LegacyDependency::External {
            name: dependency.name.clone(),
        }
    } else if dependency.project == owner.project {
        LegacyDependency::Target {
            name: dependency.name.clone(),
        }
    } else {
        LegacyDependency::Project {
            target: dependency.name.clone(),
            path: dependency.project.display().to_string(),
        }
    }
}

impl From<&Graph> for LegacyGraph {
    fn from(graph: &Graph) -> Self {
        let mut projects: BTreeMap<String, LegacyProject> = BTreeMap::new();
        for module in graph.modules() {
            let path = module.project.display().to_string();
            let project = projects.entry(path.clone()).or_insert_with(|| LegacyProject {
                name: module
                    .project
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string(),
                path,
                is_external: true,
                targets: Vec::new(),
            });
            project.is_external &= module.is_external;
            project.targets.push(LegacyTarget {
                name: module.name.clone(),
                product: legacy_product(module.product).to_string(),
                platforms: module.platforms.iter().copied().collect(),
                dependencies: module
                    .dependencies
                    .iter()
                    .filter_map(|dep| graph.module(dep))
                    .map(|dep| legacy_dependency(module, dep))
                    .collect(),
            });
        }

        Self {
            name: graph.name().to_string(),
            path: graph.path().display().to_string(),
            projects,
        }
    }
}

/// Encode a graph in the legacy schema (compact).
pub fn encode(graph: &Graph) -> Result<String, ExportError> {
    Ok(serde_json::to_string(&LegacyGraph::from(graph))?)
}

/// Decode a legacy document. The legacy format carries no module
/// identifiers, so it cannot be turned back into a [`Graph`].
pub fn decode(json: &str) -> Result<LegacyGraph, ExportError> {
    Ok(serde_json::from_str(json)?)
}
