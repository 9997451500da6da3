//! Current JSON schema
//!
//! ```json
//! {
//!   "name": "graph",
//!   "path": "/ws",
//!   "projects": {
//!     "/ws/App": {
//!       "name": "App",
//!       "path": "/ws/App",
//!       "modules": [
//!         {
//!           "id": "/ws/App:App",
//!           "name": "App",
//!           "product": "app",
//!           "platforms": ["ios"],
//!           "isTest": false,
//!           "isExternal": false,
//!           "dependencies": ["/ws/App:Core"]
//!         }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Field names and nesting are a versioned contract for automation; projects
//! are keyed by path and sorted, modules keep graph order within a project.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ExportError;
use crate::graph::{Graph, Module, Platform, Product};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub name: String,
    pub path: String,
    pub projects: BTreeMap<String, ProjectDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub name: String,
    pub path: String,
    pub modules: Vec<ModuleDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDocument {
    pub id: String,
    pub name: String,
    pub product: Product,
    pub platforms: BTreeSet<Platform>,
    pub is_test: bool,
    pub is_external: bool,
    pub dependencies: Vec<String>,
}

impl From<&Graph> for GraphDocument {
    fn from(graph: &Graph) -> Self {
        let mut projects: BTreeMap<String, ProjectDocument> = BTreeMap::new();
        for module in graph.modules() {
            let path = module.project.display().to_string();
            projects
                .entry(path.clone())
                .or_insert_with(|| ProjectDocument {
                    name: module
                        .project
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or_default()
                        .to_string(),
                    path,
                    modules: Vec::new(),
                })
                .modules
                .push(ModuleDocument::from(module));
        }

        Self {
            name: graph.name().to_string(),
            path: graph.path().display().to_string(),
            projects,
        }
    }
}

impl From<&Module> for ModuleDocument {
    fn from(module: &Module) -> Self {
        Self {
            id: module.id.clone(),
            name: module.name.clone(),
            product: module.product,
            platforms: module.platforms.clone(),
            is_test: module.is_test,
            is_external: module.is_external,
            dependencies: module.dependencies.clone(),
        }
    }
}

impl TryFrom<GraphDocument> for Graph {
    type Error = ExportError;

    fn try_from(document: GraphDocument) -> Result<Self, Self::Error> {
        let modules = document.projects.into_values().flat_map(|project| {
            let owner = PathBuf::from(project.path);
            project.modules.into_iter().map(move |m| Module {
                id: m.id,
                name: m.name,
                project: owner.clone(),
                product: m.product,
                platforms: m.platforms,
                is_test: m.is_test,
                is_external: m.is_external,
                dependencies: m.dependencies,
            })
        });
        Ok(Graph::new(document.name, document.path, modules)?)
    }
}

/// Encode a graph in the current schema (pretty-printed).
pub fn encode(graph: &Graph) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&GraphDocument::from(graph))?)
}

/// Decode a document in the current schema back into a validated graph.
pub fn decode(json: &str) -> Result<Graph, ExportError> {
    let document: GraphDocument = serde_json::from_str(json)?;
    Graph::try_from(document)
}
