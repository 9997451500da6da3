//! Manifest Graph Loader
//!
//! Discovers `Project.toml` manifests under a workspace root, plus an
//! optional `Dependencies.toml` at the root, and builds the initial module
//! graph from them.
//!
//! ## Manifest Files
//!
//! | Filename | Location | Declares |
//! |----------|----------|----------|
//! | Project.toml | any directory | local modules of one project |
//! | Dependencies.toml | workspace root | external packages |
//!
//! ```toml
//! # Project.toml
//! name = "App"
//!
//! [[modules]]
//! name = "App"
//! product = "app"
//! platforms = ["ios"]
//! dependencies = ["Core", { project = "../Kit", module = "Kit" }, { external = "Alamofire" }]
//! ```
//!
//! ```toml
//! # Dependencies.toml
//! [[packages]]
//! name = "Alamofire"
//! platforms = ["ios", "macos"]
//! ```
//!
//! External packages are owned by the synthetic project `<root>/Dependencies`.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::environment::MapperEnvironment;
use crate::graph::{Graph, GraphError, Module, Platform, Product};

/// Project manifest file name
pub const PROJECT_MANIFEST: &str = "Project.toml";

/// External dependency manifest file name
pub const DEPENDENCIES_MANIFEST: &str = "Dependencies.toml";

/// Directory (relative to the root) that owns external packages
const EXTERNALS_DIR: &str = "Dependencies";

/// Directories never searched for manifests
const EXCLUDED_DIRS: &[&str] = &[".build", "build", "node_modules", "target", "DerivedData"];

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while loading manifests.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No project manifest under the root
    #[error("no Project.toml found under '{0}'")]
    NoManifest(PathBuf),

    /// Failed to walk the workspace
    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Failed to read a manifest
    #[error("failed to read manifest '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a manifest
    #[error("failed to parse manifest '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A dependency reference does not name a declared module
    #[error("module '{module}' depends on '{reference}', which is not declared")]
    UnresolvedDependency { module: String, reference: String },

    /// Two manifests declare the same module
    #[error("module '{0}' is declared more than once")]
    DuplicateModule(String),

    /// The loaded modules do not form a valid graph
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl LoaderError {
    fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Manifest schema
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectManifest {
    name: Option<String>,
    #[serde(default)]
    modules: Vec<ModuleManifest>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleManifest {
    name: String,
    product: Product,
    #[serde(default)]
    platforms: Vec<Platform>,
    test: Option<bool>,
    #[serde(default)]
    dependencies: Vec<DependencyReference>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DependencyReference {
    /// Module of the same project
    Local(String),
    /// Module of another project, relative to this one
    Project { project: String, module: String },
    /// External package
    External { external: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DependenciesManifest {
    #[serde(default)]
    packages: Vec<PackageManifest>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageManifest {
    name: String,
    #[serde(default = "default_package_product")]
    product: Product,
    #[serde(default)]
    platforms: Vec<Platform>,
    #[serde(default)]
    dependencies: Vec<String>,
}

fn default_package_product() -> Product {
    Product::Framework
}

// ============================================================================
// Load result
// ============================================================================

/// A non-fatal problem found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadIssue {
    /// Manifest the issue was found in
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Everything the loader produces for one workspace.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: Graph,
    /// Identifiers of modules synthesised by the loader (external packages)
    pub side_targets: Vec<String>,
    pub environment: MapperEnvironment,
    pub issues: Vec<LoadIssue>,
}

/// A module whose dependency references are not resolved yet.
struct PendingModule {
    module: Module,
    manifest: PathBuf,
    references: Vec<DependencyReference>,
}

// ============================================================================
// Loader
// ============================================================================

/// Loads a module graph from TOML manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl ManifestLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every manifest under `root`.
    pub fn load(&self, root: &Path) -> Result<LoadedGraph, LoaderError> {
        let root = normalize(root);
        let manifests = self.discover(&root)?;
        if manifests.is_empty() {
            return Err(LoaderError::NoManifest(root));
        }
        info!("Loading {} project manifest(s) under {:?}", manifests.len(), root);

        let mut pending = Vec::new();
        let mut issues = Vec::new();

        for manifest_path in &manifests {
            let manifest: ProjectManifest = read_manifest(manifest_path)?;
            let project = normalize(manifest_path.parent().unwrap_or(&root));
            debug!(
                "Parsed {:?} ({}): {} module(s)",
                manifest_path,
                manifest.name.as_deref().unwrap_or("unnamed"),
                manifest.modules.len()
            );

            for declared in manifest.modules {
                if declared.platforms.is_empty() {
                    issues.push(LoadIssue {
                        path: manifest_path.clone(),
                        message: format!("module '{}' declares no platforms", declared.name),
                    });
                }
                let mut module = Module::new(&project, &declared.name, declared.product)
                    .with_platforms(declared.platforms);
                if let Some(is_test) = declared.test {
                    module.is_test = is_test;
                }
                pending.push(PendingModule {
                    module,
                    manifest: manifest_path.clone(),
                    references: declared.dependencies,
                });
            }
        }

        let side_targets = self.load_externals(&root, &mut pending)?;
        let modules = resolve(&root, pending, &mut issues)?;

        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("graph")
            .to_string();
        let graph = Graph::new(name, &root, modules)?;

        Ok(LoadedGraph {
            graph,
            side_targets,
            environment: MapperEnvironment::new(),
            issues,
        })
    }

    /// Find project manifests, sorted by path.
    fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, LoaderError> {
        let walker = WalkDir::new(root).sort_by_file_name();

        let mut manifests = Vec::new();
        for entry in walker.into_iter().filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !EXCLUDED_DIRS.contains(&&*name)
        }) {
            let entry = entry.map_err(|source| LoaderError::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && entry.file_name() == PROJECT_MANIFEST {
                manifests.push(entry.into_path());
            }
        }
        Ok(manifests)
    }

    /// Add external packages from `Dependencies.toml`, returning their ids.
    fn load_externals(
        &self,
        root: &Path,
        pending: &mut Vec<PendingModule>,
    ) -> Result<Vec<String>, LoaderError> {
        let path = root.join(DEPENDENCIES_MANIFEST);
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let manifest: DependenciesManifest = read_manifest(&path)?;
        let owner = normalize(&root.join(EXTERNALS_DIR));
        let mut ids = Vec::new();
        for package in manifest.packages {
            let module = Module::new(&owner, &package.name, package.product)
                .with_platforms(package.platforms)
                .with_external(true);
            ids.push(module.id.clone());
            pending.push(PendingModule {
                module,
                manifest: path.clone(),
                references: package
                    .dependencies
                    .into_iter()
                    .map(DependencyReference::Local)
                    .collect(),
            });
        }
        debug!("Loaded {} external package(s)", ids.len());
        Ok(ids)
    }
}

fn read_manifest<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoaderError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoaderError::read_file(path, e))?;
    toml::from_str(&content).map_err(|e| LoaderError::parse(path, e))
}

/// Turn dependency references into module identifiers.
fn resolve(
    root: &Path,
    pending: Vec<PendingModule>,
    issues: &mut Vec<LoadIssue>,
) -> Result<Vec<Module>, LoaderError> {
    let mut declared = HashSet::new();
    for entry in &pending {
        if !declared.insert(entry.module.id.clone()) {
            return Err(LoaderError::DuplicateModule(entry.module.id.clone()));
        }
    }

    let externals = normalize(&root.join(EXTERNALS_DIR));
    pending
        .into_iter()
        .map(|entry| {
            let mut module = entry.module;
            for reference in entry.references {
                let (id, shown) = match &reference {
                    DependencyReference::Local(name) => {
                        (Module::make_id(&module.project, name), name.clone())
                    }
                    DependencyReference::Project { project, module: name } => {
                        let other = normalize(&module.project.join(project));
                        (Module::make_id(&other, name), format!("{}:{}", project, name))
                    }
                    DependencyReference::External { external } => {
                        (Module::make_id(&externals, external), external.clone())
                    }
                };
                if !declared.contains(&id) {
                    return Err(LoaderError::UnresolvedDependency {
                        module: module.id.clone(),
                        reference: shown,
                    });
                }
                if module.dependencies.contains(&id) {
                    issues.push(LoadIssue {
                        path: entry.manifest.clone(),
                        message: format!(
                            "module '{}' lists dependency '{}' more than once",
                            module.name, shown
                        ),
                    });
                    continue;
                }
                module.dependencies.push(id);
            }
            Ok(module)
        })
        .collect()
}

/// Lexically resolve `.` and `..` components.
///
/// Leading `..` segments of a relative path are kept; `..` above the root
/// of an absolute path is dropped.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}
