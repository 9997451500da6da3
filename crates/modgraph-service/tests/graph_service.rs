//! Integration tests for GraphService: loading, filtering, writing and
//! notification order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use modgraph_core::export::{json, legacy};
use modgraph_core::{
    Graph, GraphFilters, GraphFormat, LayoutAlgorithm, LoadedGraph, LoaderError,
    MapperEnvironment, Module, Product, PruneReason,
};
use modgraph_service::{
    ArtifactOpener, ExportNotification, FileSystem, GraphRequest, GraphService, LocalFileSystem,
    ManifestGraphLoading, RecordingSink, ServiceError, TomlManifestGraphLoader,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Loader returning a fixed graph.
struct StubLoader {
    loaded: LoadedGraph,
}

impl StubLoader {
    fn empty() -> Self {
        Self::with_graph(Graph::empty("graph", "/"))
    }

    fn with_graph(graph: Graph) -> Self {
        Self {
            loaded: LoadedGraph {
                graph,
                side_targets: Vec::new(),
                environment: MapperEnvironment::new(),
                issues: Vec::new(),
            },
        }
    }
}

#[async_trait]
impl ManifestGraphLoading for StubLoader {
    async fn load(&self, _path: &Path) -> Result<LoadedGraph, ServiceError> {
        Ok(self.loaded.clone())
    }
}

/// Blocking file system whose writes always fail.
struct ReadOnlyFileSystem;

impl FileSystem for ReadOnlyFileSystem {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        FileSystem::exists(&LocalFileSystem, path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        FileSystem::create_dir_all(&LocalFileSystem, path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        FileSystem::read_to_string(&LocalFileSystem, path)
    }

    fn write(&self, _path: &Path, _contents: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    fn remove_file(&self, _path: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }
}

#[derive(Clone, Default)]
struct RecordingOpener {
    opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl ArtifactOpener for RecordingOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

struct FailingOpener;

impl ArtifactOpener for FailingOpener {
    fn open(&self, _path: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no opener"))
    }
}

/// Workspace with a manifest and a pre-existing artifact.
fn setup_with_existing(file_name: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp.path().join("Project.toml"), "").unwrap();
    let graph_path = temp.path().join(file_name);
    fs::write(&graph_path, "").unwrap();
    (temp, graph_path)
}

fn replaced_then_exported(path: &Path) -> Vec<ExportNotification> {
    vec![
        ExportNotification::DeletingExistingGraph {
            path: path.to_path_buf(),
        },
        ExportNotification::GraphExported {
            path: path.to_path_buf(),
        },
    ]
}

#[tokio::test]
async fn test_run_when_dot() {
    let (temp, graph_path) = setup_with_existing("graph.dot");
    let service = GraphService::new(StubLoader::empty());
    let sink = RecordingSink::new();

    let request = GraphRequest::new(temp.path())
        .with_format(GraphFormat::Dot)
        .with_layout(LayoutAlgorithm::Dot);
    service.run(&request, &sink).await.unwrap();

    assert_eq!(fs::read_to_string(&graph_path).unwrap(), "graph { }");
    assert_eq!(sink.notifications(), replaced_then_exported(&graph_path));
    assert_eq!(
        sink.output(),
        format!(
            "Deleting existing graph at {0}\nGraph exported to {0}",
            graph_path.display()
        )
    );
}

#[tokio::test]
async fn test_run_when_legacy_json() {
    let (temp, graph_path) = setup_with_existing("graph.json");
    let service = GraphService::new(StubLoader::empty());
    let sink = RecordingSink::new();

    let request = GraphRequest::new(temp.path()).with_format(GraphFormat::LegacyJson);
    service.run(&request, &sink).await.unwrap();

    let got = fs::read_to_string(&graph_path).unwrap();
    assert_eq!(got, r#"{"name":"graph","path":"/","projects":{}}"#);
    let decoded = legacy::decode(&got).unwrap();
    assert_eq!(decoded.name, "graph");
    assert!(decoded.projects.is_empty());
    assert_eq!(sink.notifications(), replaced_then_exported(&graph_path));
}

#[tokio::test]
async fn test_run_when_json() {
    let (temp, graph_path) = setup_with_existing("graph.json");
    let graph = Graph::new(
        "graph",
        "/ws",
        [
            Module::new("/ws/App", "App", Product::App).with_dependency("/ws/Kit:Kit"),
            Module::new("/ws/Kit", "Kit", Product::Framework),
        ],
    )
    .unwrap();
    let service = GraphService::new(StubLoader::with_graph(graph.clone()));
    let sink = RecordingSink::new();

    let request = GraphRequest::new(temp.path()).with_format(GraphFormat::Json);
    let report = service.run(&request, &sink).await.unwrap();

    let got = fs::read_to_string(&graph_path).unwrap();
    assert_eq!(json::decode(&got).unwrap(), graph);
    assert_eq!(report.module_count, 2);
    assert_eq!(report.edge_count, 1);
    assert!(report.replaced);
    assert_eq!(sink.notifications(), replaced_then_exported(&graph_path));
}

#[tokio::test]
async fn test_run_without_existing_artifact_only_reports_export() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out");
    let service = GraphService::new(StubLoader::empty());
    let sink = RecordingSink::new();

    let request = GraphRequest::new(temp.path()).with_output_path(&output);
    let report = service.run(&request, &sink).await.unwrap();

    let graph_path = output.join("graph.dot");
    assert!(graph_path.is_file());
    assert!(!report.replaced);
    assert_eq!(
        sink.notifications(),
        vec![ExportNotification::GraphExported { path: graph_path }]
    );
}

#[tokio::test]
async fn test_filters_end_to_end() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("App")).unwrap();
    fs::write(
        temp.path().join("App/Project.toml"),
        r#"
[[modules]]
name = "A"
product = "app"
platforms = ["ios"]
dependencies = [{ external = "Lib" }]

[[modules]]
name = "B"
product = "unit-tests"
platforms = ["ios"]
dependencies = ["A"]
"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("Dependencies.toml"),
        "[[packages]]\nname = \"Lib\"\nplatforms = [\"ios\"]\n",
    )
    .unwrap();

    let service = GraphService::new(TomlManifestGraphLoader::new());
    let sink = RecordingSink::new();
    let request = GraphRequest::new(temp.path())
        .with_format(GraphFormat::Json)
        .with_filters(GraphFilters {
            skip_test_targets: true,
            skip_external_dependencies: true,
            ..Default::default()
        });

    let report = service.run(&request, &sink).await.unwrap();

    let graph = json::decode(&fs::read_to_string(&report.path).unwrap()).unwrap();
    let names: Vec<&str> = graph.modules().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["A"]);
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(report.environment.pruned().len(), 2);
    assert_eq!(
        report.environment.applied_mappers(),
        ["target-names", "platform", "test-targets", "external-dependencies"]
    );
}

#[tokio::test]
async fn test_dependency_that_is_external_and_test_is_dropped_once() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("App")).unwrap();
    fs::write(
        temp.path().join("App/Project.toml"),
        r#"
[[modules]]
name = "A"
product = "app"
platforms = ["ios"]
dependencies = [{ external = "B" }]
"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("Dependencies.toml"),
        "[[packages]]\nname = \"B\"\nproduct = \"unit-tests\"\nplatforms = [\"ios\"]\n",
    )
    .unwrap();

    let service = GraphService::new(TomlManifestGraphLoader::new());
    let sink = RecordingSink::new();
    let request = GraphRequest::new(temp.path())
        .with_format(GraphFormat::Json)
        .with_filters(GraphFilters {
            skip_test_targets: true,
            skip_external_dependencies: true,
            ..Default::default()
        });

    let report = service.run(&request, &sink).await.unwrap();

    let graph = json::decode(&fs::read_to_string(&report.path).unwrap()).unwrap();
    let names: Vec<&str> = graph.modules().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["A"]);
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(report.edge_count, 0);

    // Test exclusion runs first, so it claims B.
    let pruned = report.environment.pruned();
    assert_eq!(pruned.len(), 1);
    assert!(pruned[0].id.ends_with(":B"));
    assert_eq!(pruned[0].mapper, "test-targets");
    assert_eq!(pruned[0].reason, PruneReason::TestTarget);
}

#[tokio::test]
async fn test_missing_manifest_fails_without_side_effects() {
    let temp = TempDir::new().unwrap();
    let service = GraphService::new(TomlManifestGraphLoader::new());
    let sink = RecordingSink::new();

    let err = service
        .run(&GraphRequest::new(temp.path()), &sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::ManifestLoad(LoaderError::NoManifest(_))
    ));
    assert!(!temp.path().join("graph.dot").exists());
    assert!(sink.notifications().is_empty());
}

#[tokio::test]
async fn test_write_failure_emits_no_notifications() {
    let (temp, graph_path) = setup_with_existing("graph.dot");
    fs::write(&graph_path, "previous").unwrap();
    let service =
        GraphService::new(StubLoader::empty()).with_blocking_file_system(ReadOnlyFileSystem);
    let sink = RecordingSink::new();

    let err = service
        .run(&GraphRequest::new(temp.path()), &sink)
        .await
        .unwrap_err();

    match err {
        ServiceError::ExportIo { path, .. } => assert_eq!(path, graph_path),
        other => panic!("unexpected error: {other}"),
    }
    assert!(sink.notifications().is_empty());
    assert_eq!(fs::read_to_string(&graph_path).unwrap(), "previous");
}

#[tokio::test]
async fn test_unknown_side_target_is_invalid_graph() {
    let temp = TempDir::new().unwrap();
    let mut loader = StubLoader::empty();
    loader.loaded.side_targets.push("/ws/Dependencies:Ghost".to_string());
    let service = GraphService::new(loader);
    let sink = RecordingSink::new();

    let err = service
        .run(&GraphRequest::new(temp.path()), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidGraph(_)));
    assert!(!temp.path().join("graph.dot").exists());
}

#[tokio::test]
async fn test_open_delegates_to_opener() {
    let temp = TempDir::new().unwrap();
    let opener = RecordingOpener::default();
    let service = GraphService::new(StubLoader::empty()).with_opener(opener.clone());

    let request = GraphRequest::new(temp.path()).with_open(true);
    service.run(&request, &RecordingSink::new()).await.unwrap();

    assert_eq!(
        *opener.opened.lock().unwrap(),
        vec![temp.path().join("graph.dot")]
    );
}

#[tokio::test]
async fn test_open_failure_is_reported_after_export() {
    let temp = TempDir::new().unwrap();
    let service = GraphService::new(StubLoader::empty()).with_opener(FailingOpener);
    let sink = RecordingSink::new();

    let request = GraphRequest::new(temp.path()).with_open(true);
    let err = service.run(&request, &sink).await.unwrap_err();

    assert!(matches!(err, ServiceError::Open { .. }));
    assert!(temp.path().join("graph.dot").is_file());
    assert_eq!(sink.notifications().len(), 1);
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let temp = TempDir::new().unwrap();
    let service = GraphService::new(StubLoader::empty());
    let (dot_sink, json_sink) = (RecordingSink::new(), RecordingSink::new());

    let dot = GraphRequest::new(temp.path()).with_output_path(temp.path().join("dot"));
    let json = GraphRequest::new(temp.path())
        .with_format(GraphFormat::Json)
        .with_output_path(temp.path().join("json"));

    let (a, b) = tokio::join!(service.run(&dot, &dot_sink), service.run(&json, &json_sink));
    a.unwrap();
    b.unwrap();

    assert_eq!(dot_sink.notifications().len(), 1);
    assert_eq!(json_sink.notifications().len(), 1);
    assert!(temp.path().join("dot/graph.dot").is_file());
    assert!(temp.path().join("json/graph.json").is_file());
}
