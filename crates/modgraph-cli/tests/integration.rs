//! Integration tests for the modgraph CLI
//!
//! These tests run the binary against small manifest workspaces created in
//! temporary directories. `HOME` points into the temporary directory so the
//! user's global configuration never leaks in.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[allow(deprecated)]
fn modgraph(workspace: &Path) -> Command {
    let mut cmd = Command::cargo_bin("modgraph").expect("Failed to find modgraph binary");
    cmd.current_dir(workspace)
        .env("HOME", workspace.join("home"))
        .env_remove("MODGRAPH_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// App (ios) depends on an external package; AppTests depends on App.
fn setup_workspace() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    write(
        temp.path(),
        "App/Project.toml",
        r#"
name = "App"

[[modules]]
name = "App"
product = "app"
platforms = ["ios"]
dependencies = [{ external = "Lib" }]

[[modules]]
name = "AppTests"
product = "unit-tests"
platforms = ["ios"]
dependencies = ["App"]
"#,
    );
    write(
        temp.path(),
        "Tool/Project.toml",
        r#"
[[modules]]
name = "Tool"
product = "command-line-tool"
platforms = ["macos"]
"#,
    );
    write(
        temp.path(),
        "Dependencies.toml",
        "[[packages]]\nname = \"Lib\"\nplatforms = [\"ios\"]\n",
    );
    temp
}

fn module_names(json: &str) -> Vec<String> {
    let value: serde_json::Value = serde_json::from_str(json).unwrap();
    let mut names: Vec<String> = value["projects"]
        .as_object()
        .unwrap()
        .values()
        .flat_map(|p| p["modules"].as_array().unwrap().clone())
        .map(|m| m["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Graph Command
// ============================================================================

#[test]
fn test_graph_writes_dot_by_default() {
    let workspace = setup_workspace();
    let graph_path = workspace.path().canonicalize().unwrap().join("graph.dot");

    modgraph(workspace.path())
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Graph exported to {}",
            graph_path.display()
        )))
        .stdout(predicate::str::contains("Deleting existing graph").not());

    let dot = fs::read_to_string(&graph_path).unwrap();
    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("layout=dot"));
    assert!(dot.contains("label=\"AppTests\""));
}

#[test]
fn test_graph_replaces_existing_artifact() {
    let workspace = setup_workspace();
    let graph_path = workspace.path().canonicalize().unwrap().join("graph.dot");
    fs::write(&graph_path, "stale").unwrap();

    modgraph(workspace.path())
        .args(["graph", "--algorithm", "circo"])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "Deleting existing graph at {0}\nGraph exported to {0}\n",
            graph_path.display()
        )));

    assert!(fs::read_to_string(&graph_path)
        .unwrap()
        .contains("layout=circo"));
}

#[test]
fn test_graph_json_with_filters() {
    let workspace = setup_workspace();

    modgraph(workspace.path())
        .args([
            "graph",
            "--format",
            "json",
            "--skip-test-targets",
            "--skip-external-dependencies",
        ])
        .assert()
        .success();

    let json = fs::read_to_string(workspace.path().join("graph.json")).unwrap();
    assert_eq!(module_names(&json), vec!["App", "Tool"]);
    assert!(!json.contains("\"dependencies\": [\n"));
}

#[test]
fn test_graph_platform_and_targets() {
    let workspace = setup_workspace();

    modgraph(workspace.path())
        .args(["graph", "--format", "json", "--platform", "ios", "App"])
        .assert()
        .success();

    let json = fs::read_to_string(workspace.path().join("graph.json")).unwrap();
    assert_eq!(module_names(&json), vec!["App", "Lib"]);
}

#[test]
fn test_graph_legacy_json_to_output_path() {
    let workspace = setup_workspace();

    modgraph(workspace.path())
        .args(["graph", "--format", "legacy-json", "--output-path", "out"])
        .assert()
        .success();

    let json = fs::read_to_string(workspace.path().join("out/graph.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["projects"].as_object().unwrap().len() == 3);
    assert!(!json.contains('\n'));
}

#[test]
fn test_graph_with_explicit_path() {
    let workspace = setup_workspace();
    let elsewhere = TempDir::new().unwrap();

    modgraph(elsewhere.path())
        .args(["graph", "--path"])
        .arg(workspace.path())
        .assert()
        .success();

    assert!(workspace.path().join("graph.dot").is_file());
    assert!(!elsewhere.path().join("graph.dot").exists());
}

#[test]
fn test_graph_without_manifest_fails() {
    let empty = TempDir::new().unwrap();

    modgraph(empty.path())
        .arg("graph")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no Project.toml found"));

    assert!(!empty.path().join("graph.dot").exists());
}

#[test]
fn test_graph_reports_unresolved_dependency() {
    let workspace = TempDir::new().unwrap();
    write(
        workspace.path(),
        "App/Project.toml",
        "[[modules]]\nname = \"App\"\nproduct = \"app\"\nplatforms = [\"ios\"]\ndependencies = [\"Ghost\"]\n",
    );

    modgraph(workspace.path())
        .arg("graph")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ghost"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_local_config_sets_defaults() {
    let workspace = setup_workspace();
    write(
        workspace.path(),
        ".modgraph/config.toml",
        "[graph]\nformat = \"json\"\nskip_test_targets = true\n",
    );

    modgraph(workspace.path()).arg("graph").assert().success();

    let json = fs::read_to_string(workspace.path().join("graph.json")).unwrap();
    assert_eq!(module_names(&json), vec!["App", "Lib", "Tool"]);
    assert!(!workspace.path().join("graph.dot").exists());
}

#[test]
fn test_flag_overrides_config() {
    let workspace = setup_workspace();
    write(
        workspace.path(),
        ".modgraph/config.toml",
        "[graph]\nformat = \"json\"\n",
    );

    modgraph(workspace.path())
        .args(["graph", "--format", "dot"])
        .assert()
        .success();

    assert!(workspace.path().join("graph.dot").is_file());
}

#[test]
fn test_explicit_config_file() {
    let workspace = setup_workspace();
    write(
        workspace.path(),
        "custom.toml",
        "[graph]\nformat = \"legacy-json\"\n",
    );

    modgraph(workspace.path())
        .args(["--config", "custom.toml", "graph"])
        .assert()
        .success();

    let json = fs::read_to_string(workspace.path().join("graph.json")).unwrap();
    assert!(json.starts_with("{\"name\":"));
}

#[test]
fn test_invalid_config_fails() {
    let workspace = setup_workspace();
    write(
        workspace.path(),
        ".modgraph/config.toml",
        "[graph]\nformat = \"svg\"\n",
    );

    modgraph(workspace.path())
        .arg("graph")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_and_show() {
    let workspace = TempDir::new().unwrap();

    modgraph(workspace.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".modgraph"));

    assert!(workspace.path().join(".modgraph/config.toml").is_file());

    modgraph(workspace.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[graph]"))
        .stdout(predicate::str::contains("format = \"dot\""))
        .stdout(predicate::str::contains("[logging]"));
}

#[test]
fn test_config_path() {
    let workspace = TempDir::new().unwrap();

    modgraph(workspace.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("global:"))
        .stdout(predicate::str::contains("local:"))
        .stdout(predicate::str::contains("missing"));
}
