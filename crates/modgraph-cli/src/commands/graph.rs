//! Graph command - Generate and export the module dependency graph
//!
//! Loads every `Project.toml` under the workspace, applies the requested
//! filters and writes `graph.<ext>` to the output directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use modgraph_config::ConfigOverrides;
use modgraph_core::{GraphFilters, GraphFormat, LayoutAlgorithm, Platform};
use modgraph_service::{GraphRequest, GraphService, TomlManifestGraphLoader};
use tracing::{debug, info};

use super::{absolutize, load_config, print_info, resolve_path};
use crate::output::{StdoutSink, SystemOpener};
use crate::GlobalOptions;

/// Arguments for the graph command
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Workspace directory containing the manifests (defaults to the current directory)
    #[arg(long, short = 'p')]
    pub path: Option<PathBuf>,

    /// Output format (dot, json, legacy-json)
    #[arg(long, short = 'f', value_parser = parse_format)]
    pub format: Option<GraphFormat>,

    /// Layout algorithm written into DOT output
    #[arg(long, short = 'a', value_parser = parse_layout)]
    pub algorithm: Option<LayoutAlgorithm>,

    /// Drop test targets from the graph
    #[arg(long, short = 't')]
    pub skip_test_targets: bool,

    /// Drop external dependencies from the graph
    #[arg(long, short = 'd')]
    pub skip_external_dependencies: bool,

    /// Open the exported graph when done
    #[arg(long)]
    pub open: bool,

    /// Keep only targets supporting this platform
    #[arg(long, value_parser = parse_platform)]
    pub platform: Option<Platform>,

    /// Directory the graph is written to (defaults to the workspace)
    #[arg(long, short = 'o')]
    pub output_path: Option<PathBuf>,

    /// Keep only these targets and their dependencies
    pub targets: Vec<String>,
}

fn parse_format(s: &str) -> Result<GraphFormat, String> {
    s.parse().map_err(|e: modgraph_core::ExportError| e.to_string())
}

fn parse_layout(s: &str) -> Result<LayoutAlgorithm, String> {
    s.parse().map_err(|e: modgraph_core::ExportError| e.to_string())
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    s.parse().map_err(|e: modgraph_core::GraphError| e.to_string())
}

impl GraphArgs {
    /// Convert explicit flags to config overrides. Unset flags keep the
    /// configured value.
    fn to_config_overrides(&self, global: &GlobalOptions) -> Result<ConfigOverrides> {
        Ok(ConfigOverrides {
            format: self.format,
            layout: self.algorithm,
            skip_test_targets: self.skip_test_targets.then_some(true),
            skip_external_dependencies: self.skip_external_dependencies.then_some(true),
            platform: self.platform,
            output_dir: self.output_path.as_deref().map(absolutize).transpose()?,
            log_level: global.log_level(),
        })
    }
}

/// Execute the graph command
pub async fn execute(args: GraphArgs, global: GlobalOptions) -> Result<()> {
    let workspace = resolve_path(args.path.as_deref())?;
    let overrides = args.to_config_overrides(&global)?;
    let config = load_config(&global, &workspace, Some(&overrides))?;
    debug!("Effective graph config: {:?}", config.graph);

    let request = GraphRequest::new(&workspace)
        .with_format(config.graph.format)
        .with_layout(config.graph.layout)
        .with_filters(GraphFilters {
            skip_test_targets: config.graph.skip_test_targets,
            skip_external_dependencies: config.graph.skip_external_dependencies,
            platform: config.graph.platform.into(),
            targets: args.targets.iter().cloned().collect(),
        })
        .with_output_path(config.output_dir(&workspace))
        .with_open(args.open);

    let service = GraphService::new(TomlManifestGraphLoader::new()).with_opener(SystemOpener);
    let report = service
        .run(&request, &StdoutSink)
        .await
        .with_context(|| format!("Failed to generate graph for {}", workspace.display()))?;

    info!(
        "Exported {} module(s) and {} dependency edge(s) as {}",
        report.module_count, report.edge_count, report.format
    );
    if !report.issues.is_empty() {
        print_info(
            &format!("{} manifest issue(s) reported", report.issues.len()),
            global.quiet,
        );
    }

    Ok(())
}
