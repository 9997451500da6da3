//! Graph generation service.
//!
//! Runs one invocation of the load → filter → export chain:
//!
//! 1. Load the initial graph from the source path
//! 2. Run the filter pipeline (target names, platform, test targets,
//!    external dependencies)
//! 3. Encode the final graph in the requested format
//! 4. Write `graph.<ext>` into the output directory, then notify
//!
//! Each step short-circuits on failure. Nothing is written and nothing is
//! notified unless every earlier step succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use modgraph_core::{
    GraphEncoder, GraphError, GraphFilters, GraphFormat, LayoutAlgorithm, LoadIssue,
    MapperEnvironment,
};
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::fs::{BlockingFileSystem, LocalFileSystem};
use crate::loader::TomlManifestGraphLoader;
use crate::notification::ExportNotification;
use crate::traits::{
    ArtifactOpener, AsyncFileSystem, FileSystem, ManifestGraphLoading, NotificationSink,
};
use crate::writer::write_artifact;

/// Parameters of one graph generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRequest {
    pub format: GraphFormat,
    pub layout: LayoutAlgorithm,
    pub filters: GraphFilters,
    /// Open the artifact after writing it
    pub open: bool,
    /// Directory the manifests are loaded from
    pub path: PathBuf,
    /// Directory `graph.<ext>` is written to
    pub output_path: PathBuf,
}

impl GraphRequest {
    /// Request with default options that writes next to the manifests.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            format: GraphFormat::default(),
            layout: LayoutAlgorithm::default(),
            filters: GraphFilters::default(),
            open: false,
            output_path: path.clone(),
            path,
        }
    }

    pub fn with_format(mut self, format: GraphFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_layout(mut self, layout: LayoutAlgorithm) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_filters(mut self, filters: GraphFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Full path of the artifact
    pub fn destination(&self) -> PathBuf {
        self.output_path.join(self.format.file_name())
    }
}

/// Summary of a successful generation.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub format: GraphFormat,
    pub module_count: usize,
    pub edge_count: usize,
    /// A previous artifact was replaced
    pub replaced: bool,
    pub environment: MapperEnvironment,
    pub issues: Vec<LoadIssue>,
}

/// Generates dependency graph artifacts.
///
/// The service holds no per-invocation state, so one instance can serve
/// concurrent [`GraphService::run`] calls.
pub struct GraphService {
    loader: Arc<dyn ManifestGraphLoading>,
    fs: Arc<dyn AsyncFileSystem>,
    encoder: GraphEncoder,
    opener: Option<Arc<dyn ArtifactOpener>>,
}

impl Default for GraphService {
    fn default() -> Self {
        Self::new(TomlManifestGraphLoader::new())
    }
}

impl GraphService {
    /// Service writing to the local disk, with no opener.
    pub fn new(loader: impl ManifestGraphLoading + 'static) -> Self {
        Self {
            loader: Arc::new(loader),
            fs: Arc::new(LocalFileSystem),
            encoder: GraphEncoder::new(),
            opener: None,
        }
    }

    pub fn with_file_system(mut self, fs: impl AsyncFileSystem + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    /// Use a blocking file system implementation.
    pub fn with_blocking_file_system(self, fs: impl FileSystem + 'static) -> Self {
        self.with_file_system(BlockingFileSystem::new(fs))
    }

    pub fn with_encoder(mut self, encoder: GraphEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_opener(mut self, opener: impl ArtifactOpener + 'static) -> Self {
        self.opener = Some(Arc::new(opener));
        self
    }

    /// Generate the graph described by `request`.
    pub async fn run(
        &self,
        request: &GraphRequest,
        sink: &dyn NotificationSink,
    ) -> Result<ExportReport, ServiceError> {
        info!("Loading graph at {:?}", request.path);
        let loaded = self.loader.load(&request.path).await?;

        for id in &loaded.side_targets {
            if !loaded.graph.contains(id) {
                return Err(GraphError::UnknownModule(id.clone()).into());
            }
        }
        for issue in &loaded.issues {
            warn!("{}", issue);
        }
        debug!(
            modules = loaded.graph.len(),
            edges = loaded.graph.edge_count(),
            side_targets = loaded.side_targets.len(),
            "Loaded graph"
        );

        let pipeline = request.filters.pipeline();
        let (graph, environment) = pipeline.run(loaded.graph, loaded.environment)?;
        info!(
            "Filtered graph: {} module(s), {} pruned",
            graph.len(),
            environment.pruned().len()
        );

        let contents = self.encoder.encode(&graph, request.format, request.layout)?;
        let outcome =
            write_artifact(self.fs.as_ref(), &request.destination(), &contents).await?;

        if outcome.replaced {
            sink.notify(ExportNotification::DeletingExistingGraph {
                path: outcome.path.clone(),
            });
        }
        sink.notify(ExportNotification::GraphExported {
            path: outcome.path.clone(),
        });

        if request.open {
            self.open(&outcome.path)?;
        }

        Ok(ExportReport {
            path: outcome.path,
            format: request.format,
            module_count: graph.len(),
            edge_count: graph.edge_count(),
            replaced: outcome.replaced,
            environment,
            issues: loaded.issues,
        })
    }

    fn open(&self, path: &Path) -> Result<(), ServiceError> {
        match &self.opener {
            Some(opener) => {
                debug!("Opening {:?}", path);
                opener.open(path).map_err(|e| ServiceError::open(path, e))
            }
            None => {
                warn!("No opener configured, not opening {:?}", path);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for GraphService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphService")
            .field("encoder", &self.encoder)
            .field("has_opener", &self.opener.is_some())
            .finish_non_exhaustive()
    }
}
