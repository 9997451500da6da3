//! Modgraph Service - Graph generation on top of modgraph-core
//!
//! This crate wires the core pieces into the end-to-end operation:
//! - [`GraphService`]: load → filter → encode → write → notify
//! - [`ManifestGraphLoading`]: where the initial graph comes from
//! - [`FileSystem`] / [`AsyncFileSystem`]: blocking and awaitable disk access
//! - [`NotificationSink`]: receives [`ExportNotification`]s
//! - [`ArtifactOpener`]: opens the artifact when requested
//!
//! ## Example
//!
//! ```ignore
//! use modgraph_service::{GraphRequest, GraphService, RecordingSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = GraphService::default();
//!     let sink = RecordingSink::new();
//!     let report = service.run(&GraphRequest::new("/path/to/workspace"), &sink).await?;
//!     println!("{}", sink.output());
//!     Ok(())
//! }
//! ```

mod error;
mod fs;
mod loader;
mod notification;
mod service;
mod traits;
mod writer;

pub use error::ServiceError;
pub use fs::{BlockingFileSystem, LocalFileSystem};
pub use loader::TomlManifestGraphLoader;
pub use notification::{ExportNotification, RecordingSink};
pub use service::{ExportReport, GraphRequest, GraphService};
pub use traits::{ArtifactOpener, AsyncFileSystem, FileSystem, ManifestGraphLoading, NotificationSink};
pub use writer::{temp_path, write_artifact, WriteOutcome};

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
