//! Terminal-facing implementations of the service seams.

use std::io;
use std::path::Path;
use std::process::Command;

use modgraph_service::{ArtifactOpener, ExportNotification, NotificationSink};

/// Prints notifications to stdout, one per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn notify(&self, notification: ExportNotification) {
        println!("{}", notification);
    }
}

/// Opens files with the desktop's default application.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl SystemOpener {
    fn program() -> &'static str {
        if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        }
    }
}

impl ArtifactOpener for SystemOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        Command::new(Self::program()).arg(path).spawn().map(|_| ())
    }
}
