//! Export notifications.
//!
//! Notifications are values handed to a [`NotificationSink`] supplied by the
//! caller. They are part of the tool's observable contract and are separate
//! from `tracing` output.

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::traits::NotificationSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportNotification {
    /// A previous artifact at `path` was removed
    DeletingExistingGraph { path: PathBuf },
    /// The new artifact was written to `path`
    GraphExported { path: PathBuf },
}

impl fmt::Display for ExportNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeletingExistingGraph { path } => {
                write!(f, "Deleting existing graph at {}", path.display())
            }
            Self::GraphExported { path } => write!(f, "Graph exported to {}", path.display()),
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<ExportNotification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far, in order
    pub fn notifications(&self) -> Vec<ExportNotification> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }

    /// Display form of every notification, one per line
    pub fn output(&self) -> String {
        self.notifications()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: ExportNotification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification);
        }
    }
}
