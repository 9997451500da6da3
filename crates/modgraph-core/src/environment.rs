//! Mapper environment
//!
//! Metadata accumulated while a graph travels through the mapper pipeline.
//! Mappers read what earlier stages recorded and append their own entries;
//! graph validation never looks at it.

use serde::{Deserialize, Serialize};

use crate::graph::{Module, Platform};

/// Why a module was removed from the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PruneReason {
    /// Not reachable from any of the requested targets
    OutsideTargetClosure,
    /// Does not build for the requested platform
    PlatformMismatch { platform: Platform },
    /// Test module while test targets are skipped
    TestTarget,
    /// External module while external dependencies are skipped
    ExternalDependency,
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneReason::OutsideTargetClosure => write!(f, "outside target closure"),
            PruneReason::PlatformMismatch { platform } => {
                write!(f, "does not support {}", platform)
            }
            PruneReason::TestTarget => write!(f, "test target"),
            PruneReason::ExternalDependency => write!(f, "external dependency"),
        }
    }
}

/// A module removed by a mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrunedModule {
    /// Identifier of the removed module
    pub id: String,
    /// Name of the mapper that removed it
    pub mapper: String,
    #[serde(flatten)]
    pub reason: PruneReason,
}

/// Side channel threaded alongside the graph through every mapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperEnvironment {
    pruned: Vec<PrunedModule>,
    applied: Vec<String>,
}

impl MapperEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `mapper` removed `modules` for `reason`.
    pub fn record_pruned<'a>(
        &mut self,
        mapper: &str,
        modules: impl IntoIterator<Item = &'a Module>,
        reason: PruneReason,
    ) {
        self.pruned.extend(modules.into_iter().map(|m| PrunedModule {
            id: m.id.clone(),
            mapper: mapper.to_string(),
            reason: reason.clone(),
        }));
    }

    /// Record that `mapper` ran to completion.
    pub fn record_applied(&mut self, mapper: &str) {
        self.applied.push(mapper.to_string());
    }

    /// Every module pruned so far, in pruning order
    pub fn pruned(&self) -> &[PrunedModule] {
        &self.pruned
    }

    /// Names of the mappers that completed, in execution order
    pub fn applied_mappers(&self) -> &[String] {
        &self.applied
    }

    pub fn was_pruned(&self, id: &str) -> bool {
        self.pruned.iter().any(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Product;

    #[test]
    fn test_environment_records() {
        let module = Module::new("/ws/App", "AppTests", Product::UnitTests);
        let mut env = MapperEnvironment::new();
        env.record_pruned("test-targets", [&module], PruneReason::TestTarget);
        env.record_applied("test-targets");

        assert!(env.was_pruned("/ws/App:AppTests"));
        assert!(!env.was_pruned("/ws/App:App"));
        assert_eq!(env.pruned()[0].mapper, "test-targets");
        assert_eq!(env.applied_mappers(), ["test-targets".to_string()]);
    }

    #[test]
    fn test_prune_reason_serialization() {
        let json = serde_json::to_string(&PruneReason::PlatformMismatch {
            platform: Platform::Macos,
        })
        .unwrap();
        assert_eq!(json, r#"{"reason":"platform_mismatch","platform":"macos"}"#);
        assert_eq!(PruneReason::TestTarget.to_string(), "test target");
    }
}
