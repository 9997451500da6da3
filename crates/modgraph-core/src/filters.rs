//! Filter Mappers
//!
//! Concrete [`GraphMapper`]s that narrow a graph before export:
//!
//! | Mapper | Removes |
//! |--------|---------|
//! | [`TargetNameFilter`] | everything outside the dependency closure of the named targets |
//! | [`PlatformFilter`] | modules that do not build for the selected platform |
//! | [`TestTargetFilter`] | test modules |
//! | [`ExternalDependencyFilter`] | modules sourced from a dependency manager |
//!
//! Every filter is total: an empty result is a valid graph. Edges pointing at
//! removed modules are pruned from the survivors.
//!
//! [`GraphFilters::pipeline`] composes them in the fixed order
//! target names → platform → test targets → external dependencies, so an
//! explicitly named target is resolved before categorical exclusions apply.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::environment::{MapperEnvironment, PruneReason};
use crate::graph::{Graph, Module, Platform};
use crate::mapper::{GraphMapper, MapperError, MapperPipeline};

// ============================================================================
// Filter criteria
// ============================================================================

/// Platform restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformSelection {
    /// No restriction
    #[default]
    Any,
    /// Keep only modules that build for this platform
    Only(Platform),
}

impl From<Option<Platform>> for PlatformSelection {
    fn from(platform: Option<Platform>) -> Self {
        platform.map_or(Self::Any, Self::Only)
    }
}

/// Target-name restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetSelection {
    /// No restriction
    #[default]
    All,
    /// Keep the named modules and their transitive dependencies
    Named(BTreeSet<String>),
}

impl<S: Into<String>> FromIterator<S> for TargetSelection {
    /// An empty set of names means no restriction.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let names: BTreeSet<String> = iter.into_iter().map(Into::into).collect();
        if names.is_empty() {
            Self::All
        } else {
            Self::Named(names)
        }
    }
}

/// The filter criteria of a graph export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphFilters {
    pub skip_test_targets: bool,
    pub skip_external_dependencies: bool,
    pub platform: PlatformSelection,
    pub targets: TargetSelection,
}

impl GraphFilters {
    /// Build the filter pipeline in its fixed order.
    pub fn pipeline(&self) -> MapperPipeline {
        MapperPipeline::new()
            .with(TargetNameFilter::new(self.targets.clone()))
            .with(PlatformFilter::new(self.platform))
            .with(TestTargetFilter::new(self.skip_test_targets))
            .with(ExternalDependencyFilter::new(self.skip_external_dependencies))
    }
}

/// Drop the modules rejected by `keep`, recording them in the environment.
fn prune<F>(
    mapper: &'static str,
    graph: Graph,
    mut environment: MapperEnvironment,
    reason: PruneReason,
    keep: F,
) -> Result<(Graph, MapperEnvironment), MapperError>
where
    F: FnMut(&Module) -> bool,
{
    let (filtered, dropped) = graph
        .retain(keep)
        .map_err(|e| MapperError::graph(mapper, e))?;
    if !dropped.is_empty() {
        debug!(mapper, pruned = dropped.len(), reason = %reason, "Pruned modules");
    }
    environment.record_pruned(mapper, &dropped, reason);
    Ok((filtered, environment))
}

// ============================================================================
// Target names
// ============================================================================

/// Keeps the named targets and their transitive dependency closure.
#[derive(Debug, Clone)]
pub struct TargetNameFilter {
    selection: TargetSelection,
}

impl TargetNameFilter {
    pub fn new(selection: TargetSelection) -> Self {
        Self { selection }
    }
}

impl GraphMapper for TargetNameFilter {
    fn name(&self) -> &'static str {
        "target-names"
    }

    fn map(
        &self,
        graph: Graph,
        environment: MapperEnvironment,
    ) -> Result<(Graph, MapperEnvironment), MapperError> {
        let TargetSelection::Named(names) = &self.selection else {
            return Ok((graph, environment));
        };

        let mut roots: Vec<&str> = Vec::new();
        for name in names {
            let before = roots.len();
            roots.extend(graph.modules_named(name).map(|m| m.id.as_str()));
            if roots.len() == before {
                warn!("No module named '{}' in graph '{}'", name, graph.name());
            }
        }
        let closure: BTreeSet<String> = graph
            .dependency_closure(roots)
            .into_iter()
            .map(|m| m.id.clone())
            .collect();

        prune(
            self.name(),
            graph,
            environment,
            PruneReason::OutsideTargetClosure,
            |m| closure.contains(&m.id),
        )
    }
}

// ============================================================================
// Platform
// ============================================================================

/// Keeps the modules that build for one platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformFilter {
    selection: PlatformSelection,
}

impl PlatformFilter {
    pub fn new(selection: PlatformSelection) -> Self {
        Self { selection }
    }
}

impl GraphMapper for PlatformFilter {
    fn name(&self) -> &'static str {
        "platform"
    }

    fn map(
        &self,
        graph: Graph,
        environment: MapperEnvironment,
    ) -> Result<(Graph, MapperEnvironment), MapperError> {
        let PlatformSelection::Only(platform) = self.selection else {
            return Ok((graph, environment));
        };
        prune(
            self.name(),
            graph,
            environment,
            PruneReason::PlatformMismatch { platform },
            |m| m.supports(platform),
        )
    }
}

// ============================================================================
// Test targets
// ============================================================================

/// Removes test modules when enabled.
#[derive(Debug, Clone, Copy)]
pub struct TestTargetFilter {
    enabled: bool,
}

impl TestTargetFilter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl GraphMapper for TestTargetFilter {
    fn name(&self) -> &'static str {
        "test-targets"
    }

    fn map(
        &self,
        graph: Graph,
        environment: MapperEnvironment,
    ) -> Result<(Graph, MapperEnvironment), MapperError> {
        if !self.enabled {
            return Ok((graph, environment));
        }
        prune(
            self.name(),
            graph,
            environment,
            PruneReason::TestTarget,
            |m| !m.is_test,
        )
    }
}

// ============================================================================
// External dependencies
// ============================================================================

/// Removes external modules when enabled.
#[derive(Debug, Clone, Copy)]
pub struct ExternalDependencyFilter {
    enabled: bool,
}

impl ExternalDependencyFilter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl GraphMapper for ExternalDependencyFilter {
    fn name(&self) -> &'static str {
        "external-dependencies"
    }

    fn map(
        &self,
        graph: Graph,
        environment: MapperEnvironment,
    ) -> Result<(Graph, MapperEnvironment), MapperError> {
        if !self.enabled {
            return Ok((graph, environment));
        }
        prune(
            self.name(),
            graph,
            environment,
            PruneReason::ExternalDependency,
            |m| !m.is_external,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Product;
    use std::path::Path;

    fn id(name: &str) -> String {
        Module::make_id(Path::new("/ws/App"), name)
    }

    /// App -> Core -> Utils, App -> Alamofire (external),
    /// AppTests -> App, Watch (watchos) -> Utils, Lonely
    fn sample() -> Graph {
        Graph::new(
            "graph",
            "/ws",
            [
                Module::new("/ws/App", "App", Product::App)
                    .with_platforms([Platform::Ios])
                    .with_dependency(id("Core"))
                    .with_dependency("/ws/Dependencies:Alamofire"),
                Module::new("/ws/App", "Core", Product::Framework)
                    .with_platforms([Platform::Ios, Platform::Watchos])
                    .with_dependency(id("Utils")),
                Module::new("/ws/App", "Utils", Product::StaticLibrary),
                Module::new("/ws/App", "AppTests", Product::UnitTests)
                    .with_platforms([Platform::Ios])
                    .with_dependency(id("App")),
                Module::new("/ws/App", "Watch", Product::App)
                    .with_platforms([Platform::Watchos])
                    .with_dependency(id("Utils")),
                Module::new("/ws/App", "Lonely", Product::Framework)
                    .with_platforms([Platform::Macos]),
                Module::new("/ws/Dependencies", "Alamofire", Product::Framework)
                    .with_platforms([Platform::Ios, Platform::Macos])
                    .with_external(true),
            ],
        )
        .unwrap()
    }

    fn names(graph: &Graph) -> Vec<&str> {
        graph.modules().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_default_filters_are_identity() {
        let graph = sample();
        let (filtered, env) = GraphFilters::default()
            .pipeline()
            .run(graph.clone(), MapperEnvironment::new())
            .unwrap();

        assert_eq!(names(&filtered), names(&graph));
        assert_eq!(filtered, graph);
        for module in graph.modules() {
            assert_eq!(
                filtered.module(&module.id).unwrap().dependencies,
                module.dependencies
            );
        }
        assert!(env.pruned().is_empty());
        assert_eq!(
            env.applied_mappers(),
            ["target-names", "platform", "test-targets", "external-dependencies"]
        );
    }

    #[test]
    fn test_target_selection_from_empty_iter() {
        let selection: TargetSelection = Vec::<String>::new().into_iter().collect();
        assert_eq!(selection, TargetSelection::All);
        let selection: TargetSelection = ["App"].into_iter().collect();
        assert!(matches!(selection, TargetSelection::Named(ref n) if n.len() == 1));
    }

    #[test]
    fn test_target_name_filter_keeps_closure() {
        let filter = TargetNameFilter::new(["Core"].into_iter().collect());
        let (filtered, env) = filter.map(sample(), MapperEnvironment::new()).unwrap();

        assert_eq!(names(&filtered), vec!["Core", "Utils"]);
        assert!(env.was_pruned(&id("App")));
        assert!(filtered
            .modules()
            .flat_map(|m| m.dependencies.iter())
            .all(|dep| filtered.contains(dep)));
    }

    #[test]
    fn test_target_name_filter_unknown_name_yields_empty_graph() {
        let filter = TargetNameFilter::new(["Nope"].into_iter().collect());
        let (filtered, env) = filter.map(sample(), MapperEnvironment::new()).unwrap();
        assert!(filtered.is_empty());
        assert_eq!(env.pruned().len(), 7);
    }

    #[test]
    fn test_platform_filter() {
        let filter = PlatformFilter::new(PlatformSelection::Only(Platform::Watchos));
        let (filtered, env) = filter.map(sample(), MapperEnvironment::new()).unwrap();

        // Utils declares no platforms and is kept everywhere
        assert_eq!(names(&filtered), vec!["Core", "Utils", "Watch"]);
        assert_eq!(
            env.pruned()[0].reason,
            PruneReason::PlatformMismatch {
                platform: Platform::Watchos
            }
        );
    }

    #[test]
    fn test_test_target_filter_keeps_non_test_modules() {
        let graph = Graph::new(
            "graph",
            "/ws",
            [
                Module::new("/ws/App", "App", Product::App).with_dependency(id("Helpers")),
                Module::new("/ws/App", "Helpers", Product::Framework).with_test(true),
            ],
        )
        .unwrap();

        let (filtered, _) = TestTargetFilter::new(true)
            .map(graph, MapperEnvironment::new())
            .unwrap();
        assert_eq!(names(&filtered), vec!["App"]);
        assert!(filtered.module(&id("App")).unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_test_target_filter_on_sample() {
        let graph = sample();
        let (filtered, _) = TestTargetFilter::new(true)
            .map(graph.clone(), MapperEnvironment::new())
            .unwrap();

        for module in graph.modules().filter(|m| !m.is_test) {
            assert!(filtered.contains(&module.id));
        }
        assert!(!filtered.contains(&id("AppTests")));
    }

    #[test]
    fn test_disabled_filters_pass_through() {
        let graph = sample();
        let (filtered, env) = TestTargetFilter::new(false)
            .map(graph.clone(), MapperEnvironment::new())
            .unwrap();
        assert_eq!(filtered, graph);
        assert!(env.pruned().is_empty());

        let (filtered, _) = ExternalDependencyFilter::new(false)
            .map(graph.clone(), MapperEnvironment::new())
            .unwrap();
        assert_eq!(filtered, graph);
    }

    #[test]
    fn test_external_dependency_filter() {
        let (filtered, env) = ExternalDependencyFilter::new(true)
            .map(sample(), MapperEnvironment::new())
            .unwrap();

        assert!(!filtered.contains("/ws/Dependencies:Alamofire"));
        assert_eq!(
            filtered.module(&id("App")).unwrap().dependencies,
            vec![id("Core")]
        );
        assert_eq!(env.pruned()[0].reason, PruneReason::ExternalDependency);
    }

    #[test]
    fn test_named_target_resolved_before_test_exclusion() {
        let filters = GraphFilters {
            skip_test_targets: true,
            skip_external_dependencies: true,
            platform: PlatformSelection::Only(Platform::Ios),
            targets: ["App"].into_iter().collect(),
        };
        let (filtered, env) = filters
            .pipeline()
            .run(sample(), MapperEnvironment::new())
            .unwrap();

        assert_eq!(names(&filtered), vec!["App", "Core", "Utils"]);
        assert_eq!(filtered.module(&id("App")).unwrap().dependencies, vec![id("Core")]);
        assert!(env
            .pruned()
            .iter()
            .any(|p| p.mapper == "external-dependencies"));
    }
}
