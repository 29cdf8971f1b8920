// src/resolver/plan.rs

//! Installation plan data structures
//!
//! The result of planning: a topological order for reporting and the leveled
//! groups the orchestrator executes.

use super::graph::{DependencyGraph, ParallelInstallationGroup};
use super::conflict::ConflictInfo;

/// A complete, validated installation plan
#[derive(Debug)]
pub struct InstallPlan {
    /// Topological order, alphabetical within a level (reporting only)
    pub order: Vec<String>,
    /// Execution groups in strictly increasing level order
    pub groups: Vec<ParallelInstallationGroup>,
    /// Warning-level conflicts carried into the batch result
    pub warnings: Vec<ConflictInfo>,
    graph: DependencyGraph,
}

impl InstallPlan {
    pub(crate) fn new(
        order: Vec<String>,
        groups: Vec<ParallelInstallationGroup>,
        graph: DependencyGraph,
    ) -> Self {
        Self {
            order,
            groups,
            warnings: Vec::new(),
            graph,
        }
    }

    pub(crate) fn with_warnings(mut self, warnings: Vec<ConflictInfo>) -> Self {
        self.warnings = warnings;
        self
    }

    /// In-set dependencies of a planned component
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.graph.dependencies(name)
    }
}
