// src/resolver/graph.rs

//! Dependency graph construction, cycle detection, and level grouping
//!
//! The graph holds the components selected for installation and the declared
//! dependency edges restricted to that set. Cycle detection runs before any
//! grouping; a cycle aborts planning with no partial result. Acyclic graphs
//! are grouped into levels usable for parallel execution: level 0 has no
//! in-set dependencies, level k only depends on levels 0..k-1.

use crate::component::ComponentDescriptor;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::conflict::ConflictInfo;
use super::plan::InstallPlan;

/// A set of components at equal dependency depth
#[derive(Debug, Clone, Serialize)]
pub struct ParallelInstallationGroup {
    /// Members in declaration order (used for sequential execution)
    pub components: Vec<String>,
    /// 0-indexed dependency depth
    pub level: usize,
    /// Whether members may install concurrently
    pub can_install_parallel: bool,
}

/// DFS color marker for cycle detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Dependency graph over the components selected for installation
#[derive(Debug)]
pub struct DependencyGraph {
    /// Selected components in declaration order
    nodes: Vec<String>,
    /// Dependency edges restricted to the selected set
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph for `names`, keeping only in-set dependency edges
    pub fn build(
        names: &[String],
        descriptors: &HashMap<String, Arc<ComponentDescriptor>>,
    ) -> Self {
        let mut nodes = Vec::new();
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();

        for name in names {
            if nodes.contains(name) {
                continue;
            }
            nodes.push(name.clone());
        }

        for name in &nodes {
            let deps = descriptors
                .get(name)
                .map(|d| {
                    d.dependencies
                        .iter()
                        .filter(|dep| nodes.contains(dep))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            edges.insert(name.clone(), deps);
        }

        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// In-set dependencies of a component
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find a dependency cycle using three-color DFS
    ///
    /// Returns the component at which a gray node was re-entered, or `None`
    /// if the graph is acyclic.
    pub fn detect_cycle(&self) -> Option<String> {
        let mut colors: HashMap<&str, Color> =
            self.nodes.iter().map(|n| (n.as_str(), Color::White)).collect();

        for node in &self.nodes {
            if colors[node.as_str()] == Color::White {
                if let Some(offender) = self.dfs_cycle(node, &mut colors) {
                    return Some(offender);
                }
            }
        }

        None
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        colors: &mut HashMap<&'a str, Color>,
    ) -> Option<String> {
        colors.insert(node, Color::Gray);

        for dep in self.dependencies(node) {
            match colors.get(dep.as_str()) {
                Some(Color::Gray) => return Some(dep.clone()),
                Some(Color::White) => {
                    if let Some(offender) = self.dfs_cycle(dep, colors) {
                        return Some(offender);
                    }
                }
                _ => {}
            }
        }

        colors.insert(node, Color::Black);
        None
    }

    /// Assign each node its dependency depth
    ///
    /// Level 0 for nodes without in-set dependencies, otherwise
    /// `1 + max(level of dependencies)`. Must only be called on an acyclic
    /// graph.
    pub fn levels(&self) -> HashMap<String, usize> {
        let mut levels: HashMap<String, usize> = HashMap::new();

        fn level_of(
            graph: &DependencyGraph,
            node: &str,
            levels: &mut HashMap<String, usize>,
        ) -> usize {
            if let Some(&level) = levels.get(node) {
                return level;
            }

            let deps = graph.dependencies(node);
            let level = if deps.is_empty() {
                0
            } else {
                1 + deps
                    .iter()
                    .map(|dep| level_of(graph, dep, levels))
                    .max()
                    .unwrap_or(0)
            };

            levels.insert(node.to_string(), level);
            level
        }

        for node in &self.nodes {
            level_of(self, node, &mut levels);
        }

        levels
    }
}

/// Builds installation plans from selected components
///
/// The builder counts its invocations so callers can verify that a critical
/// conflict short-circuits the batch before planning ever starts.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    builds: AtomicU64,
}

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the leveled installation plan for the selected set
    ///
    /// `conflicts` is the full conflict list for the set; any conflict
    /// (Critical or Warning) between two members of a group demotes the
    /// group to sequential execution.
    pub fn build_plan(
        &self,
        names: &[String],
        descriptors: &HashMap<String, Arc<ComponentDescriptor>>,
        conflicts: &[ConflictInfo],
    ) -> Result<InstallPlan> {
        self.builds.fetch_add(1, Ordering::Relaxed);

        let graph = DependencyGraph::build(names, descriptors);

        if let Some(component) = graph.detect_cycle() {
            return Err(Error::CircularDependency { component });
        }

        let levels = graph.levels();
        let depth = levels.values().copied().max().map(|m| m + 1).unwrap_or(0);

        let mut groups = Vec::with_capacity(depth);
        for level in 0..depth {
            // Declaration order within the group
            let components: Vec<String> = graph
                .nodes()
                .iter()
                .filter(|n| levels[*n] == level)
                .cloned()
                .collect();

            let can_install_parallel =
                group_allows_parallel(&components, descriptors, conflicts);

            groups.push(ParallelInstallationGroup {
                components,
                level,
                can_install_parallel,
            });
        }

        // Stable reporting order: alphabetical within a level
        let mut order = Vec::with_capacity(graph.nodes().len());
        for group in &groups {
            let mut sorted = group.components.clone();
            sorted.sort();
            order.extend(sorted);
        }

        debug!(
            "planned {} components across {} levels",
            order.len(),
            groups.len()
        );

        Ok(InstallPlan::new(order, groups, graph))
    }

    /// How many times a plan build has been attempted
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }
}

/// A group may install in parallel only if every member opts in and no pair
/// of members conflicts (at any severity).
fn group_allows_parallel(
    components: &[String],
    descriptors: &HashMap<String, Arc<ComponentDescriptor>>,
    conflicts: &[ConflictInfo],
) -> bool {
    let all_support = components.iter().all(|name| {
        descriptors
            .get(name)
            .map(|d| d.supports_parallel_install)
            .unwrap_or(false)
    });
    if !all_support {
        return false;
    }

    for (i, a) in components.iter().enumerate() {
        for b in components.iter().skip(i + 1) {
            if conflicts.iter().any(|c| c.involves(a, b)) {
                return false;
            }
        }
    }

    true
}
