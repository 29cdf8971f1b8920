// src/resolver/mod.rs

//! Dependency planning: graph construction, cycle detection, level grouping,
//! and conflict scanning for the components selected for installation.

mod conflict;
mod graph;
mod plan;

pub use conflict::{ConflictDetector, ConflictInfo, ConflictSeverity, ConflictType};
pub use graph::{DependencyGraph, DependencyGraphBuilder, ParallelInstallationGroup};
pub use plan::InstallPlan;
