// src/lib.rs

//! Devforge Installation Orchestrator
//!
//! Orchestrates installation of development environment components:
//! detects what is already on the host, decides what actually needs
//! installing, plans a dependency-ordered batch, and executes it with
//! bounded parallelism and bounded retry.
//!
//! # Architecture
//!
//! - Detection: multi-strategy host probing behind a TTL cache
//! - Decision: maps detection states to install/skip/configure actions
//! - Resolver: dependency graph, cycle detection, leveled parallel groups,
//!   conflict scanning
//! - Orchestrator: level-by-level execution, fail-fast skipping of
//!   dependents, recovery with exponential backoff

pub mod backend;
pub mod catalog;
pub mod cli;
pub mod component;
pub mod decision;
pub mod detect;
mod error;
pub mod orchestrator;
pub mod progress;
pub mod resolver;

pub use catalog::Catalog;
pub use component::{
    BackendOutcome, ComponentDescriptor, ConfigProvider, DetectionSpec, InstallerBackend,
    SecurityValidator,
};
pub use decision::{ConditionalRule, DecisionEngine, InstallationDecision};
pub use detect::{DependencyDetector, DetectionCache, DetectionResult, DetectionStatus};
pub use error::{Error, Result};
pub use orchestrator::{
    BatchInstallationResult, BatchOrchestrator, ComponentStatus, InstallationResult,
    OrchestratorOptions, RecoveryController, RetryPolicy,
};
pub use progress::{CallbackSink, CliSink, InstallEvent, LogSink, ProgressSink, SilentSink};
pub use resolver::{
    ConflictDetector, ConflictInfo, ConflictSeverity, ConflictType, DependencyGraph,
    DependencyGraphBuilder, InstallPlan, ParallelInstallationGroup,
};
