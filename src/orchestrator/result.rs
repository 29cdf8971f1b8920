// src/orchestrator/result.rs

//! Per-component and batch result types, plus the mutex-guarded collector
//! that merges results from concurrent workers.

use crate::error::{Error, Result};
use crate::resolver::ConflictInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::error;

/// Terminal state of one component in a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Installed,
    Failed,
    Skipped,
}

/// Outcome of one component's installation attempt(s)
#[derive(Debug, Clone, Serialize)]
pub struct InstallationResult {
    pub component: String,
    pub success: bool,
    pub status: ComponentStatus,
    pub message: String,
    /// Machine-readable detail, e.g. the backend error kind
    pub details: Option<String>,
}

impl InstallationResult {
    pub fn installed(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            success: true,
            status: ComponentStatus::Installed,
            message: message.into(),
            details: None,
        }
    }

    pub fn failed(
        component: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            success: false,
            status: ComponentStatus::Failed,
            message: message.into(),
            details: Some(kind.into()),
        }
    }

    pub fn skipped(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            success: false,
            status: ComponentStatus::Skipped,
            message: reason.into(),
            details: None,
        }
    }
}

/// Aggregate result of one batch run
///
/// Created once per run, filled in by the orchestrator, and immutable once
/// the run terminates.
#[derive(Debug, Clone, Serialize)]
pub struct BatchInstallationResult {
    /// Components that reached a successful terminal state
    pub completed: Vec<String>,
    /// Failed components with their final result
    pub failed: HashMap<String, InstallationResult>,
    /// Skipped components with the reason (blocking dependency named)
    pub skipped: HashMap<String, String>,
    /// Conflicts detected for the batch (warnings when the run proceeded)
    pub conflicts: Vec<ConflictInfo>,
    /// Planned topological order (empty when planning was aborted)
    pub dependency_order: Vec<String>,
    /// Attempts per component when recovery was enabled
    pub recovery_attempts: HashMap<String, u32>,
    /// True iff no component failed
    pub overall_success: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchInstallationResult {
    pub(crate) fn started_now() -> Self {
        Self {
            completed: Vec::new(),
            failed: HashMap::new(),
            skipped: HashMap::new(),
            conflicts: Vec::new(),
            dependency_order: Vec::new(),
            recovery_attempts: HashMap::new(),
            overall_success: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Mark the run terminated and compute overall success
    pub(crate) fn finish(mut self) -> Self {
        self.overall_success = self.failed.is_empty();
        self.finished_at = Some(Utc::now());
        self
    }

    /// Mark the run terminated before execution started
    ///
    /// Used when a critical conflict aborts the batch: nothing failed, but
    /// the run did not succeed either.
    pub(crate) fn finish_aborted(mut self) -> Self {
        self.overall_success = false;
        self.finished_at = Some(Utc::now());
        self
    }

    /// Short human summary for logs and progress sinks
    pub fn summary(&self) -> String {
        format!(
            "{} installed, {} failed, {} skipped",
            self.completed.len(),
            self.failed.len(),
            self.skipped.len()
        )
    }
}

struct CollectorState {
    result: BatchInstallationResult,
    /// Components that already reached a terminal state this run
    terminal: HashSet<String>,
}

/// Serializes result writes from concurrent installation workers
///
/// A second terminal state for the same component is a programming-invariant
/// violation: it is logged and surfaced as `Error::Aggregation`, never
/// silently dropped.
pub(crate) struct ResultCollector {
    state: Mutex<CollectorState>,
}

impl ResultCollector {
    pub(crate) fn new(mut result: BatchInstallationResult) -> Self {
        let terminal: HashSet<String> = result
            .skipped
            .keys()
            .chain(result.failed.keys())
            .chain(result.completed.iter())
            .cloned()
            .collect();
        result.overall_success = false;
        Self {
            state: Mutex::new(CollectorState { result, terminal }),
        }
    }

    /// Record a terminal install/fail result for a component
    pub(crate) fn record(
        &self,
        result: InstallationResult,
        attempts: Option<u32>,
    ) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Aggregation("result collector poisoned".to_string()))?;

        let name = result.component.clone();
        if !state.terminal.insert(name.clone()) {
            let msg = format!("duplicate terminal state for component '{name}'");
            error!("{msg}");
            return Err(Error::Aggregation(msg));
        }

        if let Some(attempts) = attempts {
            state.result.recovery_attempts.insert(name.clone(), attempts);
        }

        match result.status {
            ComponentStatus::Installed => state.result.completed.push(name),
            ComponentStatus::Failed => {
                state.result.failed.insert(name, result);
            }
            ComponentStatus::Skipped => {
                state.result.skipped.insert(name, result.message);
            }
        }

        Ok(())
    }

    /// Record a skip with a reason (dependency blocked, manual required, ...)
    pub(crate) fn record_skip(&self, component: &str, reason: impl Into<String>) -> Result<()> {
        self.record(InstallationResult::skipped(component, reason), None)
    }

    /// First dependency of `deps` that did not complete, if any
    pub(crate) fn blocking_dependency(&self, deps: &[String]) -> Option<String> {
        let state = self.state.lock().ok()?;
        deps.iter()
            .find(|dep| {
                state.result.failed.contains_key(*dep) || state.result.skipped.contains_key(*dep)
            })
            .cloned()
    }

    /// Terminate the run and take the aggregate result
    pub(crate) fn finish(self) -> BatchInstallationResult {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.result.finish()
    }
}
