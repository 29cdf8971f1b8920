// src/orchestrator/mod.rs

//! Batch installation orchestrator
//!
//! Top-level coordinator for a batch run: detect and decide for every
//! requested component, scan for conflicts, build the leveled plan, then
//! execute level by level with bounded parallelism. Critical conflicts and
//! dependency cycles abort before any installation side effect; per-component
//! execution failures are captured in the batch result and never thrown past
//! this boundary.
//!
//! All collaborators are injected at construction. There is no hidden
//! process-wide state; the detection cache lives inside the injected
//! detector.

mod recovery;
mod result;

pub use recovery::{classify, FailureClass, RecoveryController, RetryPolicy, RECOVERABLE_KINDS};
pub use result::{BatchInstallationResult, ComponentStatus, InstallationResult};

use crate::component::{ComponentDescriptor, ConfigProvider, InstallerBackend, SecurityValidator};
use crate::decision::{DecisionEngine, InstallationDecision};
use crate::detect::DependencyDetector;
use crate::error::{Error, Result};
use crate::progress::{InstallEvent, ProgressSink, SilentSink};
use crate::resolver::{ConflictDetector, ConflictInfo, DependencyGraphBuilder, InstallPlan};
use rayon::prelude::*;
use result::ResultCollector;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Tuning knobs for one orchestrator instance
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Upper bound on concurrent installation attempts
    pub max_parallel: usize,
    /// Whether to wrap attempts in the recovery controller
    pub enable_recovery: bool,
    /// Retry policy used when recovery is enabled
    pub retry: RetryPolicy,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            enable_recovery: true,
            retry: RetryPolicy::default(),
        }
    }
}

/// Everything prepared before execution: descriptors, the install set after
/// decisions, recorded skips, and the conflict scan.
struct PreparedBatch {
    descriptors: HashMap<String, Arc<ComponentDescriptor>>,
    install_set: Vec<String>,
    skipped: Vec<(String, String)>,
    conflicts: Vec<ConflictInfo>,
}

impl PreparedBatch {
    fn has_critical_conflict(&self) -> bool {
        self.conflicts.iter().any(|c| c.is_critical())
    }
}

/// Coordinates detection, planning, and level-by-level execution
pub struct BatchOrchestrator {
    provider: Arc<dyn ConfigProvider>,
    detector: DependencyDetector,
    decision_engine: DecisionEngine,
    conflict_detector: ConflictDetector,
    graph_builder: DependencyGraphBuilder,
    recovery: RecoveryController,
    backend: Arc<dyn InstallerBackend>,
    sink: Arc<dyn ProgressSink>,
    validator: Option<Arc<dyn SecurityValidator>>,
    options: OrchestratorOptions,
}

impl BatchOrchestrator {
    pub fn new(
        provider: Arc<dyn ConfigProvider>,
        detector: DependencyDetector,
        decision_engine: DecisionEngine,
        backend: Arc<dyn InstallerBackend>,
    ) -> Self {
        let options = OrchestratorOptions::default();
        Self {
            provider,
            detector,
            decision_engine,
            conflict_detector: ConflictDetector::new(),
            graph_builder: DependencyGraphBuilder::new(),
            recovery: RecoveryController::new(options.retry.clone()),
            backend,
            sink: Arc::new(SilentSink),
            validator: None,
            options,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn SecurityValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.recovery = RecoveryController::new(options.retry.clone());
        self.options = options;
        self
    }

    /// The injected graph builder (exposes its invocation counter)
    pub fn graph_builder(&self) -> &DependencyGraphBuilder {
        &self.graph_builder
    }

    /// Access to the detector for cache control
    pub fn detector(&self) -> &DependencyDetector {
        &self.detector
    }

    /// Detect, decide, and plan without executing anything
    ///
    /// Critical conflicts and cycles surface as errors with zero side
    /// effects.
    pub fn plan(&self, names: &[String]) -> Result<InstallPlan> {
        let prepared = self.prepare(names)?;

        if let Some(critical) = prepared.conflicts.iter().find(|c| c.is_critical()) {
            return Err(Error::CriticalConflict {
                component_a: critical.component_a.clone(),
                component_b: critical.component_b.clone(),
                description: critical.description.clone(),
            });
        }

        let plan = self.graph_builder.build_plan(
            &prepared.install_set,
            &prepared.descriptors,
            &prepared.conflicts,
        )?;
        Ok(plan.with_warnings(prepared.conflicts))
    }

    /// Run the full batch: plan, then execute level by level
    ///
    /// Critical conflicts terminate the run before planning with
    /// `overall_success == false` and the conflicts attached to the result;
    /// the graph builder is never invoked. A dependency cycle is a planning
    /// error and propagates as `Err` with zero side effects.
    pub fn install_multiple(&self, names: &[String]) -> Result<BatchInstallationResult> {
        let requested = dedup(names);
        self.sink.emit(&InstallEvent::PlanningStarted {
            components: requested.clone(),
        });

        let prepared = self.prepare(&requested)?;

        let mut seed = BatchInstallationResult::started_now();
        for (name, reason) in &prepared.skipped {
            seed.skipped.insert(name.clone(), reason.clone());
        }
        seed.conflicts = prepared.conflicts.clone();

        if prepared.has_critical_conflict() {
            warn!("critical conflict detected, aborting batch before planning");
            let result = seed.finish_aborted();
            self.sink.emit(&InstallEvent::BatchFinished {
                result: result.clone(),
            });
            return Ok(result);
        }

        let plan = self.graph_builder.build_plan(
            &prepared.install_set,
            &prepared.descriptors,
            &prepared.conflicts,
        )?;
        seed.dependency_order = plan.order.clone();

        info!(
            "installing {} components across {} levels (max parallel: {})",
            plan.order.len(),
            plan.groups.len(),
            self.options.max_parallel
        );

        let collector = ResultCollector::new(seed);
        self.execute(&plan, &prepared.descriptors, &collector)?;

        let result = collector.finish();
        self.sink.emit(&InstallEvent::BatchFinished {
            result: result.clone(),
        });
        Ok(result)
    }

    /// Detection, decisions, and the conflict scan for the requested set
    fn prepare(&self, names: &[String]) -> Result<PreparedBatch> {
        let requested = dedup(names);

        let mut descriptors = HashMap::new();
        for name in &requested {
            let descriptor = self.provider.load(name)?;
            descriptors.insert(name.clone(), descriptor);
        }

        let mut skipped: Vec<(String, String)> = Vec::new();
        // Components needing manual intervention; their dependents are
        // blocked below.
        let mut manual: HashSet<String> = HashSet::new();
        let mut detections = HashMap::new();
        for name in &requested {
            // Security pre-check runs before detection; a rejected component
            // never enters the decision pass.
            if let Some(validator) = &self.validator {
                if !validator.validate(name) {
                    warn!("security validator rejected '{}'", name);
                    manual.insert(name.clone());
                    skipped.push((
                        name.clone(),
                        "manual intervention required: rejected by security validator"
                            .to_string(),
                    ));
                    continue;
                }
            }
            detections.insert(name.clone(), self.detector.detect(&descriptors[name]));
        }

        let decisions = self.decision_engine.decide_all(&detections);

        let mut install_set = Vec::new();
        for name in &requested {
            let Some(decision) = decisions.get(name) else {
                continue; // rejected by the validator above
            };
            match decision {
                InstallationDecision::Install | InstallationDecision::Configure => {
                    install_set.push(name.clone());
                }
                InstallationDecision::Skip => {
                    skipped.push((name.clone(), "already installed".to_string()));
                }
                InstallationDecision::ManualRequired => {
                    manual.insert(name.clone());
                    skipped.push((
                        name.clone(),
                        format!(
                            "manual intervention required: host state is {}",
                            detections[name].status
                        ),
                    ));
                }
            }
        }

        // A dependency held back for manual intervention is known-absent, so
        // its dependents must not install either. Skips for "already
        // installed" never block: the dependency is present. Propagates
        // transitively before the graph is built.
        loop {
            let mut newly_blocked = Vec::new();
            for name in &install_set {
                let deps = &descriptors[name].dependencies;
                if let Some(dep) = deps.iter().find(|d| manual.contains(*d)) {
                    newly_blocked.push((name.clone(), dep.clone()));
                }
            }
            if newly_blocked.is_empty() {
                break;
            }
            for (name, dep) in newly_blocked {
                warn!("'{}' blocked by dependency '{}'", name, dep);
                manual.insert(name.clone());
                skipped.push((name.clone(), format!("blocked by dependency '{dep}'")));
            }
            install_set.retain(|n| !manual.contains(n));
        }

        let conflicts = self.conflict_detector.detect(&install_set, &descriptors);

        Ok(PreparedBatch {
            descriptors,
            install_set,
            skipped,
            conflicts,
        })
    }

    /// Execute the plan's groups in strictly increasing level order
    fn execute(
        &self,
        plan: &InstallPlan,
        descriptors: &HashMap<String, Arc<ComponentDescriptor>>,
        collector: &ResultCollector,
    ) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.max_parallel.max(1))
            .build()
            .map_err(|e| Error::Aggregation(format!("failed to build worker pool: {e}")))?;

        for group in &plan.groups {
            // Components whose dependencies failed or were skipped never run;
            // independent branches in the same level still proceed.
            let mut runnable = Vec::new();
            for name in &group.components {
                match collector.blocking_dependency(plan.dependencies_of(name)) {
                    Some(dep) => {
                        collector
                            .record_skip(name, format!("blocked by dependency '{dep}'"))?;
                    }
                    None => runnable.push(name.clone()),
                }
            }

            if runnable.is_empty() {
                continue;
            }

            self.sink.emit(&InstallEvent::LevelStarted {
                level: group.level,
                components: runnable.clone(),
            });

            if group.can_install_parallel && self.options.max_parallel > 1 && runnable.len() > 1
            {
                pool.install(|| {
                    runnable
                        .par_iter()
                        .try_for_each(|name| self.run_component(name, descriptors, collector))
                })?;
            } else {
                for name in &runnable {
                    self.run_component(name, descriptors, collector)?;
                }
            }
        }

        Ok(())
    }

    /// One component's terminal attempt (with or without recovery)
    fn run_component(
        &self,
        name: &str,
        descriptors: &HashMap<String, Arc<ComponentDescriptor>>,
        collector: &ResultCollector,
    ) -> Result<()> {
        let descriptor = descriptors
            .get(name)
            .ok_or_else(|| Error::UnknownComponent(name.to_string()))?;

        self.sink.emit(&InstallEvent::ComponentStarted {
            component: name.to_string(),
        });

        let (result, attempts) = if self.options.enable_recovery {
            let (result, attempts) = self
                .recovery
                .install_with_recovery(self.backend.as_ref(), descriptor);
            (result, Some(attempts))
        } else {
            let outcome = self.backend.install(descriptor);
            let result = if outcome.success {
                InstallationResult::installed(name, outcome.message)
            } else {
                InstallationResult::failed(
                    name,
                    outcome.error_kind.unwrap_or_else(|| "unknown".to_string()),
                    outcome.message,
                )
            };
            (result, None)
        };

        self.sink.emit(&InstallEvent::ComponentFinished {
            component: name.to_string(),
            result: result.clone(),
        });

        collector.record(result, attempts)
    }
}

fn dedup(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .filter(|n| seen.insert(n.to_string()))
        .cloned()
        .collect()
}
