// tests/common/mod.rs

//! Shared test utilities for the orchestrator integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use devforge::{
    BackendOutcome, BatchOrchestrator, Catalog, ComponentDescriptor, DecisionEngine,
    DependencyDetector, InstallerBackend, OrchestratorOptions, RetryPolicy,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backend that replays scripted outcomes per component and counts calls.
///
/// Components with no script always succeed.
pub struct MockBackend {
    scripts: Mutex<HashMap<String, Vec<BackendOutcome>>>,
    calls: Mutex<HashMap<String, u32>>,
    total_calls: AtomicU32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            total_calls: AtomicU32::new(0),
        }
    }

    /// Script the outcome sequence for one component; outcomes are consumed
    /// in order and the last one repeats once the script runs out.
    pub fn script(self, component: &str, outcomes: Vec<BackendOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(component.to_string(), outcomes);
        self
    }

    pub fn calls_for(&self, component: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(component)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.total_calls.load(Ordering::SeqCst)
    }
}

impl InstallerBackend for MockBackend {
    fn install(&self, descriptor: &ComponentDescriptor) -> BackendOutcome {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(descriptor.name.clone())
            .or_insert(0) += 1;

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&descriptor.name) {
            Some(outcomes) if outcomes.len() > 1 => outcomes.remove(0),
            Some(outcomes) => outcomes
                .first()
                .cloned()
                .unwrap_or_else(|| BackendOutcome::ok("installed")),
            None => BackendOutcome::ok("installed"),
        }
    }
}

/// Descriptor with dependencies, no detection hints (detects as not found).
pub fn component(name: &str, dependencies: &[&str]) -> ComponentDescriptor {
    let mut desc = ComponentDescriptor::new(name);
    desc.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
    desc.install_method = "test".to_string();
    desc
}

/// Same as `component` but declaring an explicit conflict.
pub fn conflicting_component(
    name: &str,
    dependencies: &[&str],
    conflicts: &[&str],
) -> ComponentDescriptor {
    let mut desc = component(name, dependencies);
    desc.conflicts = conflicts.iter().map(|c| c.to_string()).collect();
    desc
}

/// Same as `component` but installing into the given paths.
pub fn component_with_paths(
    name: &str,
    dependencies: &[&str],
    paths: &[&str],
) -> ComponentDescriptor {
    let mut desc = component(name, dependencies);
    desc.install_paths = paths.iter().map(PathBuf::from).collect();
    desc
}

/// Orchestrator over an in-memory catalog with a strategy-less detector
/// (every component detects as not found) and fast retry delays.
pub fn orchestrator(
    descriptors: Vec<ComponentDescriptor>,
    backend: Arc<MockBackend>,
) -> BatchOrchestrator {
    orchestrator_with_options(descriptors, backend, fast_options())
}

pub fn orchestrator_with_options(
    descriptors: Vec<ComponentDescriptor>,
    backend: Arc<MockBackend>,
    options: OrchestratorOptions,
) -> BatchOrchestrator {
    let catalog = Catalog::from_descriptors(descriptors).unwrap();
    let detector = DependencyDetector::new(vec![]);
    BatchOrchestrator::new(Arc::new(catalog), detector, DecisionEngine::new(), backend)
        .with_options(options)
}

/// Default options with millisecond backoff so retry tests stay fast.
pub fn fast_options() -> OrchestratorOptions {
    OrchestratorOptions {
        max_parallel: 4,
        enable_recovery: true,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        },
    }
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
