// src/detect/mod.rs

//! Host state detection
//!
//! Probes the host for each candidate component's current presence and
//! version. Strategies run in a fixed priority order (executable on PATH,
//! well-known locations, installed-state registry, environment variable) and
//! the first strategy that reports "found" wins. Results are cached with a
//! short TTL so repeated planning runs within a session stay cheap.

mod cache;
mod strategies;

pub use cache::{DetectionCache, DEFAULT_TTL_SECS};
pub use strategies::{
    DetectionMethod, DetectionStrategy, EnvVarStrategy, ExecutableStrategy, Probe,
    RegistryStrategy, WellKnownPathStrategy,
};

use crate::component::ComponentDescriptor;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Presence/version state of a component on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    /// No strategy found any trace of the component
    NotFound,
    /// Present and satisfying the desired version (when one is declared)
    Installed,
    /// Some but not all expected locations exist
    PartiallyInstalled,
    /// Present but older than the desired version requirement
    Outdated,
    /// Host state is contradictory (e.g. stale env registration)
    Conflicted,
}

impl std::fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionStatus::NotFound => write!(f, "not found"),
            DetectionStatus::Installed => write!(f, "installed"),
            DetectionStatus::PartiallyInstalled => write!(f, "partially installed"),
            DetectionStatus::Outdated => write!(f, "outdated"),
            DetectionStatus::Conflicted => write!(f, "conflicted"),
        }
    }
}

/// Result of probing the host for one component
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub component: String,
    pub status: DetectionStatus,
    pub version_found: Option<String>,
    pub method: Option<DetectionMethod>,
    pub install_path: Option<PathBuf>,
}

impl DetectionResult {
    fn not_found(component: &str) -> Self {
        Self {
            component: component.to_string(),
            status: DetectionStatus::NotFound,
            version_found: None,
            method: None,
            install_path: None,
        }
    }
}

/// Multi-strategy component detector with a TTL cache
pub struct DependencyDetector {
    strategies: Vec<Box<dyn DetectionStrategy>>,
    cache: Arc<DetectionCache>,
    probes: AtomicU64,
}

impl DependencyDetector {
    /// Create a detector with an explicit strategy list (priority order)
    pub fn new(strategies: Vec<Box<dyn DetectionStrategy>>) -> Self {
        Self {
            strategies,
            cache: Arc::new(DetectionCache::default()),
            probes: AtomicU64::new(0),
        }
    }

    /// Create a detector with the standard strategy stack
    ///
    /// Priority order: executable on PATH, well-known filesystem locations,
    /// the installed-state registry at `registry_path`, environment variable.
    pub fn with_default_strategies(registry_path: impl AsRef<Path>) -> Self {
        Self::new(vec![
            Box::new(ExecutableStrategy::new()),
            Box::new(WellKnownPathStrategy),
            Box::new(RegistryStrategy::new(registry_path.as_ref())),
            Box::new(EnvVarStrategy::new()),
        ])
    }

    /// Share an externally constructed cache
    pub fn with_cache(mut self, cache: Arc<DetectionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Probe the host for the component, using the cache when fresh
    pub fn detect(&self, descriptor: &ComponentDescriptor) -> DetectionResult {
        if let Some(hit) = self.cache.get(&descriptor.name) {
            debug!("detection cache hit for '{}'", descriptor.name);
            return hit;
        }

        self.probes.fetch_add(1, Ordering::Relaxed);

        let result = self.probe_strategies(descriptor);
        debug!(
            "detected '{}': {} (method: {})",
            result.component,
            result.status,
            result
                .method
                .map(|m| m.to_string())
                .unwrap_or_else(|| "none".to_string()),
        );

        self.cache.put(result.clone());
        result
    }

    fn probe_strategies(&self, descriptor: &ComponentDescriptor) -> DetectionResult {
        for strategy in &self.strategies {
            if let Some(probe) = strategy.probe(descriptor) {
                // First strategy that reports "found" wins
                let status = refine_status(probe.status, probe.version.as_deref(), descriptor);
                return DetectionResult {
                    component: descriptor.name.clone(),
                    status,
                    version_found: probe.version,
                    method: Some(strategy.method()),
                    install_path: probe.install_path,
                };
            }
        }

        DetectionResult::not_found(&descriptor.name)
    }

    /// How many times the underlying strategies were actually run
    ///
    /// Cache hits do not count, so tests can assert hit/miss behavior.
    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::Relaxed)
    }

    /// Invalidate every cached result immediately
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Demote `Installed` to `Outdated` when the found version fails the
/// descriptor's desired requirement. Unparsable versions are left as-is.
fn refine_status(
    status: DetectionStatus,
    version_found: Option<&str>,
    descriptor: &ComponentDescriptor,
) -> DetectionStatus {
    if status != DetectionStatus::Installed {
        return status;
    }

    let (Some(found), Some(wanted)) = (version_found, descriptor.version.as_deref()) else {
        return status;
    };

    let (Ok(found), Ok(req)) = (Version::parse(found), VersionReq::parse(wanted)) else {
        debug!(
            "unparsable version for '{}' (found '{}', wanted '{}'), keeping installed",
            descriptor.name, found, wanted
        );
        return status;
    };

    if req.matches(&found) {
        DetectionStatus::Installed
    } else {
        DetectionStatus::Outdated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::DetectionSpec;
    use std::time::Duration;
    use tempfile::TempDir;

    fn registry_detector(temp: &TempDir, contents: &str) -> DependencyDetector {
        let registry = temp.path().join("installed.toml");
        std::fs::write(&registry, contents).unwrap();
        DependencyDetector::new(vec![Box::new(RegistryStrategy::new(&registry))])
    }

    fn python_descriptor(requirement: Option<&str>) -> ComponentDescriptor {
        let mut desc = ComponentDescriptor::new("python");
        desc.version = requirement.map(|r| r.to_string());
        desc
    }

    #[test]
    fn test_detect_not_found() {
        let detector = DependencyDetector::new(vec![Box::new(WellKnownPathStrategy)]);
        let desc = ComponentDescriptor::new("ghost");

        let result = detector.detect(&desc);
        assert_eq!(result.status, DetectionStatus::NotFound);
        assert!(result.method.is_none());
    }

    #[test]
    fn test_detect_caches_within_ttl() {
        let temp = TempDir::new().unwrap();
        let detector = registry_detector(
            &temp,
            r#"
            [components.python]
            version = "3.12.1"
            "#,
        );
        let desc = python_descriptor(None);

        let first = detector.detect(&desc);
        let second = detector.detect(&desc);

        assert_eq!(first.status, DetectionStatus::Installed);
        assert_eq!(second.status, DetectionStatus::Installed);
        // Second call hit the cache; strategies ran exactly once
        assert_eq!(detector.probe_count(), 1);
    }

    #[test]
    fn test_clear_cache_forces_reprobe() {
        let temp = TempDir::new().unwrap();
        let detector = registry_detector(
            &temp,
            r#"
            [components.python]
            version = "3.12.1"
            "#,
        );
        let desc = python_descriptor(None);

        detector.detect(&desc);
        detector.clear_cache();
        detector.detect(&desc);

        assert_eq!(detector.probe_count(), 2);
    }

    #[test]
    fn test_expired_entry_reprobes() {
        let temp = TempDir::new().unwrap();
        let registry = temp.path().join("installed.toml");
        std::fs::write(&registry, "[components.python]\nversion = \"3.12.1\"\n").unwrap();

        let cache = Arc::new(DetectionCache::new(Duration::from_millis(10)));
        let detector = DependencyDetector::new(vec![Box::new(RegistryStrategy::new(&registry))])
            .with_cache(cache);
        let desc = python_descriptor(None);

        detector.detect(&desc);
        std::thread::sleep(Duration::from_millis(25));
        detector.detect(&desc);

        assert_eq!(detector.probe_count(), 2);
    }

    #[test]
    fn test_outdated_when_requirement_unsatisfied() {
        let temp = TempDir::new().unwrap();
        let detector = registry_detector(
            &temp,
            r#"
            [components.python]
            version = "3.8.0"
            "#,
        );
        let desc = python_descriptor(Some(">=3.10"));

        let result = detector.detect(&desc);
        assert_eq!(result.status, DetectionStatus::Outdated);
        assert_eq!(result.version_found.as_deref(), Some("3.8.0"));
    }

    #[test]
    fn test_installed_when_requirement_satisfied() {
        let temp = TempDir::new().unwrap();
        let detector = registry_detector(
            &temp,
            r#"
            [components.python]
            version = "3.12.1"
            "#,
        );
        let desc = python_descriptor(Some(">=3.10"));

        let result = detector.detect(&desc);
        assert_eq!(result.status, DetectionStatus::Installed);
    }

    #[test]
    fn test_first_strategy_wins() {
        // Registry says outdated 0.9.0, but the well-known path runs first
        // and reports installed without a version.
        let temp = TempDir::new().unwrap();
        let registry = temp.path().join("installed.toml");
        std::fs::write(&registry, "[components.kit]\nversion = \"0.9.0\"\n").unwrap();

        let detector = DependencyDetector::new(vec![
            Box::new(WellKnownPathStrategy),
            Box::new(RegistryStrategy::new(&registry)),
        ]);

        let mut desc = ComponentDescriptor::new("kit");
        desc.version = Some(">=1.0".to_string());
        desc.detect = DetectionSpec {
            well_known_paths: vec![temp.path().to_path_buf()],
            ..Default::default()
        };

        let result = detector.detect(&desc);
        assert_eq!(result.method, Some(DetectionMethod::WellKnownPath));
        // No version evidence from the winning strategy, so no demotion
        assert_eq!(result.status, DetectionStatus::Installed);
    }
}
