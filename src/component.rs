// src/component.rs

//! Component descriptors and collaborator traits
//!
//! A `ComponentDescriptor` is the immutable definition of one installable
//! component (runtime, tool, devkit). Descriptors are owned by the config
//! provider and shared as `Arc` references; the engine never copies or
//! mutates them.
//!
//! The traits at the bottom are the narrow contracts to the excluded
//! collaborators: catalog loading, the concrete installer mechanics, and the
//! optional security pre-check. The engine is polymorphic only over
//! success/failure/error-kind, never over the installation mechanism itself.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Immutable definition of one installable component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub name: String,
    /// Desired version requirement (semver syntax, e.g. ">=1.70")
    #[serde(default)]
    pub version: Option<String>,
    /// Names of components this one depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Names of components this one is mutually exclusive with
    #[serde(default)]
    pub conflicts: Vec<String>,
    /// Filesystem locations this component installs into
    #[serde(default)]
    pub install_paths: Vec<PathBuf>,
    /// Whether this component tolerates concurrent sibling installs
    #[serde(default = "default_true")]
    pub supports_parallel_install: bool,
    /// Opaque tag consumed by the installer backend (e.g. "archive", "script")
    #[serde(default)]
    pub install_method: String,
    /// Hints for the detection strategies
    #[serde(default)]
    pub detect: DetectionSpec,
    /// Command run by the default command backend
    #[serde(default)]
    pub install_command: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ComponentDescriptor {
    /// Create a minimal descriptor with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            install_paths: Vec::new(),
            supports_parallel_install: true,
            install_method: String::new(),
            detect: DetectionSpec::default(),
            install_command: None,
        }
    }
}

/// Probe hints consumed by the detection strategies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionSpec {
    /// Executable to look up on PATH
    pub executable: Option<String>,
    /// Well-known filesystem locations that indicate an existing install
    #[serde(default)]
    pub well_known_paths: Vec<PathBuf>,
    /// Key in the installed-state registry (defaults to the component name)
    pub registry_key: Option<String>,
    /// Environment variable pointing at an install root
    pub env_var: Option<String>,
}

/// Provides component descriptors by name
///
/// The engine never mutates descriptors; they are handed out as shared
/// references.
pub trait ConfigProvider: Send + Sync {
    fn load(&self, name: &str) -> Result<Arc<ComponentDescriptor>>;
}

/// Outcome of a single backend installation attempt
#[derive(Debug, Clone)]
pub struct BackendOutcome {
    pub success: bool,
    /// Machine-readable error kind, inspected only for recovery classification
    pub error_kind: Option<String>,
    pub message: String,
}

impl BackendOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            error_kind: None,
            message: message.into(),
        }
    }

    pub fn failed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_kind: Some(kind.into()),
            message: message.into(),
        }
    }
}

/// Black-box installer supplied by a trusted backend
///
/// Implementations must be safe to call from multiple worker threads at
/// once; the orchestrator only dispatches concurrent calls for components
/// whose group allows parallel installation.
pub trait InstallerBackend: Send + Sync {
    fn install(&self, descriptor: &ComponentDescriptor) -> BackendOutcome;
}

/// Optional pre-check consulted before planning
///
/// A component rejected by the validator is forced to `ManualRequired` and
/// never enters the install set.
pub trait SecurityValidator: Send + Sync {
    fn validate(&self, name: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let desc = ComponentDescriptor::new("rustup");
        assert_eq!(desc.name, "rustup");
        assert!(desc.dependencies.is_empty());
        assert!(desc.supports_parallel_install);
        assert!(desc.install_command.is_none());
    }

    #[test]
    fn test_descriptor_deserializes_with_defaults() {
        let desc: ComponentDescriptor = toml::from_str(
            r#"
            name = "sgdk"
            dependencies = ["java"]
            install_paths = ["/opt/sgdk"]
            "#,
        )
        .unwrap();

        assert_eq!(desc.name, "sgdk");
        assert_eq!(desc.dependencies, vec!["java"]);
        assert!(desc.supports_parallel_install);
        assert!(desc.conflicts.is_empty());
        assert!(desc.detect.executable.is_none());
    }

    #[test]
    fn test_backend_outcome_constructors() {
        let ok = BackendOutcome::ok("done");
        assert!(ok.success);
        assert!(ok.error_kind.is_none());

        let failed = BackendOutcome::failed("network_timeout", "timed out");
        assert!(!failed.success);
        assert_eq!(failed.error_kind.as_deref(), Some("network_timeout"));
    }
}
