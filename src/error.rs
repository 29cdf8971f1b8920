// src/error.rs

//! Error types for the devforge installation engine
//!
//! Planning errors (circular dependencies, critical conflicts, unknown
//! components) abort a run before any installation side effects. Execution
//! errors never surface here: they are captured per component inside
//! `BatchInstallationResult` by the orchestrator.

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A dependency cycle was found while building the installation plan
    #[error("circular dependency detected involving component '{component}'")]
    CircularDependency { component: String },

    /// A mutual-exclusion conflict that must prevent the batch from starting
    #[error("critical conflict between '{component_a}' and '{component_b}': {description}")]
    CriticalConflict {
        component_a: String,
        component_b: String,
        description: String,
    },

    /// Requested component is not in the catalog
    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    /// Invariant violation while merging concurrent worker results
    #[error("result aggregation invariant violated: {0}")]
    Aggregation(String),

    /// Component catalog is malformed
    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid version requirement: {0}")]
    Version(#[from] semver::Error),
}
