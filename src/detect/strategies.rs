// src/detect/strategies.rs

//! Host probing strategies
//!
//! Each strategy inspects one aspect of the host for evidence of an existing
//! install: an executable on PATH, well-known filesystem locations, the
//! installed-state registry file, or an environment variable pointing at an
//! install root. The detector runs them in priority order and the first hit
//! wins.

use crate::component::ComponentDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::DetectionStatus;

/// Which strategy produced a detection result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Executable found on PATH
    Executable,
    /// Well-known filesystem location exists
    WellKnownPath,
    /// Entry in the installed-state registry
    Registry,
    /// Environment variable pointing at an install root
    EnvVar,
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMethod::Executable => write!(f, "executable"),
            DetectionMethod::WellKnownPath => write!(f, "well-known-path"),
            DetectionMethod::Registry => write!(f, "registry"),
            DetectionMethod::EnvVar => write!(f, "env-var"),
        }
    }
}

/// Raw evidence reported by a single strategy
#[derive(Debug, Clone)]
pub struct Probe {
    pub status: DetectionStatus,
    pub version: Option<String>,
    pub install_path: Option<PathBuf>,
}

/// One way of probing the host for a component
pub trait DetectionStrategy: Send + Sync {
    fn method(&self) -> DetectionMethod;

    /// Probe the host; `None` means this strategy found nothing
    fn probe(&self, descriptor: &ComponentDescriptor) -> Option<Probe>;
}

/// Looks for the component's executable on PATH
pub struct ExecutableStrategy {
    /// Explicit search directories; `None` reads PATH at probe time
    search_dirs: Option<Vec<PathBuf>>,
}

impl ExecutableStrategy {
    pub fn new() -> Self {
        Self { search_dirs: None }
    }

    /// Restrict the search to explicit directories (used by tests)
    pub fn with_search_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs: Some(dirs),
        }
    }

    fn dirs(&self) -> Vec<PathBuf> {
        match &self.search_dirs {
            Some(dirs) => dirs.clone(),
            None => std::env::var_os("PATH")
                .map(|p| std::env::split_paths(&p).collect())
                .unwrap_or_default(),
        }
    }
}

impl Default for ExecutableStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionStrategy for ExecutableStrategy {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Executable
    }

    fn probe(&self, descriptor: &ComponentDescriptor) -> Option<Probe> {
        let exe = descriptor.detect.executable.as_deref()?;

        for dir in self.dirs() {
            let candidate = dir.join(exe);
            if is_executable(&candidate) {
                return Some(Probe {
                    status: DetectionStatus::Installed,
                    version: None,
                    install_path: Some(candidate),
                });
            }
        }

        None
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Checks well-known filesystem locations
///
/// Falls back to the descriptor's declared `install_paths` when no explicit
/// locations are given. All locations present means installed; a strict
/// subset means a partial install that needs configuration.
pub struct WellKnownPathStrategy;

impl DetectionStrategy for WellKnownPathStrategy {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::WellKnownPath
    }

    fn probe(&self, descriptor: &ComponentDescriptor) -> Option<Probe> {
        let paths: &[PathBuf] = if descriptor.detect.well_known_paths.is_empty() {
            &descriptor.install_paths
        } else {
            &descriptor.detect.well_known_paths
        };

        if paths.is_empty() {
            return None;
        }

        let existing: Vec<&PathBuf> = paths.iter().filter(|p| p.exists()).collect();
        if existing.is_empty() {
            return None;
        }

        let status = if existing.len() == paths.len() {
            DetectionStatus::Installed
        } else {
            DetectionStatus::PartiallyInstalled
        };

        Some(Probe {
            status,
            version: None,
            install_path: existing.first().map(|p| (*p).clone()),
        })
    }
}

/// Entry in the installed-state registry file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    components: HashMap<String, RegistryEntry>,
}

/// Reads the platform key-value registry of installed components
///
/// The registry is a TOML file written by the installer backend; this
/// strategy only reads it. A missing or unparsable file is treated as
/// "nothing recorded", never as an error.
pub struct RegistryStrategy {
    path: PathBuf,
}

impl RegistryStrategy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Option<RegistryFile> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        toml::from_str(&raw).ok()
    }
}

impl DetectionStrategy for RegistryStrategy {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Registry
    }

    fn probe(&self, descriptor: &ComponentDescriptor) -> Option<Probe> {
        let registry = self.load()?;
        let key = descriptor
            .detect
            .registry_key
            .as_deref()
            .unwrap_or(&descriptor.name);

        let entry = registry.components.get(key)?;
        Some(Probe {
            status: DetectionStatus::Installed,
            version: entry.version.clone(),
            install_path: entry.path.clone(),
        })
    }
}

/// Checks an environment variable pointing at an install root
///
/// A variable that is set but points at a missing directory is a stale
/// registration: the host claims the component exists but it does not. That
/// is reported as `Conflicted` so the decision engine routes it to manual
/// intervention instead of blindly reinstalling over it.
pub struct EnvVarStrategy {
    /// Explicit variable values; `None` reads the process environment
    overrides: Option<HashMap<String, String>>,
}

impl EnvVarStrategy {
    pub fn new() -> Self {
        Self { overrides: None }
    }

    /// Use explicit variable values instead of the process environment
    pub fn with_env(overrides: HashMap<String, String>) -> Self {
        Self {
            overrides: Some(overrides),
        }
    }

    fn lookup(&self, var: &str) -> Option<String> {
        match &self.overrides {
            Some(map) => map.get(var).cloned(),
            None => std::env::var(var).ok(),
        }
    }
}

impl Default for EnvVarStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionStrategy for EnvVarStrategy {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::EnvVar
    }

    fn probe(&self, descriptor: &ComponentDescriptor) -> Option<Probe> {
        let var = descriptor.detect.env_var.as_deref()?;
        let value = self.lookup(var)?;
        if value.is_empty() {
            return None;
        }

        let root = PathBuf::from(value);
        let status = if root.is_dir() {
            DetectionStatus::Installed
        } else {
            DetectionStatus::Conflicted
        };

        Some(Probe {
            status,
            version: None,
            install_path: Some(root),
        })
    }
}
