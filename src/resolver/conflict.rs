// src/resolver/conflict.rs

//! Conflict detection between components selected for installation
//!
//! Two kinds of conflict exist: explicit mutual exclusions declared in the
//! descriptors (critical, the batch must not start) and install-path
//! collisions (warning, the batch proceeds but the pair never installs in
//! parallel).

use crate::component::ComponentDescriptor;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Kind of conflict between two components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Declared mutual exclusion
    Explicit,
    /// Overlapping install paths
    Path,
}

/// How severe a conflict is for the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    /// Must abort the batch before any installation starts
    Critical,
    /// Recorded on the result; execution proceeds
    Warning,
}

/// A conflict between two components in the selected set
#[derive(Debug, Clone, Serialize)]
pub struct ConflictInfo {
    pub component_a: String,
    pub component_b: String,
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub description: String,
}

impl ConflictInfo {
    pub fn is_critical(&self) -> bool {
        self.severity == ConflictSeverity::Critical
    }

    /// Whether this conflict is between the two given components
    pub fn involves(&self, a: &str, b: &str) -> bool {
        (self.component_a == a && self.component_b == b)
            || (self.component_a == b && self.component_b == a)
    }
}

impl std::fmt::Display for ConflictInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <-> {}: {}",
            self.component_a, self.component_b, self.description
        )
    }
}

/// Scans a selected component set for conflicts
#[derive(Debug, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Inspect every unordered pair in the selected set
    pub fn detect(
        &self,
        names: &[String],
        descriptors: &HashMap<String, Arc<ComponentDescriptor>>,
    ) -> Vec<ConflictInfo> {
        let mut conflicts = Vec::new();

        for (i, a) in names.iter().enumerate() {
            for b in names.iter().skip(i + 1) {
                let (Some(desc_a), Some(desc_b)) = (descriptors.get(a), descriptors.get(b))
                else {
                    continue;
                };

                if desc_a.conflicts.contains(b) || desc_b.conflicts.contains(a) {
                    conflicts.push(ConflictInfo {
                        component_a: a.clone(),
                        component_b: b.clone(),
                        conflict_type: ConflictType::Explicit,
                        severity: ConflictSeverity::Critical,
                        description: format!("'{}' and '{}' are mutually exclusive", a, b),
                    });
                }

                if let Some(path) = shared_install_path(desc_a, desc_b) {
                    conflicts.push(ConflictInfo {
                        component_a: a.clone(),
                        component_b: b.clone(),
                        conflict_type: ConflictType::Path,
                        severity: ConflictSeverity::Warning,
                        description: format!(
                            "'{}' and '{}' both install into {}",
                            a, b, path
                        ),
                    });
                }
            }
        }

        conflicts
    }
}

fn shared_install_path(a: &ComponentDescriptor, b: &ComponentDescriptor) -> Option<String> {
    let paths_b: HashSet<_> = b.install_paths.iter().collect();
    a.install_paths
        .iter()
        .find(|p| paths_b.contains(p))
        .map(|p| p.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn descriptors(
        specs: &[(&str, &[&str], &[&str])],
    ) -> (Vec<String>, HashMap<String, Arc<ComponentDescriptor>>) {
        let mut names = Vec::new();
        let mut map = HashMap::new();
        for (name, conflicts, paths) in specs {
            let mut desc = ComponentDescriptor::new(*name);
            desc.conflicts = conflicts.iter().map(|c| c.to_string()).collect();
            desc.install_paths = paths.iter().map(PathBuf::from).collect();
            names.push(name.to_string());
            map.insert(name.to_string(), Arc::new(desc));
        }
        (names, map)
    }

    #[test]
    fn test_no_conflicts() {
        let (names, map) = descriptors(&[
            ("a", &[], &["/opt/a"]),
            ("b", &[], &["/opt/b"]),
        ]);
        let conflicts = ConflictDetector::new().detect(&names, &map);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_explicit_conflict_is_critical() {
        let (names, map) = descriptors(&[
            ("gcc-arm", &["clang-arm"], &[]),
            ("clang-arm", &[], &[]),
        ]);

        let conflicts = ConflictDetector::new().detect(&names, &map);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Explicit);
        assert!(conflicts[0].is_critical());
    }

    #[test]
    fn test_explicit_conflict_either_direction() {
        // Declared only on the second component
        let (names, map) = descriptors(&[
            ("gcc-arm", &[], &[]),
            ("clang-arm", &["gcc-arm"], &[]),
        ]);

        let conflicts = ConflictDetector::new().detect(&names, &map);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].involves("gcc-arm", "clang-arm"));
    }

    #[test]
    fn test_path_conflict_is_warning() {
        let (names, map) = descriptors(&[
            ("sdk-a", &[], &["/opt/shared", "/opt/a"]),
            ("sdk-b", &[], &["/opt/shared"]),
        ]);

        let conflicts = ConflictDetector::new().detect(&names, &map);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Path);
        assert_eq!(conflicts[0].severity, ConflictSeverity::Warning);
        assert!(conflicts[0].description.contains("/opt/shared"));
    }

    #[test]
    fn test_pair_reported_once() {
        let (names, map) = descriptors(&[
            ("a", &["b"], &[]),
            ("b", &["a"], &[]),
        ]);

        let conflicts = ConflictDetector::new().detect(&names, &map);
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn test_explicit_and_path_both_reported() {
        let (names, map) = descriptors(&[
            ("a", &["b"], &["/opt/x"]),
            ("b", &[], &["/opt/x"]),
        ]);

        let conflicts = ConflictDetector::new().detect(&names, &map);
        assert_eq!(conflicts.len(), 2);
        assert!(conflicts.iter().any(|c| c.is_critical()));
        assert!(conflicts.iter().any(|c| !c.is_critical()));
    }
}
