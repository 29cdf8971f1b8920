// src/decision.rs

//! Installation decisions
//!
//! Turns detection results into per-component decisions. The base mapping is
//! fixed; conditional rules ("install X only if no compatible alternative is
//! present") run as a second pass and may override the base decision.
//! Decisions are recomputed on every planning run and never persisted.

use crate::detect::{DetectionResult, DetectionStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// What the orchestrator should do with a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationDecision {
    /// Install (or update) the component
    Install,
    /// Already present and satisfying requirements
    Skip,
    /// Present but incomplete; run configuration only
    Configure,
    /// Host state needs a human before anything can proceed
    ManualRequired,
}

impl std::fmt::Display for InstallationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallationDecision::Install => write!(f, "install"),
            InstallationDecision::Skip => write!(f, "skip"),
            InstallationDecision::Configure => write!(f, "configure"),
            InstallationDecision::ManualRequired => write!(f, "manual required"),
        }
    }
}

/// "If no component among `alternatives` is installed, force Install on
/// `targets`; otherwise force Skip on `targets`."
///
/// Used for mutually substitutable components, e.g. alternative editors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub alternatives: Vec<String>,
    pub targets: Vec<String>,
}

/// Maps detection results to installation decisions
#[derive(Debug, Default)]
pub struct DecisionEngine {
    rules: Vec<ConditionalRule>,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<ConditionalRule>) -> Self {
        Self { rules }
    }

    /// Base mapping from detection status to decision
    pub fn decide(&self, detection: &DetectionResult) -> InstallationDecision {
        match detection.status {
            DetectionStatus::NotFound => InstallationDecision::Install,
            DetectionStatus::Installed => InstallationDecision::Skip,
            DetectionStatus::PartiallyInstalled => InstallationDecision::Configure,
            // Updates are planned exactly like installs
            DetectionStatus::Outdated => InstallationDecision::Install,
            DetectionStatus::Conflicted => InstallationDecision::ManualRequired,
        }
    }

    /// Decide for a whole detection set, then apply conditional rules
    pub fn decide_all(
        &self,
        detections: &HashMap<String, DetectionResult>,
    ) -> HashMap<String, InstallationDecision> {
        let mut decisions: HashMap<String, InstallationDecision> = detections
            .iter()
            .map(|(name, det)| (name.clone(), self.decide(det)))
            .collect();

        for rule in &self.rules {
            Self::apply_rule(rule, detections, &mut decisions);
        }

        decisions
    }

    /// Apply one conditional rule on top of the base decisions
    ///
    /// Only targets present in the decision set are touched; a rule never
    /// pulls new components into the run.
    pub fn apply_rule(
        rule: &ConditionalRule,
        detections: &HashMap<String, DetectionResult>,
        decisions: &mut HashMap<String, InstallationDecision>,
    ) {
        let alternative_present = rule.alternatives.iter().any(|alt| {
            detections
                .get(alt)
                .map(|d| d.status == DetectionStatus::Installed)
                .unwrap_or(false)
        });

        let forced = if alternative_present {
            InstallationDecision::Skip
        } else {
            InstallationDecision::Install
        };

        for target in &rule.targets {
            if let Some(decision) = decisions.get_mut(target) {
                if *decision != forced {
                    debug!(
                        "conditional rule overrides '{}': {} -> {}",
                        target, decision, forced
                    );
                }
                *decision = forced;
            }
        }
    }
}
