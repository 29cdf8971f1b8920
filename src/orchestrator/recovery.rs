// src/orchestrator/recovery.rs

//! Recovery controller for individual installation attempts
//!
//! Wraps each backend call, classifies failures by error kind, and applies a
//! bounded retry policy with exponential backoff. Transient network and
//! download failures are retried; privilege and disk problems are not, so
//! they surface immediately instead of being masked as flaky.

use crate::component::{ComponentDescriptor, InstallerBackend};
use std::time::Duration;
use tracing::{info, warn};

use super::result::InstallationResult;

/// Error kinds eligible for retry; everything else is fatal
pub const RECOVERABLE_KINDS: &[&str] = &["network_timeout", "download_failed", "temporary_failure"];

/// Whether a backend failure may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Recoverable,
    Fatal,
}

/// Classify a backend error kind
///
/// Unknown kinds default to fatal: an unclassified error must never be
/// retried into oblivion.
pub fn classify(kind: &str) -> FailureClass {
    if RECOVERABLE_KINDS.contains(&kind) {
        FailureClass::Recoverable
    } else {
        FailureClass::Fatal
    }
}

/// Bounded retry policy with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each retry after that
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the retry following 1-based attempt `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Applies the retry policy around backend installation attempts
#[derive(Debug, Default)]
pub struct RecoveryController {
    policy: RetryPolicy,
}

impl RecoveryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Install one component, retrying recoverable failures
    ///
    /// Returns the terminal result together with the number of attempts
    /// made. Fatal failures return after the first attempt; success returns
    /// immediately at any attempt.
    pub fn install_with_recovery(
        &self,
        backend: &dyn InstallerBackend,
        descriptor: &ComponentDescriptor,
    ) -> (InstallationResult, u32) {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = backend.install(descriptor);

            if outcome.success {
                if attempt > 1 {
                    info!(
                        "'{}' installed after {} attempts",
                        descriptor.name, attempt
                    );
                }
                return (
                    InstallationResult::installed(&descriptor.name, outcome.message),
                    attempt,
                );
            }

            let kind = outcome.error_kind.as_deref().unwrap_or("unknown");

            if classify(kind) == FailureClass::Fatal {
                warn!(
                    "'{}' failed with fatal error kind '{}': {}",
                    descriptor.name, kind, outcome.message
                );
                return (
                    InstallationResult::failed(&descriptor.name, kind, outcome.message),
                    attempt,
                );
            }

            if attempt >= max_attempts {
                warn!(
                    "'{}' still failing after {} attempts, giving up: {}",
                    descriptor.name, attempt, outcome.message
                );
                return (
                    InstallationResult::failed(&descriptor.name, kind, outcome.message),
                    attempt,
                );
            }

            let delay = self.policy.backoff(attempt);
            warn!(
                "'{}' attempt {} failed ({}), retrying in {:?}",
                descriptor.name, attempt, kind, delay
            );
            std::thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::BackendOutcome;
    use std::sync::Mutex;

    /// Backend that replays a scripted sequence of outcomes
    struct ScriptedBackend {
        outcomes: Mutex<Vec<BackendOutcome>>,
        calls: Mutex<u32>,
    }

    impl ScriptedBackend {
        fn new(outcomes: Vec<BackendOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl InstallerBackend for ScriptedBackend {
        fn install(&self, _descriptor: &ComponentDescriptor) -> BackendOutcome {
            *self.calls.lock().unwrap() += 1;
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                BackendOutcome::ok("installed")
            } else {
                outcomes.remove(0)
            }
        }
    }

    fn fast_controller() -> RecoveryController {
        RecoveryController::new(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        })
    }

    #[test]
    fn test_classify_kinds() {
        assert_eq!(classify("network_timeout"), FailureClass::Recoverable);
        assert_eq!(classify("download_failed"), FailureClass::Recoverable);
        assert_eq!(classify("temporary_failure"), FailureClass::Recoverable);
        assert_eq!(classify("insufficient_privileges"), FailureClass::Fatal);
        assert_eq!(classify("disk_space"), FailureClass::Fatal);
        assert_eq!(classify("circular_dependency"), FailureClass::Fatal);
        // Unknown kinds default to fatal
        assert_eq!(classify("some_new_kind"), FailureClass::Fatal);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.backoff(1), Duration::from_secs(5));
        assert_eq!(policy.backoff(2), Duration::from_secs(10));
        assert_eq!(policy.backoff(3), Duration::from_secs(20));
    }

    #[test]
    fn test_success_first_attempt() {
        let backend = ScriptedBackend::new(vec![BackendOutcome::ok("done")]);
        let desc = ComponentDescriptor::new("tool");

        let (result, attempts) = fast_controller().install_with_recovery(&backend, &desc);
        assert!(result.success);
        assert_eq!(attempts, 1);
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_recoverable_failure_then_success() {
        let backend = ScriptedBackend::new(vec![
            BackendOutcome::failed("network_timeout", "timed out"),
            BackendOutcome::ok("done"),
        ]);
        let desc = ComponentDescriptor::new("tool");

        let (result, attempts) = fast_controller().install_with_recovery(&backend, &desc);
        assert!(result.success);
        assert_eq!(attempts, 2);
        assert_eq!(backend.calls(), 2);
    }

    #[test]
    fn test_fatal_failure_no_retry() {
        let backend = ScriptedBackend::new(vec![BackendOutcome::failed(
            "insufficient_privileges",
            "need root",
        )]);
        let desc = ComponentDescriptor::new("tool");

        let (result, attempts) = fast_controller().install_with_recovery(&backend, &desc);
        assert!(!result.success);
        assert_eq!(attempts, 1);
        assert_eq!(backend.calls(), 1);
        assert_eq!(result.details.as_deref(), Some("insufficient_privileges"));
    }

    #[test]
    fn test_retries_bounded() {
        let backend = ScriptedBackend::new(vec![
            BackendOutcome::failed("network_timeout", "t1"),
            BackendOutcome::failed("network_timeout", "t2"),
            BackendOutcome::failed("network_timeout", "t3"),
            BackendOutcome::ok("never reached"),
        ]);
        let desc = ComponentDescriptor::new("tool");

        let (result, attempts) = fast_controller().install_with_recovery(&backend, &desc);
        assert!(!result.success);
        assert_eq!(attempts, 3);
        assert_eq!(backend.calls(), 3);
    }

    #[test]
    fn test_missing_error_kind_is_fatal() {
        let backend = ScriptedBackend::new(vec![BackendOutcome {
            success: false,
            error_kind: None,
            message: "mystery".to_string(),
        }]);
        let desc = ComponentDescriptor::new("tool");

        let (result, attempts) = fast_controller().install_with_recovery(&backend, &desc);
        assert!(!result.success);
        assert_eq!(attempts, 1);
    }
}
