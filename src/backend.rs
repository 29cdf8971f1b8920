// src/backend.rs

//! Shell-command installer backend
//!
//! Runs each component's declared `install_command` through the system
//! shell. Failures are mapped to the error kinds the recovery controller
//! classifies, so privilege problems stay fatal while flaky network installs
//! stay retryable.

use crate::component::{BackendOutcome, ComponentDescriptor, InstallerBackend};
use std::process::Command;
use tracing::{debug, info};

/// Installs components by running their declared shell command
#[derive(Debug, Default)]
pub struct CommandBackend {
    /// Log the command instead of running it
    pub dry_run: bool,
}

impl CommandBackend {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl InstallerBackend for CommandBackend {
    fn install(&self, descriptor: &ComponentDescriptor) -> BackendOutcome {
        let Some(command) = descriptor.install_command.as_deref() else {
            return BackendOutcome::failed(
                "no_install_command",
                format!("'{}' declares no install command", descriptor.name),
            );
        };

        if self.dry_run {
            info!("dry-run: would run `{}` for '{}'", command, descriptor.name);
            return BackendOutcome::ok(format!("dry-run: {command}"));
        }

        debug!("running `{}` for '{}'", command, descriptor.name);
        let output = match Command::new("sh").arg("-c").arg(command).output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return BackendOutcome::failed("insufficient_privileges", e.to_string());
            }
            Err(e) => {
                return BackendOutcome::failed("command_failed", e.to_string());
            }
        };

        if output.status.success() {
            BackendOutcome::ok(format!("'{}' installed via {}", descriptor.name, descriptor.install_method))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().last().unwrap_or("").trim();
            // Privilege failures usually surface on stderr rather than as a
            // spawn error, so scan for the common markers.
            let kind = if stderr.contains("Permission denied")
                || stderr.contains("permission denied")
                || stderr.contains("are you root?")
            {
                "insufficient_privileges"
            } else {
                "command_failed"
            };
            BackendOutcome::failed(
                kind,
                format!(
                    "`{}` exited with {}: {}",
                    command,
                    output.status.code().unwrap_or(-1),
                    detail
                ),
            )
        }
    }
}
