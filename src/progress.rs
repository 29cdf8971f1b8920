// src/progress.rs

//! Progress sinks for installation lifecycle events
//!
//! The orchestrator emits ordered lifecycle events through a `ProgressSink`.
//! Sinks are purely observational: nothing they return is consumed.
//! Implementations cover the usual output modes:
//! - `CliSink`: visual progress using indicatif
//! - `LogSink`: events logged via tracing
//! - `CallbackSink`: user-provided function (GUI integration)
//! - `SilentSink`: no-op for scripted/quiet modes

use crate::orchestrator::{BatchInstallationResult, InstallationResult};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

/// Ordered lifecycle events for one batch run
#[derive(Debug, Clone)]
pub enum InstallEvent {
    /// Detection and planning started for the requested components
    PlanningStarted { components: Vec<String> },
    /// A dependency level is about to execute
    LevelStarted { level: usize, components: Vec<String> },
    /// One component's installation attempt started
    ComponentStarted { component: String },
    /// One component reached a terminal state
    ComponentFinished {
        component: String,
        result: InstallationResult,
    },
    /// The batch run terminated
    BatchFinished { result: BatchInstallationResult },
}

/// Receives lifecycle events; must tolerate calls from worker threads
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &InstallEvent);
}

/// No-op sink for quiet or scripted usage
#[derive(Debug, Default)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn emit(&self, _event: &InstallEvent) {}
}

/// Logs every event via tracing at info level
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: &InstallEvent) {
        match event {
            InstallEvent::PlanningStarted { components } => {
                info!("planning installation of {} components", components.len());
            }
            InstallEvent::LevelStarted { level, components } => {
                info!("level {}: {}", level, components.join(", "));
            }
            InstallEvent::ComponentStarted { component } => {
                info!("installing '{}'", component);
            }
            InstallEvent::ComponentFinished { component, result } => {
                if result.success {
                    info!("'{}' installed: {}", component, result.message);
                } else {
                    info!("'{}' {:?}: {}", component, result.status, result.message);
                }
            }
            InstallEvent::BatchFinished { result } => {
                info!("batch finished: {}", result.summary());
            }
        }
    }
}

/// Calls a user-provided function for each event
pub struct CallbackSink<F>
where
    F: Fn(&InstallEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: Fn(&InstallEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressSink for CallbackSink<F>
where
    F: Fn(&InstallEvent) + Send + Sync,
{
    fn emit(&self, event: &InstallEvent) {
        (self.callback)(event);
    }
}

/// Interactive progress bars for terminal use
pub struct CliSink {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl CliSink {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for CliSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for CliSink {
    fn emit(&self, event: &InstallEvent) {
        match event {
            InstallEvent::PlanningStarted { components } => {
                self.multi
                    .println(format!("Planning {} components...", components.len()))
                    .ok();
            }
            InstallEvent::LevelStarted { level, components } => {
                self.multi
                    .println(format!(
                        "Level {} ({} components)",
                        level,
                        components.len()
                    ))
                    .ok();
            }
            InstallEvent::ComponentStarted { component } => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::spinner_style());
                bar.set_message(format!("installing {component}"));
                if let Ok(mut bars) = self.bars.lock() {
                    bars.insert(component.clone(), bar);
                }
            }
            InstallEvent::ComponentFinished { component, result } => {
                let bar = self
                    .bars
                    .lock()
                    .ok()
                    .and_then(|mut bars| bars.remove(component));
                if let Some(bar) = bar {
                    if result.success {
                        bar.finish_with_message(format!("{component}: done"));
                    } else {
                        bar.abandon_with_message(format!(
                            "{component}: {}",
                            result.message
                        ));
                    }
                }
            }
            InstallEvent::BatchFinished { result } => {
                self.multi.println(result.summary()).ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_callback_sink_receives_ordered_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = events.clone();
        let sink = CallbackSink::new(move |event: &InstallEvent| {
            let tag = match event {
                InstallEvent::PlanningStarted { .. } => "planning",
                InstallEvent::LevelStarted { .. } => "level",
                InstallEvent::ComponentStarted { .. } => "started",
                InstallEvent::ComponentFinished { .. } => "finished",
                InstallEvent::BatchFinished { .. } => "batch",
            };
            captured.lock().unwrap().push(tag);
        });

        sink.emit(&InstallEvent::PlanningStarted { components: vec![] });
        sink.emit(&InstallEvent::LevelStarted {
            level: 0,
            components: vec!["a".to_string()],
        });
        sink.emit(&InstallEvent::ComponentStarted {
            component: "a".to_string(),
        });
        sink.emit(&InstallEvent::ComponentFinished {
            component: "a".to_string(),
            result: InstallationResult::installed("a", "ok"),
        });

        assert_eq!(
            *events.lock().unwrap(),
            vec!["planning", "level", "started", "finished"]
        );
    }

    #[test]
    fn test_silent_sink_is_noop() {
        // Just exercising the path; nothing observable
        SilentSink.emit(&InstallEvent::ComponentStarted {
            component: "x".to_string(),
        });
    }
}
