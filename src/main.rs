// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use devforge::backend::CommandBackend;
use devforge::catalog::Catalog;
use devforge::cli::{Cli, Commands};
use devforge::decision::DecisionEngine;
use devforge::detect::DependencyDetector;
use devforge::orchestrator::{BatchOrchestrator, OrchestratorOptions, RetryPolicy};
use devforge::progress::{CliSink, LogSink, ProgressSink};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect { components, json } => {
            let catalog = Catalog::load(Path::new(&cli.catalog))?;
            let detector = DependencyDetector::with_default_strategies(&cli.registry);

            let names: Vec<String> = if components.is_empty() {
                catalog.names().to_vec()
            } else {
                components
            };

            let mut results = Vec::new();
            for name in &names {
                let descriptor = devforge::component::ConfigProvider::load(&catalog, name)?;
                results.push(detector.detect(&descriptor));
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for result in &results {
                    let version = result.version_found.as_deref().unwrap_or("-");
                    let method = result
                        .method
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<20} {:<20} {:<10} {}",
                        result.component, result.status, version, method
                    );
                }
            }
            Ok(())
        }

        Commands::Plan { components, json } => {
            let orchestrator = build_orchestrator(
                &cli.catalog,
                &cli.registry,
                OrchestratorOptions::default(),
                true,
                Arc::new(LogSink),
            )?;
            let plan = orchestrator.plan(&components)?;

            if json {
                let groups: Vec<_> = plan
                    .groups
                    .iter()
                    .map(|g| {
                        serde_json::json!({
                            "level": g.level,
                            "components": g.components,
                            "parallel": g.can_install_parallel,
                        })
                    })
                    .collect();
                let doc = serde_json::json!({
                    "order": plan.order,
                    "groups": groups,
                    "warnings": plan.warnings,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("Installation order: {}", plan.order.join(" -> "));
                for group in &plan.groups {
                    let mode = if group.can_install_parallel {
                        "parallel"
                    } else {
                        "sequential"
                    };
                    println!(
                        "  level {} ({}): {}",
                        group.level,
                        mode,
                        group.components.join(", ")
                    );
                }
                for warning in &plan.warnings {
                    println!("  warning: {warning}");
                }
            }
            Ok(())
        }

        Commands::Install {
            components,
            max_parallel,
            no_recovery,
            dry_run,
            json,
            quiet,
        } => {
            let options = OrchestratorOptions {
                max_parallel,
                enable_recovery: !no_recovery,
                retry: RetryPolicy::default(),
            };
            let sink: Arc<dyn ProgressSink> = if quiet || json {
                Arc::new(LogSink)
            } else {
                Arc::new(CliSink::new())
            };
            let orchestrator =
                build_orchestrator(&cli.catalog, &cli.registry, options, dry_run, sink)?;

            let result = orchestrator.install_multiple(&components)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.summary());
                for (name, failure) in &result.failed {
                    println!("  failed: {name}: {}", failure.message);
                }
                for (name, reason) in &result.skipped {
                    println!("  skipped: {name}: {reason}");
                }
            }

            if result.overall_success {
                Ok(())
            } else {
                std::process::exit(1);
            }
        }

        Commands::List => {
            let catalog = Catalog::load(Path::new(&cli.catalog))?;
            info!("catalog {} has {} components", cli.catalog, catalog.len());
            for name in catalog.names() {
                let descriptor = devforge::component::ConfigProvider::load(&catalog, name)?;
                let version = descriptor.version.as_deref().unwrap_or("-");
                println!(
                    "{:<20} {:<10} {}",
                    descriptor.name, version, descriptor.install_method
                );
            }
            Ok(())
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Wire the standard production object graph
fn build_orchestrator(
    catalog_path: &str,
    registry_path: &str,
    options: OrchestratorOptions,
    dry_run: bool,
    sink: Arc<dyn ProgressSink>,
) -> Result<BatchOrchestrator> {
    let catalog = Catalog::load(Path::new(catalog_path))?;
    let detector = DependencyDetector::with_default_strategies(registry_path);
    let engine = DecisionEngine::with_rules(catalog.rules().to_vec());
    let backend = Arc::new(CommandBackend::new(dry_run));

    Ok(
        BatchOrchestrator::new(Arc::new(catalog), detector, engine, backend)
            .with_options(options)
            .with_sink(sink),
    )
}
