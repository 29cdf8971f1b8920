// src/cli.rs
//! CLI definitions for the devforge orchestrator
//!
//! This module contains all command-line interface definitions using clap.
//! The command implementations live in `main.rs`.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "devforge")]
#[command(version)]
#[command(about = "Installation orchestrator for development environment components", long_about = None)]
pub struct Cli {
    /// Path to the component catalog
    #[arg(short, long, default_value = "devforge.toml", global = true)]
    pub catalog: String,

    /// Path to the local installation registry
    #[arg(long, default_value = "/var/lib/devforge/installed.toml", global = true)]
    pub registry: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect whether components are already installed
    Detect {
        /// Component names (all catalog components when omitted)
        components: Vec<String>,

        /// Emit results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the installation plan without executing it
    Plan {
        /// Component names to plan for
        #[arg(required = true)]
        components: Vec<String>,

        /// Emit the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Install components with dependency ordering and parallel execution
    Install {
        /// Component names to install
        #[arg(required = true)]
        components: Vec<String>,

        /// Maximum concurrent installations
        #[arg(long, default_value_t = 4)]
        max_parallel: usize,

        /// Disable retry on transient failures
        #[arg(long)]
        no_recovery: bool,

        /// Show what would run without executing install commands
        #[arg(long)]
        dry_run: bool,

        /// Emit the batch result as JSON
        #[arg(long)]
        json: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the components declared in the catalog
    List,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
