//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod args;
pub mod audit;
pub mod context;
pub mod inspect;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// jamf-auditor - find unscoped and unused objects in Jamf Pro
#[derive(Parser, Debug)]
#[command(name = "jamf-auditor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "JAMF_AUDITOR_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "JAMF_AUDITOR_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Jamf Pro base URL (overrides JAMF_URL and the config file)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Enable debug logging
    #[arg(long, global = true, env = "JAMF_AUDITOR_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the cleanup audit and print the report
    Audit(AuditArgs),

    /// Explain how a single object is evaluated
    #[command(subcommand)]
    Inspect(InspectCommands),

    /// Display version information
    Version,
}

/// Options for the audit command
#[derive(Debug, Clone, Args, Default)]
pub struct AuditArgs {
    /// Also write the JSON report to this file
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Move unscoped policies/profiles and unused scripts/packages to the archive category
    #[arg(long)]
    pub move_to_archive: bool,

    /// Category to move archived objects into (default: z_Archive)
    #[arg(long, value_name = "NAME")]
    pub archive_category: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Inspect subcommands
#[derive(Subcommand, Debug)]
pub enum InspectCommands {
    /// Show scope, flags and references found for a policy
    Policy {
        /// Policy ID
        id: i64,
    },

    /// Show the parsed scope of a configuration profile
    Profile {
        /// Profile ID
        id: i64,
    },
}
