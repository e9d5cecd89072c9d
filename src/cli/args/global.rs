//! Global CLI options shared across all commands
//!
//! This module provides a centralized struct for global CLI options, so
//! handlers take one argument instead of every connection flag.

use crate::cli::{Cli, OutputFormat};

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// Connection settings resolve as: CLI flag > `JAMF_*` environment variable >
/// config file > default. This struct captures the CLI layer; the rest is
/// resolved in `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.jamf-auditor/config.yaml)
    pub config: Option<String>,

    /// Jamf Pro base URL override
    pub url: Option<String>,

    /// Per-request timeout override, in seconds
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates
    pub insecure: bool,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            url: cli.url.clone(),
            timeout: cli.timeout,
            insecure: cli.insecure,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Get URL override as `Option<&str>`.
    pub fn url_ref(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
