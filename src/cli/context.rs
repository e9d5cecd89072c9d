//! Command execution context
//!
//! Provides a unified context for command execution, eliminating boilerplate
//! for config loading, credential validation, and client initialization.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::{ClientOptions, JamfClient};
use crate::config::Config;
use crate::error::Result;

/// Context for command execution containing config, client, and runtime options.
pub struct CommandContext {
    /// Loaded and validated configuration
    pub config: Config,
    /// Jamf Pro client (Arc-wrapped for the fetch pool)
    pub client: Arc<JamfClient>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context with full initialization.
    ///
    /// This handles:
    /// - Loading config from path (or default location)
    /// - Overlaying `JAMF_*` environment variables, then CLI flags
    /// - Validating URL and credentials
    /// - Creating the API client
    ///
    /// No request is made here; the first API call authenticates.
    ///
    /// # Errors
    /// Returns error if config cannot be loaded or is incomplete.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = resolve_config(opts)?;

        let base_url = config.base_url()?;
        let client_options = ClientOptions {
            timeout: Duration::from_secs(config.timeout_secs),
            insecure: config.insecure,
            requests_per_second: config.requests_per_second,
        };
        debug!(
            "Connecting to {} (timeout {}s, {} req/s)",
            base_url, config.timeout_secs, config.requests_per_second
        );
        let client = Arc::new(JamfClient::new(
            &base_url,
            config.credentials()?,
            &client_options,
        )?);

        Ok(Self {
            config,
            client,
            format: opts.format,
        })
    }
}

/// Layer config file, environment and CLI flags, then validate.
fn resolve_config(opts: &GlobalOptions) -> Result<Config> {
    let mut config = Config::load_at(opts.config_ref())?;
    config.apply_env();

    if let Some(url) = opts.url_ref() {
        config.url = Some(url.to_string());
    }
    if let Some(timeout) = opts.timeout {
        config.timeout_secs = timeout;
    }
    if opts.insecure {
        config.insecure = true;
    }

    config.validate()?;
    Ok(config)
}
