//! Configuration management for the auditor
//!
//! Settings are layered: optional YAML file, then `JAMF_*` environment
//! variables, then command-line flags.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::audit::DEFAULT_ARCHIVE_CATEGORY;
use crate::client::DEFAULT_CONCURRENCY;
use crate::client::auth::Credentials;
use crate::error::{ConfigError, Result};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Jamf Pro base URL (e.g. https://yourorg.jamfcloud.com)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// OAuth API client id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth API client secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Username for the password grant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password for the password grant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification (lab servers only)
    #[serde(default)]
    pub insecure: bool,

    /// Category that flagged objects are moved into
    #[serde(default = "default_archive_category")]
    pub archive_category: String,

    /// Width of the detail fetch worker pool
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Client-side request throttle
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_archive_category() -> String {
    DEFAULT_ARCHIVE_CATEGORY.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_requests_per_second() -> u32 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            client_id: None,
            client_secret: None,
            user: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            insecure: false,
            archive_category: default_archive_category(),
            concurrency: default_concurrency(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".jamf-auditor").join("config.yaml"))
    }

    /// Load configuration from an explicit path, or the default path if it exists.
    ///
    /// A missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(PathBuf::from(p)),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Overlay `JAMF_*` environment variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay `JAMF_*` variables using the given lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("JAMF_URL") {
            self.url = Some(v);
        }
        if let Some(v) = non_empty("JAMF_CLIENT_ID") {
            self.client_id = Some(v);
        }
        if let Some(v) = non_empty("JAMF_CLIENT_SECRET") {
            self.client_secret = Some(v);
        }
        if let Some(v) = non_empty("JAMF_USER") {
            self.user = Some(v);
        }
        if let Some(v) = non_empty("JAMF_PASSWORD") {
            self.password = Some(v);
        }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> Result<String> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUrl)?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(
                ConfigError::Invalid(format!("URL must start with http:// or https://: {url}"))
                    .into(),
            );
        }

        Ok(url.trim_end_matches('/').to_string())
    }

    /// Build the credential set, requiring at least one complete pair.
    pub fn credentials(&self) -> Result<Credentials> {
        let creds = Credentials::new(
            self.client_id.clone().zip(self.client_secret.clone()),
            self.user.clone().zip(self.password.clone()),
        );

        if creds.is_empty() {
            return Err(ConfigError::MissingCredentials.into());
        }
        Ok(creds)
    }

    /// Validate that required configuration is present
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        self.credentials()?;
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".to_string()).into());
        }
        if self.requests_per_second == 0 {
            return Err(
                ConfigError::Invalid("requests_per_second must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }
}
