//! Configuration Management
//!
//! Provider-level configuration: default project, credentials override,
//! endpoint override and read timeout. Loaded once by the binary and passed
//! explicitly to the client.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default SQL Admin API base URL
pub const DEFAULT_SQL_ENDPOINT: &str = "https://sqladmin.googleapis.com/sql/v1beta4/";

/// Default read timeout (20 minutes)
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 20 * 60;

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default project used when a read request does not name one
    #[serde(default)]
    pub project: Option<String>,
    /// Static OAuth2 access token; Application Default Credentials are used when unset
    #[serde(default)]
    pub access_token: Option<String>,
    /// Override for the SQL Admin API base URL
    #[serde(default)]
    pub sql_custom_endpoint: Option<String>,
    /// Upper bound on a read, retries included
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("gcp-sql-datasource/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: None,
            access_token: None,
            sql_custom_endpoint: None,
            read_timeout_secs: default_read_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcp-sql-datasource").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get effective project (config > gcloud default)
    pub fn effective_project(&self) -> Option<String> {
        self.project
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(crate::gcp::auth::get_default_project)
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Resolved SQL Admin base URL, always ending in a slash so relative joins append
    pub fn sql_endpoint(&self) -> Result<Url> {
        let raw = self
            .sql_custom_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_SQL_ENDPOINT);

        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };

        Url::parse(&normalized)
            .map_err(|e| Error::Config(format!("sql_custom_endpoint {:?}: {}", raw, e)))
    }
}
