//! GCP Client
//!
//! Main client for the Cloud SQL Admin API, combining authentication
//! and HTTP functionality.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use super::retry::RetryPolicy;
use crate::config::Config;
use crate::error::{Error, Result};
use serde_json::Value;
use url::Url;

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    /// SQL Admin API base, ending in a slash
    pub sql_endpoint: Url,
    /// Retry policy applied to reads
    pub retry: RetryPolicy,
}

impl GcpClient {
    /// Create a client from provider configuration
    ///
    /// A configured `access_token` is used verbatim; otherwise Application
    /// Default Credentials are discovered.
    pub async fn new(config: &Config) -> Result<Self> {
        let credentials = match config.access_token.as_deref() {
            Some(token) if !token.is_empty() => GcpCredentials::from_access_token(token),
            _ => GcpCredentials::application_default().await?,
        };

        Self::with_credentials(config, credentials)
    }

    /// Create a client with explicit credentials
    pub fn with_credentials(config: &Config, credentials: GcpCredentials) -> Result<Self> {
        Ok(Self {
            credentials,
            http: GcpHttpClient::new(&config.user_agent, config.read_timeout())?,
            sql_endpoint: config.sql_endpoint()?,
            retry: RetryPolicy::with_timeout(config.read_timeout()),
        })
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    // =========================================================================
    // Cloud SQL Admin API helpers
    // =========================================================================

    /// Build a SQL Admin API URL relative to the configured endpoint
    pub fn sql_url(&self, path: &str) -> Result<Url> {
        self.sql_endpoint
            .join(path)
            .map_err(|e| Error::Config(format!("invalid SQL Admin path {:?}: {}", path, e)))
    }

    /// Build the databases collection URL of an instance
    pub fn sql_databases_url(&self, project: &str, instance: &str) -> Result<Url> {
        self.sql_url(&format!(
            "projects/{}/instances/{}/databases",
            urlencoding::encode(project),
            urlencoding::encode(instance)
        ))
    }
}
