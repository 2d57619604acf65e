//! GCP API interaction module
//!
//! This module provides the plumbing for talking to the Cloud SQL Admin API:
//! authentication, the HTTP client, and the retry policy around reads.
//!
//! # Module Structure
//!
//! - [`auth`] - Access tokens and default project resolution
//! - [`client`] - Main GCP client and SQL Admin URL builders
//! - [`http`] - HTTP utilities and error classification
//! - [`retry`] - Bounded retry of transient conditions
//!
//! # Example
//!
//! ```ignore
//! use gcp_sql_datasource::config::Config;
//! use gcp_sql_datasource::gcp::client::GcpClient;
//!
//! async fn example() -> gcp_sql_datasource::Result<()> {
//!     let client = GcpClient::new(&Config::load()).await?;
//!     let url = client.sql_databases_url("my-project", "main")?;
//!     let databases = client.get(url.as_str()).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod retry;
