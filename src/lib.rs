//! Cloud SQL databases data source
//!
//! Lists the databases of a Cloud SQL instance, narrows them with
//! include/exclude regex filters, and projects them into the declarative
//! `databases` list. The [`verify`] module reconciles that output against
//! resource state in acceptance scenarios.

pub mod config;
pub mod error;
pub mod gcp;
pub mod resource;
pub mod verify;

pub use error::{Error, Result};
