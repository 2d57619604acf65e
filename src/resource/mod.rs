//! Resource layer for the `google_sql_databases` data source
//!
//! # Architecture
//!
//! - [`database`] - API records and the output shape
//! - [`fetcher`] - Lists an instance's databases with pagination and retry
//! - [`filter`] - Compiles and applies include/exclude regex filters
//! - [`projector`] - Maps surviving databases to output entries
//! - [`data_source`] - The read operation tying the above together
//! - [`flatmap`] - Flat attribute encoding of state
//! - [`schema`] - Attribute schema of the data source
//!
//! # Example
//!
//! ```ignore
//! use gcp_sql_datasource::resource::{read_databases, FilterBlock, ReadRequest};
//!
//! async fn list_prod(client: &GcpClient) -> gcp_sql_datasource::Result<ReadOutcome> {
//!     let request = ReadRequest::new("main")
//!         .filter(FilterBlock::new("name").values(["^prod-"]).exclude_values(["-tmp$"]));
//!     read_databases(client, Some("my-project"), &request).await
//! }
//! ```

pub mod data_source;
pub mod database;
pub mod fetcher;
pub mod filter;
pub mod flatmap;
pub mod projector;
pub mod schema;

pub use data_source::{
    data_source_id, read_databases, ReadOutcome, ReadRequest, SqlDatabasesState, DATA_SOURCE_NAME,
};
pub use database::{Database, DatabaseOutput};
pub use fetcher::fetch_databases;
pub use filter::{apply_filters, FilterBlock, FilterClause, FilterField, FilterPipeline};
pub use projector::project;
