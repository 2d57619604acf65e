//! Projection of fetched databases into the data source output shape

use super::database::{Database, DatabaseOutput};

/// Map databases to output entries, one-to-one and in order
///
/// Always returns a list; no databases means an empty list, never a missing value.
pub fn project(databases: &[Database]) -> Vec<DatabaseOutput> {
    databases.iter().map(DatabaseOutput::from).collect()
}
