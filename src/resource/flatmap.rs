//! Flat attribute encoding of state
//!
//! The orchestrator stores state as a flat string map: lists become
//! `<key>.#` plus `<key>.<index>.<field>` entries, maps carry a `%` count.
//! Verification compares data source and resource state in this form.

use super::data_source::SqlDatabasesState;
use super::database::{Database, DatabaseOutput, OUTPUT_FIELDS};
use std::collections::BTreeMap;
use thiserror::Error;

/// Flat attribute map of one resource instance
pub type Attributes = BTreeMap<String, String>;

/// Key of the database list length
pub const DATABASES_COUNT_KEY: &str = "databases.#";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlatmapError {
    #[error("Couldn't convert length of {key} list to integer: {value:?}")]
    InvalidCount { key: String, value: String },
}

fn push_list(attrs: &mut Attributes, prefix: &str, values: &[String]) {
    attrs.insert(format!("{}.#", prefix), values.len().to_string());
    for (i, value) in values.iter().enumerate() {
        attrs.insert(format!("{}.{}", prefix, i), value.clone());
    }
}

/// Flatten a data source state
pub fn flatten_state(state: &SqlDatabasesState) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("id".to_string(), state.id.clone());
    attrs.insert("instance".to_string(), state.instance.clone());
    if let Some(project) = &state.project {
        attrs.insert("project".to_string(), project.clone());
    }

    attrs.insert("filters.#".to_string(), state.filters.len().to_string());
    for (i, filter) in state.filters.iter().enumerate() {
        let prefix = format!("filters.{}", i);
        attrs.insert(format!("{}.name", prefix), filter.name.clone());
        push_list(&mut attrs, &format!("{}.values", prefix), &filter.values);
        push_list(&mut attrs, &format!("{}.exclude_values", prefix), &filter.exclude_values);
    }

    attrs.insert(DATABASES_COUNT_KEY.to_string(), state.databases.len().to_string());
    for (i, database) in state.databases.iter().enumerate() {
        for (key, value) in database.attributes() {
            attrs.insert(format!("databases.{}.{}", i, key), value);
        }
    }

    attrs
}

/// Number of entries in the flattened `databases` list
pub fn databases_count(attrs: &Attributes) -> Result<usize, FlatmapError> {
    let raw = attrs.get(DATABASES_COUNT_KEY).map(String::as_str).unwrap_or("");
    raw.parse().map_err(|_| FlatmapError::InvalidCount {
        key: "databases".to_string(),
        value: raw.to_string(),
    })
}

/// Rebuild the `databases` list from flattened data source state
pub fn unflatten_databases(attrs: &Attributes) -> Result<Vec<DatabaseOutput>, FlatmapError> {
    let count = databases_count(attrs)?;
    let databases = (0..count)
        .map(|i| {
            let mut output = DatabaseOutput::default();
            for key in OUTPUT_FIELDS {
                if let Some(value) = attrs.get(&format!("databases.{}.{}", i, key)) {
                    output.set_field(key, value.clone());
                }
            }
            output
        })
        .collect();
    Ok(databases)
}

/// Resource state of a `google_sql_database` created for `database`
pub fn database_resource_attributes(database: &Database, deletion_policy: &str) -> Attributes {
    let mut attrs: Attributes = DatabaseOutput::from(database).attributes();
    attrs.insert(
        "id".to_string(),
        format!(
            "projects/{}/instances/{}/databases/{}",
            database.project, database.instance, database.name
        ),
    );
    attrs.insert("deletion_policy".to_string(), deletion_policy.to_string());
    attrs
}
