//! Database records
//!
//! [`Database`] is one entry of the SQL Admin `databases.list` response.
//! [`DatabaseOutput`] is the shape exposed by the data source.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SQL Server specific database details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerDatabaseDetails {
    #[serde(default)]
    pub compatibility_level: Option<i64>,
    #[serde(default)]
    pub recovery_model: Option<String>,
}

/// A database as returned by the SQL Admin API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub charset: String,
    #[serde(default)]
    pub collation: String,
    #[serde(default)]
    pub self_link: String,
    #[serde(default)]
    pub etag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlserver_database_details: Option<SqlServerDatabaseDetails>,
}

/// Page of the `databases.list` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabasesListResponse {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<Database>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Field names of [`DatabaseOutput`], in schema order
pub const OUTPUT_FIELDS: &[&str] = &[
    "project",
    "instance",
    "name",
    "charset",
    "collation",
    "self_link",
];

/// One element of the data source's `databases` list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseOutput {
    pub project: String,
    pub instance: String,
    pub name: String,
    pub charset: String,
    pub collation: String,
    pub self_link: String,
}

impl DatabaseOutput {
    /// Look up a field by its attribute name
    pub fn field(&self, key: &str) -> Option<&str> {
        let value = match key {
            "project" => &self.project,
            "instance" => &self.instance,
            "name" => &self.name,
            "charset" => &self.charset,
            "collation" => &self.collation,
            "self_link" => &self.self_link,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Set a field by its attribute name; returns false for unknown keys
    pub fn set_field(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "project" => &mut self.project,
            "instance" => &mut self.instance,
            "name" => &mut self.name,
            "charset" => &mut self.charset,
            "collation" => &mut self.collation,
            "self_link" => &mut self.self_link,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Flat attribute map of this entry
    pub fn attributes(&self) -> BTreeMap<String, String> {
        OUTPUT_FIELDS
            .iter()
            .filter_map(|key| self.field(key).map(|v| (key.to_string(), v.to_string())))
            .collect()
    }
}

impl From<&Database> for DatabaseOutput {
    fn from(database: &Database) -> Self {
        Self {
            project: database.project.clone(),
            instance: database.instance.clone(),
            name: database.name.clone(),
            charset: database.charset.clone(),
            collation: database.collation.clone(),
            self_link: database.self_link.clone(),
        }
    }
}
