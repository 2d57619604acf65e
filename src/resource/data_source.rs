//! `google_sql_databases` data source read
//!
//! Fetch → filter → project, then assign the synthetic id. A missing
//! instance yields [`ReadOutcome::Missing`] so the host can drop the data
//! source instead of failing the run.

use super::database::DatabaseOutput;
use super::fetcher::fetch_databases;
use super::filter::{apply_filters, skip_null_blocks, FilterBlock};
use super::projector::project;
use crate::error::{Error, Result};
use crate::gcp::client::GcpClient;
use serde::{Deserialize, Serialize};

/// Data source type name
pub const DATA_SOURCE_NAME: &str = "google_sql_databases";

/// Fixed last segment of the data source id
pub const ID_SUFFIX: &str = "101";

/// Configuration of one data source read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest {
    /// Project containing the instance; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Cloud SQL instance name
    #[serde(default)]
    pub instance: String,
    #[serde(
        default,
        deserialize_with = "skip_null_blocks",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub filters: Vec<FilterBlock>,
}

impl ReadRequest {
    pub fn new(instance: &str) -> Self {
        Self {
            instance: instance.to_string(),
            ..Self::default()
        }
    }

    pub fn project(mut self, project: &str) -> Self {
        self.project = Some(project.to_string());
        self
    }

    pub fn filter(mut self, block: FilterBlock) -> Self {
        self.filters.push(block);
        self
    }

    /// Request project, else the provider default
    pub fn resolve_project(&self, default_project: Option<&str>) -> Result<String> {
        self.project
            .as_deref()
            .or(default_project)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .ok_or(Error::MissingProject)
    }
}

/// State written back for the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlDatabasesState {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub instance: String,
    #[serde(default)]
    pub filters: Vec<FilterBlock>,
    pub databases: Vec<DatabaseOutput>,
}

/// Outcome of a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Found(SqlDatabasesState),
    /// The instance or its database collection is gone
    Missing,
}

impl ReadOutcome {
    pub fn state(&self) -> Option<&SqlDatabasesState> {
        match self {
            ReadOutcome::Found(state) => Some(state),
            ReadOutcome::Missing => None,
        }
    }

    pub fn into_state(self) -> Option<SqlDatabasesState> {
        match self {
            ReadOutcome::Found(state) => Some(state),
            ReadOutcome::Missing => None,
        }
    }
}

/// Synthetic id of the data source for one instance
pub fn data_source_id(project: &str, instance: &str) -> String {
    format!("projects/{}/instances/{}/{}", project, instance, ID_SUFFIX)
}

/// Read the databases of `request.instance`
///
/// Filters are compiled once the databases are listed. An instance with no
/// databases reads as an empty list whatever the filters say.
pub async fn read_databases(
    client: &GcpClient,
    default_project: Option<&str>,
    request: &ReadRequest,
) -> Result<ReadOutcome> {
    let project_id = request.resolve_project(default_project)?;

    let databases = match fetch_databases(client, &project_id, &request.instance).await {
        Ok(databases) => databases,
        Err(Error::NotFound(_)) => {
            tracing::warn!(
                "Removing Databases in {:?} instance because it's gone",
                request.instance
            );
            return Ok(ReadOutcome::Missing);
        },
        Err(e) => return Err(e),
    };

    let databases = apply_filters(databases, &request.filters)?;
    let outputs = project(&databases);

    tracing::info!(
        "Read {} databases from instance {} in project {}",
        outputs.len(),
        request.instance,
        project_id
    );

    Ok(ReadOutcome::Found(SqlDatabasesState {
        id: data_source_id(&project_id, &request.instance),
        project: request.project.clone(),
        instance: request.instance.clone(),
        filters: request.filters.clone(),
        databases: outputs,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_id_shape() {
        assert_eq!(
            data_source_id("my-project", "main"),
            "projects/my-project/instances/main/101"
        );
    }

    #[test]
    fn test_resolve_project_prefers_request() {
        let request = ReadRequest::new("main").project("request-project");
        assert_eq!(
            request.resolve_project(Some("default-project")).unwrap(),
            "request-project"
        );
    }

    #[test]
    fn test_resolve_project_falls_back_to_default() {
        let request = ReadRequest::new("main");
        assert_eq!(
            request.resolve_project(Some("default-project")).unwrap(),
            "default-project"
        );
        assert!(matches!(
            request.resolve_project(None),
            Err(Error::MissingProject)
        ));
    }

    #[test]
    fn test_request_wire_shape() {
        let request: ReadRequest = serde_json::from_str(
            r#"{
                "instance": "main",
                "filters": [
                    {"name": "name", "values": [".*[0-9]"], "exclude_values": [".*2"]},
                    {"name": "charset"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(request.project, None);
        assert_eq!(request.filters.len(), 2);
        assert_eq!(request.filters[0].exclude_values, vec![".*2"]);
        assert!(request.filters[1].values.is_empty());
    }

    #[test]
    fn test_request_skips_null_filter_blocks() {
        let request: ReadRequest = serde_yaml::from_str(
            "instance: main\nfilters:\n  - null\n  - name: name\n    values: null\n    exclude_values: ['.*2']\n",
        )
        .unwrap();

        assert_eq!(
            request.filters,
            vec![FilterBlock::new("name").exclude_values([".*2"])]
        );

        let request: ReadRequest =
            serde_json::from_str(r#"{"instance": "main", "filters": null}"#).unwrap();
        assert!(request.filters.is_empty());
    }
}
