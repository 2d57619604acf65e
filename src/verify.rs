//! State reconciliation checks
//!
//! Used by acceptance scenarios to prove the data source output mirrors the
//! databases that were created: every expected database is present and
//! field-for-field equal, and databases a filter should drop are absent.

use crate::resource::database::DatabaseOutput;
use crate::resource::flatmap::{unflatten_databases, Attributes, FlatmapError};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Count marker of a flattened map
const MAP_COUNT_MARKER: &str = "%";

/// One differing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: String,
    pub actual: String,
    pub expected: String,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is {}; want {}", self.field, self.actual, self.expected)
    }
}

/// All mismatches of one comparison, one per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatches(pub Vec<FieldMismatch>);

impl fmt::Display for Mismatches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mismatch in &self.0 {
            writeln!(f, "{}", mismatch)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerifyError {
    #[error("can't find {0} in state")]
    MissingResource(String),

    #[error("The newly created database {0:?} is not found in the data source")]
    NotInDataSource(String),

    #[error("The database {0:?} is present in the data source even after the filter was applied")]
    PresentAfterFilter(String),

    #[error("{0}")]
    Mismatch(Mismatches),

    #[error(transparent)]
    InvalidCount(#[from] FlatmapError),
}

/// Position of the entry named `name`
pub fn verify_presence(output: &[DatabaseOutput], name: &str) -> Result<usize, VerifyError> {
    output
        .iter()
        .position(|entry| entry.name == name)
        .ok_or_else(|| VerifyError::NotInDataSource(name.to_string()))
}

/// Assert no entry is named `name`
pub fn verify_absence(output: &[DatabaseOutput], name: &str) -> Result<(), VerifyError> {
    if output.iter().any(|entry| entry.name == name) {
        return Err(VerifyError::PresentAfterFilter(name.to_string()));
    }
    Ok(())
}

/// Both sides of a `#` count that mean "no elements"
fn is_empty_count(value: &str) -> bool {
    value.is_empty() || value == "0"
}

/// Compare an output entry against expected resource attributes
///
/// Every expected attribute except `ignored` and the `%` marker must match.
/// Absent output fields compare as the empty string. A `#`-suffixed key
/// matches when both sides are empty or zero (empty list vs null list).
pub fn verify_fields_match(
    entry: &DatabaseOutput,
    expected: &Attributes,
    ignored: &HashSet<&str>,
) -> Result<(), VerifyError> {
    let mismatches: Vec<FieldMismatch> = expected
        .iter()
        .filter(|(key, _)| key.as_str() != MAP_COUNT_MARKER && !ignored.contains(key.as_str()))
        .filter_map(|(key, want)| {
            let actual = entry.field(key).unwrap_or("");
            if actual == want.as_str() {
                return None;
            }
            if key.ends_with('#') && is_empty_count(actual) && is_empty_count(want) {
                return None;
            }
            Some(FieldMismatch {
                field: key.clone(),
                actual: actual.to_string(),
                expected: want.clone(),
            })
        })
        .collect();

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(VerifyError::Mismatch(Mismatches(mismatches)))
    }
}

/// Flattened state of every resource, keyed by address
/// (e.g. `data.google_sql_databases.qa`, `google_sql_database.db1`)
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    resources: BTreeMap<String, Attributes>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: &str, attributes: Attributes) {
        self.resources.insert(address.to_string(), attributes);
    }

    pub fn resource(&self, address: &str) -> Result<&Attributes, VerifyError> {
        self.resources
            .get(address)
            .ok_or_else(|| VerifyError::MissingResource(address.to_string()))
    }
}

fn expected_name(attrs: &Attributes) -> &str {
    attrs.get("name").map(String::as_str).unwrap_or("")
}

fn check_present_and_matching(
    databases: &[DatabaseOutput],
    expected: &Attributes,
    ignored: &HashSet<&str>,
) -> Result<(), VerifyError> {
    let index = verify_presence(databases, expected_name(expected))?;
    verify_fields_match(&databases[index], expected, ignored)
}

/// Every listed resource appears in the data source with matching fields
pub fn check_data_source_matches_resources(
    state: &StateSnapshot,
    data_source: &str,
    resources: &[&str],
    ignored: &HashSet<&str>,
) -> Result<(), VerifyError> {
    let ds_attrs = state.resource(data_source)?;
    let expected = resources
        .iter()
        .map(|address| state.resource(address))
        .collect::<Result<Vec<_>, _>>()?;

    let databases = unflatten_databases(ds_attrs)?;
    for attrs in expected {
        check_present_and_matching(&databases, attrs, ignored)?;
    }
    Ok(())
}

/// `excluded` is absent from the data source and `included` matches
pub fn check_filter_applied(
    state: &StateSnapshot,
    data_source: &str,
    excluded: &str,
    included: &str,
    ignored: &HashSet<&str>,
) -> Result<(), VerifyError> {
    let ds_attrs = state.resource(data_source)?;
    let excluded_attrs = state.resource(excluded)?;
    let included_attrs = state.resource(included)?;

    let databases = unflatten_databases(ds_attrs)?;
    verify_absence(&databases, expected_name(excluded_attrs))?;
    check_present_and_matching(&databases, included_attrs, ignored)
}
