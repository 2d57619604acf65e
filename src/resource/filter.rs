//! Database filter pipeline
//!
//! A read request carries zero or more filter blocks, each naming one field
//! with include (`values`) and exclude (`exclude_values`) regex sets. Blocks
//! are compiled once into a [`FilterPipeline`] and applied conjunctively:
//! a database survives only if every clause admits it.
//!
//! Within a clause the include set narrows (an empty include set is neutral)
//! and the exclude set always wins. Patterns match anywhere in the value.

use super::database::Database;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fields a filter block can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Name,
    Charset,
    Collation,
}

impl FilterField {
    /// All filterable fields
    pub const ALL: [FilterField; 3] = [FilterField::Name, FilterField::Charset, FilterField::Collation];

    /// Attribute name of the field
    pub fn as_str(self) -> &'static str {
        match self {
            FilterField::Name => "name",
            FilterField::Charset => "charset",
            FilterField::Collation => "collation",
        }
    }

    /// Value of this field on a database
    pub fn value_of(self, database: &Database) -> &str {
        match self {
            FilterField::Name => &database.name,
            FilterField::Charset => &database.charset,
            FilterField::Collation => &database.collation,
        }
    }
}

impl FromStr for FilterField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(FilterField::Name),
            "charset" => Ok(FilterField::Charset),
            "collation" => Ok(FilterField::Collation),
            other => Err(Error::UnknownFilterField(other.to_string())),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of one `filters` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterBlock {
    /// Field to filter on
    pub name: String,
    /// Include patterns
    #[serde(default, deserialize_with = "null_as_empty")]
    pub values: Vec<String>,
    /// Exclude patterns, higher priority than `values`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub exclude_values: Vec<String>,
}

/// An explicit `null` list reads as an empty one
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Filter blocks with `null` entries skipped
pub(crate) fn skip_null_blocks<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<FilterBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let blocks: Vec<Option<FilterBlock>> = null_as_empty(deserializer)?;
    Ok(blocks.into_iter().flatten().collect())
}

impl FilterBlock {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn values<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude_values<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_values = patterns.into_iter().map(Into::into).collect();
        self
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| Error::InvalidRegex {
                pattern: pattern.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// A compiled filter block
#[derive(Debug, Clone)]
pub struct FilterClause {
    pub field: FilterField,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl FilterClause {
    /// Compile a wire block, rejecting unknown fields and malformed patterns
    pub fn compile(block: &FilterBlock) -> Result<Self> {
        let field = block.name.parse()?;
        Ok(Self {
            field,
            include: compile_patterns(&block.values)?,
            exclude: compile_patterns(&block.exclude_values)?,
        })
    }

    /// Whether the clause lets `value` through
    pub fn matches(&self, value: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(value));
        // exclude has higher priority than include
        included && !self.exclude.iter().any(|re| re.is_match(value))
    }

    /// Whether the clause lets `database` through
    pub fn admits(&self, database: &Database) -> bool {
        self.matches(self.field.value_of(database))
    }
}

/// Ordered, conjunctive set of compiled clauses
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    clauses: Vec<FilterClause>,
}

impl FilterPipeline {
    /// Compile all blocks; the first bad block fails the whole pipeline
    pub fn compile(blocks: &[FilterBlock]) -> Result<Self> {
        let clauses = blocks
            .iter()
            .map(FilterClause::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// AND over clauses; stops at the first clause that rejects
    pub fn admits(&self, database: &Database) -> bool {
        self.clauses.iter().all(|clause| clause.admits(database))
    }

    /// Keep the databases every clause admits, in input order
    pub fn apply(&self, databases: Vec<Database>) -> Vec<Database> {
        if databases.is_empty() || self.clauses.is_empty() {
            return databases;
        }

        let total = databases.len();
        let kept: Vec<Database> = databases
            .into_iter()
            .filter(|database| self.admits(database))
            .collect();

        tracing::debug!(
            "Filters kept {} of {} databases ({} clauses)",
            kept.len(),
            total,
            self.clauses.len()
        );
        kept
    }
}

/// Compile `blocks` and apply them to `databases`
///
/// An empty list is returned as is: nothing is compiled, so blocks that
/// would not compile go unreported until there is something to filter.
pub fn apply_filters(databases: Vec<Database>, blocks: &[FilterBlock]) -> Result<Vec<Database>> {
    if databases.is_empty() {
        return Ok(databases);
    }
    Ok(FilterPipeline::compile(blocks)?.apply(databases))
}
