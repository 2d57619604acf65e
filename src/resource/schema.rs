//! Schema of the `google_sql_databases` data source
//!
//! Describes the attributes the host validates before a read, and documents
//! the output shape. Printed by `gcp-sql-databases --schema`.

use super::data_source::DATA_SOURCE_NAME;
use super::database::OUTPUT_FIELDS;
use serde::Serialize;

/// How an attribute is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    Computed,
}

/// Attribute value type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "element")]
pub enum AttributeType {
    String,
    List(Box<AttributeType>),
    Block(Vec<Attribute>),
}

/// One schema attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: AttributeType,
    pub presence: Presence,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType, presence: Presence, description: &'static str) -> Self {
        Self {
            name,
            kind,
            presence,
            description,
        }
    }

    fn string(name: &'static str, presence: Presence, description: &'static str) -> Self {
        Self::new(name, AttributeType::String, presence, description)
    }

    fn string_list(name: &'static str, presence: Presence, description: &'static str) -> Self {
        Self::new(
            name,
            AttributeType::List(Box::new(AttributeType::String)),
            presence,
            description,
        )
    }
}

/// Full data source schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSourceSchema {
    pub name: &'static str,
    pub attributes: Vec<Attribute>,
}

impl DataSourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

fn output_description(field: &str) -> &'static str {
    match field {
        "project" => "Project ID of the project that contains the instance.",
        "instance" => "The name of the Cloud SQL database instance in which the database belongs.",
        "name" => "The name of the database.",
        "charset" => "The charset value. Postgres databases only support a value of 'UTF8' at creation time.",
        "collation" => "The collation value. Postgres databases only support a value of 'en_US.UTF8' at creation time.",
        _ => "",
    }
}

/// Build the `google_sql_databases` schema
pub fn sql_databases_schema() -> DataSourceSchema {
    let filter_block = vec![
        Attribute::string("name", Presence::Required, "Name of the field: name, charset or collation."),
        Attribute::string_list("values", Presence::Optional, "Values for the field."),
        Attribute::string_list(
            "exclude_values",
            Presence::Optional,
            "The returned list would not include databases which match these values",
        ),
    ];

    let database_block = OUTPUT_FIELDS
        .iter()
        .map(|&field| Attribute::string(field, Presence::Computed, output_description(field)))
        .collect();

    DataSourceSchema {
        name: DATA_SOURCE_NAME,
        attributes: vec![
            Attribute::string(
                "project",
                Presence::Optional,
                "Project ID of the project that contains the instance.",
            ),
            Attribute::string(
                "instance",
                Presence::Required,
                "The name of the Cloud SQL database instance in which the database belongs.",
            ),
            Attribute::new(
                "filters",
                AttributeType::List(Box::new(AttributeType::Block(filter_block))),
                Presence::Optional,
                "",
            ),
            Attribute::new(
                "databases",
                AttributeType::List(Box::new(AttributeType::Block(database_block))),
                Presence::Computed,
                "",
            ),
        ],
    }
}
