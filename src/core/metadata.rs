//! Entity column metadata and typed primary keys

use crate::core::field::{ColumnType, FieldValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One column of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,

    #[serde(rename = "type")]
    pub column_type: ColumnType,

    #[serde(default)]
    pub is_primary: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            is_primary: false,
        }
    }

    pub fn primary(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            is_primary: true,
        }
    }
}

/// A primary-key column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKey {
    pub name: String,

    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Column metadata of a resource, computed once at registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryOption {
    pub columns: Vec<Column>,

    #[serde(default)]
    pub primary_keys: Vec<PrimaryKey>,

    /// Relation names declared by the entity
    #[serde(default)]
    pub relations: Vec<String>,
}

impl FactoryOption {
    /// Build from columns, deriving the primary keys from `is_primary`
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let primary_keys = columns
            .iter()
            .filter(|column| column.is_primary)
            .map(|column| PrimaryKey {
                name: column.name.clone(),
                column_type: column.column_type,
            })
            .collect();

        Self {
            columns,
            primary_keys,
            relations: Vec::new(),
        }
    }

    pub fn with_relations(mut self, relations: Vec<String>) -> Self {
        self.relations = relations;
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn primary_key_names(&self) -> Vec<&str> {
        self.primary_keys.iter().map(|pk| pk.name.as_str()).collect()
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_keys.iter().any(|pk| pk.name == name)
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.iter().any(|relation| relation == name)
    }
}

/// A typed primary-key lookup value
///
/// Holds one entry per primary-key column, so composite keys are supported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Key(BTreeMap<String, FieldValue>);

impl Key {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, column: impl Into<String>, value: FieldValue) {
        self.0.insert(column.into(), value);
    }

    pub fn with(mut self, column: impl Into<String>, value: FieldValue) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.0.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object of the key columns
    pub fn to_json(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(column, value)| (column.clone(), value.to_json()))
            .collect()
    }

    /// Whether a JSON row carries exactly this key
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.0
            .iter()
            .all(|(column, value)| row.get(column) == Some(&value.to_json()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(column, value)| format!("{}={}", column, value.to_json()))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
