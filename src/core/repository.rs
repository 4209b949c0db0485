//! Persistence seam consumed by the execution layer

use crate::core::metadata::Key;
use crate::core::query::SortOrder;
use crate::core::search::SearchClause;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Options shared by single-row and multi-row lookups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Columns to return, empty for every column
    pub fields: Vec<String>,

    /// Include soft-deleted rows
    pub with_deleted: bool,

    /// Relations to load; `None` loads the entity's default relations
    pub relations: Option<Vec<String>>,
}

/// A multi-row lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindManyOptions {
    /// Clauses OR-ed together, empty for every row
    pub conditions: Vec<SearchClause>,
    pub order: Vec<SortOrder>,
    pub take: usize,
    pub skip: usize,
    pub find: FindOptions,
}

/// One page of rows plus the number of matching rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindManyResult {
    pub data: Vec<Value>,
    pub total: usize,
}

/// Repository trait for one resource
///
/// Implementations receive fully resolved parameters; the framework never
/// hands them unvalidated input. Rows are JSON objects keyed by column name.
#[async_trait]
pub trait CrudRepository: Send + Sync {
    /// Find a page of rows
    async fn find(&self, options: &FindManyOptions) -> Result<FindManyResult>;

    /// Find a row by primary key
    async fn find_one(&self, key: &Key, options: &FindOptions) -> Result<Option<Value>>;

    /// Insert a row (`key` is `None`) or overwrite the row with that key
    ///
    /// Returns the stored row, generated key included.
    async fn save(&self, key: Option<&Key>, entity: Map<String, Value>) -> Result<Value>;

    /// Mark a row as deleted, returns false when no live row matches
    async fn soft_delete(&self, key: &Key) -> Result<bool>;

    /// Remove a row, returns false when no row matches
    async fn delete(&self, key: &Key) -> Result<bool>;

    /// Clear the deleted mark, returns false when no deleted row matches
    async fn restore(&self, key: &Key) -> Result<bool>;
}
