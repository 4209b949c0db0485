//! In-memory implementation of CrudRepository for testing and development

use crate::core::field::{ColumnType, FieldValue};
use crate::core::metadata::{FactoryOption, Key};
use crate::core::query::SortDirection;
use crate::core::repository::{CrudRepository, FindManyOptions, FindManyResult, FindOptions};
use crate::core::search::{Condition, Operator, SearchClause};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::RegexBuilder;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredRow {
    data: Map<String, Value>,
    deleted_at: Option<DateTime<Utc>>,
}

impl StoredRow {
    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<StoredRow>,
    next_id: i64,
}

impl Table {
    fn position(&self, key: &Key) -> Option<usize> {
        self.rows.iter().position(|row| key.matches(&row.data))
    }

    /// Keep the integer sequence ahead of explicitly supplied keys
    fn observe(&mut self, row: &Map<String, Value>, factory: &FactoryOption) {
        for pk in &factory.primary_keys {
            if pk.column_type == ColumnType::Integer {
                if let Some(id) = row.get(&pk.name).and_then(Value::as_i64) {
                    self.next_id = self.next_id.max(id);
                }
            }
        }
    }
}

/// Cardinality of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Loaded as an object, or null when nothing matches
    One,
    /// Loaded as an array
    Many,
}

/// A relation joining this repository's rows to another repository's rows
#[derive(Clone)]
pub struct RelationDef {
    pub kind: RelationKind,
    /// Column of this repository's rows
    pub local_key: String,
    pub target: InMemoryRepository,
    /// Column of the target rows matched against `local_key`
    pub target_key: String,
    /// Loaded when the request does not name relations
    pub eager: bool,
}

impl RelationDef {
    pub fn one(
        local_key: impl Into<String>,
        target: InMemoryRepository,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::One,
            local_key: local_key.into(),
            target,
            target_key: target_key.into(),
            eager: false,
        }
    }

    pub fn many(
        local_key: impl Into<String>,
        target: InMemoryRepository,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::Many,
            ..Self::one(local_key, target, target_key)
        }
    }

    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }
}

/// In-memory repository
///
/// Rows live in a `Vec` guarded by a `RwLock`, in insertion order. Soft
/// deletion keeps the row and stamps it; it is hidden unless a lookup asks
/// for deleted rows. Clones share the same table.
///
/// Primary keys absent from an inserted row are generated: an increasing
/// sequence for integer columns and a v4 UUID for uuid and string columns.
#[derive(Clone)]
pub struct InMemoryRepository {
    factory: Arc<FactoryOption>,
    table: Arc<RwLock<Table>>,
    relations: IndexMap<String, RelationDef>,
}

impl InMemoryRepository {
    /// Create an empty repository for a resource
    pub fn new(factory: FactoryOption) -> Self {
        Self {
            factory: Arc::new(factory),
            table: Arc::new(RwLock::new(Table::default())),
            relations: IndexMap::new(),
        }
    }

    /// Declare how a relation of the resource is loaded
    pub fn with_relation(mut self, name: impl Into<String>, relation: RelationDef) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    /// Number of stored rows, soft-deleted ones included
    pub fn len(&self) -> Result<usize> {
        let table = self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(table.rows.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn generate_key(&self, table: &mut Table, entity: &Map<String, Value>) -> Result<Key> {
        let mut key = Key::new();
        for pk in &self.factory.primary_keys {
            let value = match (entity.get(&pk.name), pk.column_type) {
                (Some(value), column_type) if !value.is_null() => {
                    json_to_field(column_type, value).map_err(|e| anyhow!(e))?
                }
                (_, ColumnType::Integer) => {
                    table.next_id = table.next_id.checked_add(1).ok_or_else(|| {
                        anyhow!("No integer left to generate primary key '{}'", pk.name)
                    })?;
                    FieldValue::Integer(table.next_id)
                }
                (_, ColumnType::Uuid) => FieldValue::Uuid(Uuid::new_v4()),
                (_, ColumnType::String) => FieldValue::String(Uuid::new_v4().to_string()),
                (_, column_type) => {
                    return Err(anyhow!(
                        "Cannot generate a {} value for primary key '{}'",
                        column_type.as_str(),
                        pk.name
                    ));
                }
            };
            key.insert(pk.name.clone(), value);
        }
        Ok(key)
    }

    /// Snapshot of the live (or every) row matching `key`
    fn lookup(&self, key: &Key, with_deleted: bool) -> Result<Option<Map<String, Value>>> {
        let table = self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(table
            .rows
            .iter()
            .find(|row| key.matches(&row.data) && (with_deleted || row.is_live()))
            .map(|row| row.data.clone()))
    }

    /// Project a row and attach its relations
    ///
    /// Called without holding the table lock, relations may point back at
    /// this repository.
    fn present(&self, row: Map<String, Value>, options: &FindOptions) -> Result<Value> {
        let mut out = project(row.clone(), &options.fields, &self.factory);

        let names: Vec<&String> = match &options.relations {
            Some(names) => names.iter().collect(),
            None => self
                .relations
                .iter()
                .filter(|(_, relation)| relation.eager)
                .map(|(name, _)| name)
                .collect(),
        };

        for name in names {
            if let Some(relation) = self.relations.get(name) {
                out.insert(name.clone(), relation.load(&row)?);
            }
        }

        Ok(Value::Object(out))
    }
}

impl RelationDef {
    fn load(&self, row: &Map<String, Value>) -> Result<Value> {
        let local = row.get(&self.local_key).cloned().unwrap_or(Value::Null);
        if local.is_null() {
            return Ok(match self.kind {
                RelationKind::One => Value::Null,
                RelationKind::Many => Value::Array(Vec::new()),
            });
        }

        let table = self
            .target
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        let mut related = table
            .rows
            .iter()
            .filter(|target| {
                target.is_live() && target.data.get(&self.target_key).is_some_and(|v| json_eq(v, &local))
            })
            .map(|target| Value::Object(target.data.clone()));

        Ok(match self.kind {
            RelationKind::One => related.next().unwrap_or(Value::Null),
            RelationKind::Many => Value::Array(related.collect()),
        })
    }
}

#[async_trait]
impl CrudRepository for InMemoryRepository {
    async fn find(&self, options: &FindManyOptions) -> Result<FindManyResult> {
        let mut matched: Vec<Map<String, Value>> = {
            let table = self
                .table
                .read()
                .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

            table
                .rows
                .iter()
                .filter(|row| options.find.with_deleted || row.is_live())
                .filter(|row| matches_any(&row.data, &options.conditions))
                .map(|row| row.data.clone())
                .collect()
        };

        if !options.order.is_empty() {
            matched.sort_by(|a, b| {
                options
                    .order
                    .iter()
                    .map(|sort| {
                        let ordering = sort_cmp(
                            a.get(&sort.column).unwrap_or(&Value::Null),
                            b.get(&sort.column).unwrap_or(&Value::Null),
                        );
                        match sort.direction {
                            SortDirection::Asc => ordering,
                            SortDirection::Desc => ordering.reverse(),
                        }
                    })
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let total = matched.len();
        let data = matched
            .into_iter()
            .skip(options.skip)
            .take(options.take)
            .map(|row| self.present(row, &options.find))
            .collect::<Result<Vec<_>>>()?;

        Ok(FindManyResult { data, total })
    }

    async fn find_one(&self, key: &Key, options: &FindOptions) -> Result<Option<Value>> {
        match self.lookup(key, options.with_deleted)? {
            Some(row) => Ok(Some(self.present(row, options)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, key: Option<&Key>, mut entity: Map<String, Value>) -> Result<Value> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let key = match key {
            Some(key) => key.clone(),
            None => {
                let key = self.generate_key(&mut table, &entity)?;
                if table.position(&key).is_some() {
                    return Err(anyhow!("Duplicate primary key {}", key));
                }
                key
            }
        };
        entity.extend(key.to_json());
        table.observe(&entity, &self.factory);

        match table.position(&key) {
            Some(index) => table.rows[index].data = entity.clone(),
            None => table.rows.push(StoredRow {
                data: entity.clone(),
                deleted_at: None,
            }),
        }

        Ok(Value::Object(entity))
    }

    async fn soft_delete(&self, key: &Key) -> Result<bool> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        match table
            .rows
            .iter_mut()
            .find(|row| row.is_live() && key.matches(&row.data))
        {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &Key) -> Result<bool> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        match table.position(key) {
            Some(index) => {
                table.rows.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn restore(&self, key: &Key) -> Result<bool> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        match table
            .rows
            .iter_mut()
            .find(|row| !row.is_live() && key.matches(&row.data))
        {
            Some(row) => {
                row.deleted_at = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn json_to_field(column_type: ColumnType, value: &Value) -> Result<FieldValue, String> {
    match value {
        Value::String(raw) => column_type.parse_str(raw),
        other => column_type.parse_str(&other.to_string()),
    }
}

/// Keep the requested columns, primary keys always included
fn project(
    mut row: Map<String, Value>,
    fields: &[String],
    factory: &FactoryOption,
) -> Map<String, Value> {
    if fields.is_empty() {
        return row;
    }
    factory
        .column_names()
        .filter(|name| factory.is_primary_key(name) || fields.iter().any(|field| field == name))
        .filter_map(|name| row.remove(name).map(|value| (name.to_string(), value)))
        .collect()
}

fn matches_any(row: &Map<String, Value>, clauses: &[SearchClause]) -> bool {
    clauses.is_empty()
        || clauses.iter().any(|clause| {
            clause.iter().all(|(column, condition)| {
                matches_condition(row.get(column).unwrap_or(&Value::Null), condition)
            })
        })
}

fn matches_condition(value: &Value, condition: &Condition) -> bool {
    let operand = condition.operand.as_ref().unwrap_or(&Value::Null);
    let compared = |accept: fn(Ordering) -> bool| compare(value, operand).is_some_and(accept);

    let matched = match condition.operator {
        Operator::Equal => json_eq(value, operand),
        Operator::NotEqual => !value.is_null() && !json_eq(value, operand),
        Operator::GreaterThan => compared(Ordering::is_gt),
        Operator::GreaterThanOrEqual => compared(Ordering::is_ge),
        Operator::LessThan => compared(Ordering::is_lt),
        Operator::LessThanOrEqual => compared(Ordering::is_le),
        Operator::Like => like(value, operand, false),
        Operator::ILike => like(value, operand, true),
        Operator::Between => match operand.as_array().map(Vec::as_slice) {
            Some([low, high]) => {
                compare(value, low).is_some_and(Ordering::is_ge)
                    && compare(value, high).is_some_and(Ordering::is_le)
            }
            _ => false,
        },
        Operator::In => operand
            .as_array()
            .is_some_and(|items| items.iter().any(|item| json_eq(value, item))),
        Operator::Null => value.is_null(),
    };

    matched != condition.not
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order for sorting, nulls first
fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare(a, b).unwrap_or(Ordering::Equal),
    }
}

/// SQL `LIKE`: `%` matches any run of characters, `_` a single one
fn like(value: &Value, pattern: &Value, case_insensitive: bool) -> bool {
    let (Some(value), Some(pattern)) = (value.as_str(), pattern.as_str()) else {
        return false;
    };

    let mut source = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            c => source.push_str(&regex::escape(&c.to_string())),
        }
    }
    source.push('$');

    RegexBuilder::new(&source)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .is_ok_and(|re| re.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::Column;
    use crate::core::query::SortOrder;
    use serde_json::json;

    fn factory() -> FactoryOption {
        FactoryOption::from_columns(vec![
            Column::primary("id", ColumnType::Integer),
            Column::new("name", ColumnType::String),
            Column::new("age", ColumnType::Integer),
            Column::new("writerId", ColumnType::Integer),
        ])
        .with_relations(vec!["writer".to_string()])
    }

    fn entity(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn id(value: i64) -> Key {
        Key::new().with("id", FieldValue::Integer(value))
    }

    fn all() -> FindManyOptions {
        FindManyOptions {
            take: 100,
            ..Default::default()
        }
    }

    async fn seeded() -> InMemoryRepository {
        let repo = InMemoryRepository::new(factory());
        for (name, age) in [("alice", 30), ("bob", 25), ("carol", 35), ("Alan", 40)] {
            repo.save(None, entity(json!({ "name": name, "age": age })))
                .await
                .unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_save_generates_integer_keys() {
        let repo = InMemoryRepository::new(factory());
        let first = repo.save(None, entity(json!({ "name": "a" }))).await.unwrap();
        let second = repo.save(None, entity(json!({ "name": "b" }))).await.unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);

        repo.save(Some(&id(10)), entity(json!({ "name": "c" })))
            .await
            .unwrap();
        let next = repo.save(None, entity(json!({ "name": "d" }))).await.unwrap();
        assert_eq!(next["id"], 11);
        assert_eq!(repo.len().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_generated_key_after_max_integer() {
        let repo = InMemoryRepository::new(factory());
        repo.save(Some(&id(i64::MAX)), entity(json!({ "name": "last" })))
            .await
            .unwrap();

        let err = repo
            .save(None, entity(json!({ "name": "next" })))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("primary key 'id'"));

        let result = repo.find(&all()).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.data[0]["id"], i64::MAX);
    }

    #[tokio::test]
    async fn test_save_generates_uuid_keys() {
        let repo = InMemoryRepository::new(FactoryOption::from_columns(vec![
            Column::primary("uuid", ColumnType::Uuid),
            Column::new("name", ColumnType::String),
        ]));
        let row = repo.save(None, entity(json!({ "name": "a" }))).await.unwrap();
        assert!(Uuid::parse_str(row["uuid"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_save_overwrites_by_key() {
        let repo = seeded().await;
        repo.save(Some(&id(1)), entity(json!({ "name": "alicia", "age": 31 })))
            .await
            .unwrap();
        let row = repo
            .find_one(&id(1), &FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["name"], "alicia");
        assert_eq!(repo.len().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore() {
        let repo = seeded().await;
        assert!(repo.soft_delete(&id(2)).await.unwrap());
        assert!(!repo.soft_delete(&id(2)).await.unwrap());

        assert!(repo.find_one(&id(2), &FindOptions::default()).await.unwrap().is_none());
        let with_deleted = FindOptions {
            with_deleted: true,
            ..Default::default()
        };
        assert!(repo.find_one(&id(2), &with_deleted).await.unwrap().is_some());
        assert_eq!(repo.find(&all()).await.unwrap().total, 3);

        assert!(repo.restore(&id(2)).await.unwrap());
        assert!(!repo.restore(&id(2)).await.unwrap());
        assert!(repo.find_one(&id(2), &FindOptions::default()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let repo = seeded().await;
        assert!(repo.delete(&id(3)).await.unwrap());
        assert!(!repo.delete(&id(3)).await.unwrap());
        assert_eq!(repo.len().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_find_conditions() {
        let repo = seeded().await;
        let find = |clause: SearchClause| {
            let repo = repo.clone();
            async move {
                let result = repo
                    .find(&FindManyOptions {
                        conditions: vec![clause],
                        ..all()
                    })
                    .await
                    .unwrap();
                result
                    .data
                    .iter()
                    .map(|row| row["name"].as_str().unwrap_or_default().to_string())
                    .collect::<Vec<_>>()
            }
        };

        let mut clause = SearchClause::new();
        clause.insert("age".to_string(), Condition::new(Operator::GreaterThan, json!(30)));
        assert_eq!(find(clause).await, vec!["carol", "Alan"]);

        let mut clause = SearchClause::new();
        clause.insert("name".to_string(), Condition::new(Operator::ILike, json!("al%")));
        assert_eq!(find(clause).await, vec!["alice", "Alan"]);

        let mut clause = SearchClause::new();
        clause.insert("name".to_string(), Condition::new(Operator::Like, json!("al%")));
        assert_eq!(find(clause).await, vec!["alice"]);

        let mut clause = SearchClause::new();
        clause.insert(
            "age".to_string(),
            Condition::new(Operator::Between, json!([25, 30])),
        );
        assert_eq!(find(clause).await, vec!["alice", "bob"]);

        let mut clause = SearchClause::new();
        clause.insert(
            "name".to_string(),
            Condition::new(Operator::In, json!(["bob", "carol"])).negate(),
        );
        assert_eq!(find(clause).await, vec!["alice", "Alan"]);

        let mut clause = SearchClause::new();
        clause.insert("writerId".to_string(), Condition::is_null());
        assert_eq!(find(clause).await.len(), 4);
    }

    #[tokio::test]
    async fn test_find_clauses_are_or_ed() {
        let repo = seeded().await;
        let mut first = SearchClause::new();
        first.insert("name".to_string(), Condition::eq(json!("bob")));
        let mut second = SearchClause::new();
        second.insert("age".to_string(), Condition::new(Operator::GreaterThanOrEqual, json!(40)));

        let result = repo
            .find(&FindManyOptions {
                conditions: vec![first, second],
                ..all()
            })
            .await
            .unwrap();
        assert_eq!(result.total, 2);
    }

    #[tokio::test]
    async fn test_find_order_and_paging() {
        let repo = seeded().await;
        let result = repo
            .find(&FindManyOptions {
                order: vec![SortOrder::desc("age")],
                take: 2,
                skip: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.total, 4);
        let names: Vec<&str> = result.data.iter().filter_map(|r| r["name"].as_str()).collect();
        assert_eq!(names, vec!["carol", "alice"]);
    }

    #[tokio::test]
    async fn test_projection_keeps_primary_key() {
        let repo = seeded().await;
        let row = repo
            .find_one(
                &id(1),
                &FindOptions {
                    fields: vec!["name".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row, json!({ "id": 1, "name": "alice" }));
    }

    #[tokio::test]
    async fn test_relations() {
        let writers = InMemoryRepository::new(FactoryOption::from_columns(vec![
            Column::primary("id", ColumnType::Integer),
            Column::new("name", ColumnType::String),
        ]));
        writers
            .save(None, entity(json!({ "name": "writer" })))
            .await
            .unwrap();

        let repo = InMemoryRepository::new(factory())
            .with_relation("writer", RelationDef::one("writerId", writers, "id").eager());
        repo.save(None, entity(json!({ "name": "a", "writerId": 1 })))
            .await
            .unwrap();

        let eager = repo
            .find_one(&id(1), &FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(eager["writer"]["name"], "writer");

        let none = repo
            .find_one(
                &id(1),
                &FindOptions {
                    relations: Some(Vec::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(none.get("writer").is_none());
    }

    #[test]
    fn test_like_escapes_regex() {
        assert!(like(&json!("a.b"), &json!("a.b"), false));
        assert!(!like(&json!("axb"), &json!("a.b"), false));
        assert!(like(&json!("axb"), &json!("a_b"), false));
    }
}
