//! Query string decoding, sorting and pagination utilities

use serde::{Deserialize, Serialize};
use serde_json::Value;
use indexmap::IndexMap;

/// A decoded query string value
///
/// Keys follow the usual bracket conventions:
///
/// ```text
/// fields=name                  -> String("name")
/// fields=name&fields=age       -> List(["name", "age"])
/// fields[]=name                -> List(["name"])
/// fields[0]=name&fields[1]=age -> List(["name", "age"])
/// fields[a]=name               -> Map({"a": String("name")})
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    String(String),
    List(Vec<String>),
    Map(IndexMap<String, QueryValue>),
}

impl QueryValue {
    /// The value when it is a single string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// JSON form of the value
    pub fn to_json(&self) -> Value {
        match self {
            QueryValue::String(s) => Value::String(s.clone()),
            QueryValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            QueryValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    fn push(&mut self, value: String) -> Result<(), String> {
        match self {
            QueryValue::String(first) => {
                *self = QueryValue::List(vec![std::mem::take(first), value]);
                Ok(())
            }
            QueryValue::List(items) => {
                items.push(value);
                Ok(())
            }
            QueryValue::Map(_) => Err("cannot mix keyed and plain values".to_string()),
        }
    }
}

/// Decoded query string, keys in order of first appearance
pub type Query = IndexMap<String, QueryValue>;

enum Segment<'a> {
    Plain,
    Index,
    Named(&'a str),
}

fn split_key(key: &str) -> (&str, Segment<'_>) {
    let Some(open) = key.find('[') else {
        return (key, Segment::Plain);
    };
    if open == 0 || !key.ends_with(']') {
        return (key, Segment::Plain);
    }
    let inner = &key[open + 1..key.len() - 1];
    let base = &key[..open];
    if inner.is_empty() || inner.chars().all(|c| c.is_ascii_digit()) {
        (base, Segment::Index)
    } else {
        (base, Segment::Named(inner))
    }
}

/// Decode a raw query string
///
/// An absent or empty query yields an empty map.
pub fn parse_query(raw: Option<&str>) -> Result<Query, String> {
    let raw = raw.unwrap_or_default();
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(raw).map_err(|e| format!("Malformed query string: {}", e))?;

    let mut query = Query::new();
    for (key, value) in pairs {
        let (base, segment) = split_key(&key);
        let conflict = |reason: String| format!("Malformed query parameter '{}': {}", base, reason);

        match (segment, query.get_mut(base)) {
            (Segment::Plain, None) => {
                query.insert(base.to_string(), QueryValue::String(value));
            }
            (Segment::Index, None) => {
                query.insert(base.to_string(), QueryValue::List(vec![value]));
            }
            (Segment::Plain | Segment::Index, Some(existing)) => {
                existing.push(value).map_err(conflict)?;
            }
            (Segment::Named(name), None) => {
                let mut map = IndexMap::new();
                map.insert(name.to_string(), QueryValue::String(value));
                query.insert(base.to_string(), QueryValue::Map(map));
            }
            (Segment::Named(name), Some(QueryValue::Map(map))) => match map.get_mut(name) {
                Some(existing) => existing.push(value).map_err(conflict)?,
                None => {
                    map.insert(name.to_string(), QueryValue::String(value));
                }
            },
            (Segment::Named(_), Some(_)) => {
                return Err(conflict("cannot mix keyed and plain values".to_string()));
            }
        }
    }

    Ok(query)
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Asc,
    #[serde(alias = "desc")]
    Desc,
}

/// One ordering term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub column: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Parse a sort expression
///
/// # Format
/// - `field` or `field:asc` (ascending)
/// - `field:desc` (descending)
/// - several terms separated by commas: `age:desc,name`
pub fn parse_sort(expression: &str) -> Result<Vec<SortOrder>, String> {
    expression
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| {
            let (column, direction) = term.split_once(':').unwrap_or((term, "asc"));
            let direction = match direction.to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => return Err(format!("Invalid sort direction '{}'", other)),
            };
            Ok(SortOrder {
                column: column.to_string(),
                direction,
            })
        })
        .collect()
}

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,
}

impl Pagination {
    /// Number of rows to skip, `None` when it does not fit in `usize`
    pub fn checked_offset(&self) -> Option<usize> {
        self.page.checked_sub(1)?.checked_mul(self.limit)
    }

    /// Number of rows to skip
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Paginated response structure
///
/// This structure wraps paginated data with metadata about pagination state.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        // Ensure limit is at least 1 to avoid division by zero
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }

    /// Metadata for an offset-based window (search)
    pub fn from_offset(offset: usize, limit: usize, total: usize) -> Self {
        let limit = limit.max(1);
        Self::new((offset / limit).saturating_add(1), limit, total)
    }
}
