//! Search conditions shared by the search route and repositories

use crate::core::field::ColumnType;
use crate::core::query::SortDirection;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator of a search condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "ILIKE")]
    ILike,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NULL")]
    Null,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::Between => "BETWEEN",
            Operator::In => "IN",
            Operator::Null => "NULL",
        }
    }
}

/// One condition on a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub operator: Operator,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand: Option<Value>,

    /// Negate the condition
    #[serde(default)]
    pub not: bool,
}

impl Condition {
    pub fn new(operator: Operator, operand: Value) -> Self {
        Self {
            operator,
            operand: Some(operand),
            not: false,
        }
    }

    pub fn eq(operand: Value) -> Self {
        Self::new(Operator::Equal, operand)
    }

    pub fn is_null() -> Self {
        Self {
            operator: Operator::Null,
            operand: None,
            not: false,
        }
    }

    pub fn negate(mut self) -> Self {
        self.not = !self.not;
        self
    }

    /// Check the operand shape and coerce it to the column type
    pub fn normalize(self, column_type: ColumnType) -> Result<Self, String> {
        let operator = self.operator;
        let operand = match (operator, self.operand) {
            (Operator::Null, None) => None,
            (Operator::Null, Some(_)) => {
                return Err(format!("operator {} takes no operand", operator.as_str()));
            }
            (_, None) => return Err(format!("operator {} needs an operand", operator.as_str())),
            (Operator::Between, Some(Value::Array(items))) if items.len() == 2 => {
                Some(Value::Array(coerce_all(column_type, &items)?))
            }
            (Operator::Between, Some(_)) => {
                return Err("operator BETWEEN needs an array of two values".to_string());
            }
            (Operator::In, Some(Value::Array(items))) if !items.is_empty() => {
                Some(Value::Array(coerce_all(column_type, &items)?))
            }
            (Operator::In, Some(_)) => {
                return Err("operator IN needs a non-empty array".to_string());
            }
            (Operator::Like | Operator::ILike, Some(Value::String(pattern))) => {
                Some(Value::String(pattern))
            }
            (Operator::Like | Operator::ILike, Some(_)) => {
                return Err(format!("operator {} needs a string", operator.as_str()));
            }
            (_, Some(operand)) => Some(column_type.coerce_json(&operand)?),
        };

        Ok(Self { operand, ..self })
    }
}

fn coerce_all(column_type: ColumnType, items: &[Value]) -> Result<Vec<Value>, String> {
    items.iter().map(|item| column_type.coerce_json(item)).collect()
}

/// Conditions AND-ed together, keyed by column
pub type SearchClause = IndexMap<String, Condition>;

/// Raw search payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchBody {
    pub select: Option<Vec<String>>,

    /// Clauses OR-ed together
    #[serde(rename = "where")]
    pub where_: Option<Vec<SearchClause>>,

    pub order: Option<IndexMap<String, SortDirection>>,
    pub take: Option<usize>,
    pub skip: Option<usize>,
    pub with_deleted: Option<bool>,
}
