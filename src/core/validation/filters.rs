//! Field filters applied to payload values before validation

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Declarative filter attached to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "camelCase")]
pub enum FieldFilter {
    Trim,
    Uppercase,
    Lowercase,
    RoundDecimals { decimals: u32 },
}

impl FieldFilter {
    pub fn apply(&self, field: &str, value: Value) -> Value {
        match self {
            FieldFilter::Trim => trim()(field, value),
            FieldFilter::Uppercase => uppercase()(field, value),
            FieldFilter::Lowercase => lowercase()(field, value),
            FieldFilter::RoundDecimals { decimals } => round_decimals(*decimals)(field, value),
        }
    }
}

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value.as_str() {
        Some(s) => Value::String(s.trim().to_string()),
        None => value,
    }
}

/// Filter: convert string to uppercase
pub fn uppercase() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value.as_str() {
        Some(s) => Value::String(s.to_uppercase()),
        None => value,
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value.as_str() {
        Some(s) => Value::String(s.to_lowercase()),
        None => value,
    }
}

/// Filter: round number to specified decimal places
pub fn round_decimals(decimals: u32) -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    move |_: &str, value: Value| {
        // integers are already exact
        if value.is_i64() || value.is_u64() {
            return value;
        }
        match value.as_f64() {
            Some(num) => {
                let factor = 10_f64.powi(decimals as i32);
                json!((num * factor).round() / factor)
            }
            None => value,
        }
    }
}
