//! Column types, typed field values and format checks

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::sync::OnceLock;
use uuid::Uuid;
use validator::{ValidateEmail, ValidateUrl};

/// Declared type of an entity column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    Uuid,
    #[serde(rename = "datetime")]
    DateTime,
    Json,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Uuid => "uuid",
            ColumnType::DateTime => "datetime",
            ColumnType::Json => "json",
        }
    }

    /// Coerce a raw textual value (path parameter, query filter) to this type
    pub fn parse_str(&self, raw: &str) -> Result<FieldValue, String> {
        let invalid = || format!("'{}' is not a valid {}", raw, self.as_str());
        match self {
            ColumnType::String => Ok(FieldValue::String(raw.to_string())),
            ColumnType::Integer => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| invalid()),
            ColumnType::Float => match raw.parse::<f64>() {
                Ok(num) if num.is_finite() => Ok(FieldValue::Float(num)),
                _ => Err(invalid()),
            },
            ColumnType::Boolean => match raw {
                "true" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(invalid()),
            },
            ColumnType::Uuid => Uuid::parse_str(raw)
                .map(FieldValue::Uuid)
                .map_err(|_| invalid()),
            ColumnType::DateTime => DateTime::parse_from_rfc3339(raw)
                .map(|dt| FieldValue::DateTime(dt.with_timezone(&Utc)))
                .map_err(|_| invalid()),
            ColumnType::Json => Err(format!("json columns cannot be matched by '{}'", raw)),
        }
    }

    /// Coerce a JSON payload value to this type
    ///
    /// `null` passes through untouched; presence rules decide whether it is
    /// acceptable. Integral floats are accepted for integer columns, uuids and
    /// datetimes are normalized to their canonical string form.
    pub fn coerce_json(&self, value: &Value) -> Result<Value, String> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let mismatch = || format!("must be a {}", self.as_str());
        match self {
            ColumnType::String => value.is_string().then(|| value.clone()).ok_or_else(mismatch),
            ColumnType::Integer => {
                if let Some(int) = value.as_i64() {
                    Ok(Value::from(int))
                } else if let Some(float) = value.as_f64().filter(|f| f.fract() == 0.0) {
                    if float >= i64::MIN as f64 && float <= i64::MAX as f64 {
                        Ok(Value::from(float as i64))
                    } else {
                        Err(mismatch())
                    }
                } else {
                    Err(mismatch())
                }
            }
            ColumnType::Float => value
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(mismatch),
            ColumnType::Boolean => value.is_boolean().then(|| value.clone()).ok_or_else(mismatch),
            ColumnType::Uuid => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(|id| Value::String(id.to_string()))
                .ok_or_else(mismatch),
            ColumnType::DateTime => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| Value::String(dt.with_timezone(&Utc).to_rfc3339()))
                .ok_or_else(mismatch),
            ColumnType::Json => Ok(value.clone()),
        }
    }
}

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// JSON form, matching what [`ColumnType::coerce_json`] produces
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Uuid(u) => Value::String(u.to_string()),
            FieldValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
            FieldValue::Null => Value::Null,
        }
    }
}

/// Field format validators
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Uuid,
    Url,
    Phone,
    Custom(Regex),
}

impl FieldFormat {
    /// Validate a JSON value against this format
    ///
    /// Non-string values never match.
    pub fn validate(&self, value: &Value) -> bool {
        let Some(string_value) = value.as_str() else {
            return false;
        };

        match self {
            FieldFormat::Email => string_value.to_owned().validate_email(),
            FieldFormat::Uuid => Uuid::parse_str(string_value).is_ok(),
            FieldFormat::Url => string_value.to_owned().validate_url(),
            FieldFormat::Phone => Self::is_valid_phone(string_value),
            FieldFormat::Custom(regex) => regex.is_match(string_value),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldFormat::Email => "email",
            FieldFormat::Uuid => "uuid",
            FieldFormat::Url => "url",
            FieldFormat::Phone => "phone",
            FieldFormat::Custom(_) => "pattern",
        }
    }

    fn is_valid_phone(phone: &str) -> bool {
        static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PHONE_REGEX.get_or_init(|| {
            // At least 8 digits, max 15 (E.164 standard)
            Regex::new(r"^\+?[1-9]\d{7,14}$").expect("phone pattern is valid")
        });
        regex.is_match(phone)
    }
}
