//! Payload validation for create, update and upsert

use super::rules::{RuleKind, ValidationRuleSet};
use crate::core::error::{CrudError, ValidationError, Violation};
use crate::core::metadata::FactoryOption;
use crate::core::method::Group;
use serde::Serialize;
use serde_json::{Map, Value};

/// A payload that passed validation, coerced to the column types
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedEntity(Map<String, Value>);

impl ValidatedEntity {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Why a payload was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum BodyRejection {
    /// Absent, or not a JSON object
    NotAnObject,
    /// Contains a primary-key column
    PrimaryKey,
    /// One or more rule violations
    Violations(Vec<Violation>),
}

impl BodyRejection {
    /// Prefix violation fields with a batch index (`[1].name`)
    pub fn at_index(self, index: usize) -> Vec<Violation> {
        let prefix = |field: &str| format!("[{}].{}", index, field);
        match self {
            BodyRejection::NotAnObject => vec![Violation::new(
                format!("[{}]", index),
                "type",
                "item must be a JSON object",
            )],
            BodyRejection::PrimaryKey => vec![Violation::new(
                format!("[{}]", index),
                "primaryKey",
                "Cannot include value of primary key",
            )],
            BodyRejection::Violations(violations) => violations
                .into_iter()
                .map(|v| Violation {
                    field: prefix(&v.field),
                    ..v
                })
                .collect(),
        }
    }
}

impl From<BodyRejection> for CrudError {
    fn from(rejection: BodyRejection) -> Self {
        match rejection {
            BodyRejection::NotAnObject => ValidationError::InvalidBody.into(),
            BodyRejection::PrimaryKey => ValidationError::PrimaryKeyInBody.into(),
            BodyRejection::Violations(violations) => ValidationError::Violations(violations).into(),
        }
    }
}

/// Validate a payload for one lifecycle group
///
/// Only fields with at least one rule for `group` are accepted; any other
/// key is a `whitelist` violation. Values are coerced to their column type,
/// filtered, then checked against the group's rules. Absent fields are only
/// checked by `required`.
pub fn validate_body(
    body: Option<&Value>,
    factory: &FactoryOption,
    rules: &ValidationRuleSet,
    group: Group,
) -> Result<ValidatedEntity, BodyRejection> {
    let Some(object) = body.and_then(Value::as_object) else {
        return Err(BodyRejection::NotAnObject);
    };

    if object.keys().any(|key| factory.is_primary_key(key)) {
        return Err(BodyRejection::PrimaryKey);
    }

    let mut violations = Vec::new();

    for key in object.keys() {
        if !rules.accepts(key, group) {
            violations.push(Violation::new(
                key.as_str(),
                "whitelist",
                format!("property {} should not exist", key),
            ));
        }
    }

    let mut validated = Map::new();
    for field in rules.fields_for_group(group) {
        let Some(raw) = object.get(field) else {
            if rules
                .rules_for(field, group)
                .any(|rule| rule.kind == RuleKind::Required)
            {
                violations.push(Violation::new(
                    field,
                    "required",
                    format!("'{}' is required", field),
                ));
            }
            continue;
        };

        let coerced = match factory.column(field) {
            Some(column) => match column.column_type.coerce_json(raw) {
                Ok(value) => value,
                Err(message) => {
                    violations.push(Violation::new(
                        field,
                        "type",
                        format!("'{}' {}", field, message),
                    ));
                    continue;
                }
            },
            None => raw.clone(),
        };

        let filtered = rules
            .filters_for(field)
            .iter()
            .fold(coerced, |value, filter| filter.apply(field, value));

        let mut field_ok = true;
        for rule in rules.rules_for(field, group) {
            if let Err(message) = rule.kind.check(field, &filtered) {
                violations.push(Violation::new(field, rule.kind.name(), message));
                field_ok = false;
            }
        }

        if field_ok {
            validated.insert(field.to_string(), filtered);
        }
    }

    if violations.is_empty() {
        Ok(ValidatedEntity(validated))
    } else {
        Err(BodyRejection::Violations(violations))
    }
}
