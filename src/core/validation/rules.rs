//! Declarative validation rules, grouped per field and lifecycle group

use super::filters::FieldFilter;
use super::validators;
use crate::core::error::ConfigError;
use crate::core::field::FieldFormat;
use crate::core::metadata::FactoryOption;
use crate::core::method::Group;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A compiled regular expression that (de)serializes as its source
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Pattern)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// The constraint checked by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum RuleKind {
    /// Value must be present and not null
    Required,
    /// Marks the field as accepted without constraining it
    Optional,
    Length {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    Min {
        value: f64,
    },
    Max {
        value: f64,
    },
    Positive,
    OneOf {
        values: Vec<String>,
    },
    DateFormat {
        format: String,
    },
    Email,
    Url,
    Uuid,
    Phone,
    Matches {
        pattern: Pattern,
    },
}

impl RuleKind {
    /// Rule name reported in violations
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Optional => "optional",
            RuleKind::Length { .. } => "length",
            RuleKind::Min { .. } => "min",
            RuleKind::Max { .. } => "max",
            RuleKind::Positive => "positive",
            RuleKind::OneOf { .. } => "oneOf",
            RuleKind::DateFormat { .. } => "dateFormat",
            RuleKind::Email => "email",
            RuleKind::Url => "url",
            RuleKind::Uuid => "uuid",
            RuleKind::Phone => "phone",
            RuleKind::Matches { .. } => "matches",
        }
    }

    /// Check a present value against the rule
    ///
    /// `null` only fails `required`; the other rules skip it.
    pub fn check(&self, field: &str, value: &Value) -> Result<(), String> {
        if value.is_null() && !matches!(self, RuleKind::Required) {
            return Ok(());
        }

        match self {
            RuleKind::Required => validators::required()(field, value),
            RuleKind::Optional => Ok(()),
            RuleKind::Length { min, max } => validators::string_length(*min, *max)(field, value),
            RuleKind::Min { value: min } => validators::min_value(*min)(field, value),
            RuleKind::Max { value: max } => validators::max_value(*max)(field, value),
            RuleKind::Positive => validators::positive()(field, value),
            RuleKind::OneOf { values } => validators::in_list(values.clone())(field, value),
            RuleKind::DateFormat { format } => {
                validators::date_format(format.clone())(field, value)
            }
            RuleKind::Email => check_format(&FieldFormat::Email, field, value),
            RuleKind::Url => check_format(&FieldFormat::Url, field, value),
            RuleKind::Uuid => check_format(&FieldFormat::Uuid, field, value),
            RuleKind::Phone => check_format(&FieldFormat::Phone, field, value),
            RuleKind::Matches { pattern } => {
                check_format(&FieldFormat::Custom(pattern.0.clone()), field, value)
            }
        }
    }
}

fn check_format(format: &FieldFormat, field: &str, value: &Value) -> Result<(), String> {
    if format.validate(value) {
        Ok(())
    } else {
        Err(format!("'{}' must be a valid {}", field, format.name()))
    }
}

/// A rule bound to the lifecycle groups it applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(flatten)]
    pub kind: RuleKind,

    #[serde(default)]
    pub groups: Vec<Group>,

    /// Applies to every group
    #[serde(default)]
    pub always: bool,
}

impl Rule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            groups: Vec::new(),
            always: false,
        }
    }

    pub fn groups(mut self, groups: &[Group]) -> Self {
        self.groups = groups.to_vec();
        self
    }

    pub fn always(mut self) -> Self {
        self.always = true;
        self
    }

    pub fn applies_to(&self, group: Group) -> bool {
        self.always || self.groups.contains(&group)
    }
}

/// Rules and filters declared for one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRules {
    pub rules: Vec<Rule>,
    pub filters: Vec<FieldFilter>,
}

/// Validation rules of a resource, keyed by field name
///
/// Built once at registration and shared read-only by every interceptor.
/// Field declaration order is kept so violations are reported in a stable
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationRuleSet {
    fields: IndexMap<String, FieldRules>,
}

impl ValidationRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to a field
    pub fn rule(mut self, field: &str, rule: Rule) -> Self {
        self.fields
            .entry(field.to_string())
            .or_default()
            .rules
            .push(rule);
        self
    }

    /// Append a filter to a field
    pub fn filter(mut self, field: &str, filter: FieldFilter) -> Self {
        self.fields
            .entry(field.to_string())
            .or_default()
            .filters
            .push(filter);
        self
    }

    /// Field names accepted in a payload of the given group
    pub fn fields_for_group(&self, group: Group) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, field)| field.rules.iter().any(|rule| rule.applies_to(group)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn accepts(&self, field: &str, group: Group) -> bool {
        self.fields
            .get(field)
            .is_some_and(|rules| rules.rules.iter().any(|rule| rule.applies_to(group)))
    }

    /// Rules of a field that apply to the given group
    pub fn rules_for<'a>(&'a self, field: &str, group: Group) -> impl Iterator<Item = &'a Rule> {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|rules| rules.rules.iter())
            .filter(move |rule| rule.applies_to(group))
    }

    pub fn filters_for(&self, field: &str) -> &[FieldFilter] {
        self.fields
            .get(field)
            .map(|rules| rules.filters.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Ensure every ruled field is a column of the resource
    pub fn check_columns(&self, resource: &str, factory: &FactoryOption) -> Result<(), ConfigError> {
        match self.fields.keys().find(|name| !factory.has_column(name)) {
            Some(name) => Err(ConfigError::UnknownColumn {
                resource: resource.to_string(),
                context: "validation rules".to_string(),
                column: name.clone(),
            }),
            None => Ok(()),
        }
    }
}
