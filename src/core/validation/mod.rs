//! Validation and filtering system
//!
//! Rules are declared per field and tagged with the lifecycle groups they
//! apply to. Payloads are whitelisted against the group, coerced to their
//! column type, filtered, then checked.

pub mod body;
pub mod filters;
pub mod rules;
pub mod validators;

pub use body::{BodyRejection, ValidatedEntity, validate_body};
pub use filters::FieldFilter;
pub use rules::{FieldRules, Pattern, Rule, RuleKind, ValidationRuleSet};
