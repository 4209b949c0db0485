//! Reusable field validators
//!
//! Each validator checks one constraint and ignores values of a type it does
//! not understand; type mismatches are reported by column coercion.

use serde_json::Value;

/// Validator: field is required (not null)
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_null() {
            Err(format!("'{}' is required", field))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must be positive
pub fn positive() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num <= 0.0 => Err(format!("'{}' must be positive (value: {})", field, num)),
        _ => Ok(()),
    }
}

/// Validator: string length must be within range
pub fn string_length(
    min: Option<usize>,
    max: Option<usize>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        let Some(s) = value.as_str() else {
            return Ok(());
        };
        let len = s.chars().count();
        if let Some(min) = min.filter(|min| len < *min) {
            Err(format!(
                "'{}' must be at least {} characters long (currently: {})",
                field, min, len
            ))
        } else if let Some(max) = max.filter(|max| len > *max) {
            Err(format!(
                "'{}' must not exceed {} characters (currently: {})",
                field, max, len
            ))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must not be below minimum
pub fn min_value(min: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num < min => Err(format!(
            "'{}' must not be less than {} (value: {})",
            field, min, num
        )),
        _ => Ok(()),
    }
}

/// Validator: number must not exceed maximum
pub fn max_value(max: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num > max => Err(format!(
            "'{}' must not exceed {} (value: {})",
            field, max, num
        )),
        _ => Ok(()),
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            if !allowed.iter().any(|candidate| candidate == s) {
                return Err(format!(
                    "'{}' must be one of {:?} (value: {})",
                    field, allowed, s
                ));
            }
        }
        Ok(())
    }
}

/// Validator: date must match format
pub fn date_format(
    format: String,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            if chrono::NaiveDate::parse_from_str(s, &format).is_err() {
                return Err(format!(
                    "'{}' must use the format {} (value: {})",
                    field, format, s
                ));
            }
        }
        Ok(())
    }
}
