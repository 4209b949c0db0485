//! Path parameter validation

use crate::core::error::CrudError;
use crate::core::metadata::{FactoryOption, Key};
use std::collections::HashMap;

/// Coerce the raw path parameters of every primary-key column
///
/// Parameters that are not primary keys are ignored. A missing or
/// malformed component is reported through `on_error`.
pub fn validate_params<E>(
    raw: &HashMap<String, String>,
    factory: &FactoryOption,
    on_error: E,
) -> Result<Key, CrudError>
where
    E: Fn(String) -> CrudError,
{
    let mut key = Key::new();
    for primary_key in &factory.primary_keys {
        let Some(value) = raw.get(&primary_key.name) else {
            return Err(on_error(format!(
                "Missing parameter '{}'",
                primary_key.name
            )));
        };
        let value = primary_key.column_type.parse_str(value).map_err(&on_error)?;
        key.insert(primary_key.name.clone(), value);
    }
    Ok(key)
}
