//! Field projection: `?fields=` checking and override reconciliation

use crate::core::error::{CrudError, ValidationError};
use crate::core::metadata::FactoryOption;
use crate::core::query::QueryValue;

/// Reconcile the hook's field restriction with the caller's fields
///
/// Without a restriction the caller's fields win; without caller fields
/// the restriction wins; with both, their intersection in restriction
/// order. An empty result means every column.
pub fn select_fields(restriction: Option<&[String]>, requested: Option<&[String]>) -> Vec<String> {
    match (restriction, requested) {
        (None, requested) => requested.map(<[String]>::to_vec).unwrap_or_default(),
        (Some(restriction), None) => restriction.to_vec(),
        (Some(restriction), Some(requested)) => restriction
            .iter()
            .filter(|field| requested.contains(field))
            .cloned()
            .collect(),
    }
}

/// Check the shape and column membership of a `fields` query value
///
/// Absent or empty yields `None`; a single name yields a one-element list.
/// Keyed values are a shape error; unknown names are reported together.
pub fn check_fields(
    raw: Option<&QueryValue>,
    factory: &FactoryOption,
) -> Result<Option<Vec<String>>, CrudError> {
    let fields = match raw {
        None => return Ok(None),
        Some(QueryValue::String(name)) if name.is_empty() => return Ok(None),
        Some(QueryValue::String(name)) => vec![name.clone()],
        Some(QueryValue::List(names)) if names.is_empty() => return Ok(None),
        Some(QueryValue::List(names)) => names.clone(),
        Some(QueryValue::Map(_)) => {
            return Err(CrudError::unprocessable(
                "fields must be a string or a list of strings",
            ));
        }
    };

    check_field_names(&fields, factory)?;
    Ok(Some(fields))
}

/// Report every name that is not a column
pub fn check_field_names(fields: &[String], factory: &FactoryOption) -> Result<(), CrudError> {
    let invalid: Vec<String> = fields
        .iter()
        .filter(|name| !factory.has_column(name))
        .cloned()
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InvalidFields { names: invalid }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::ColumnType;
    use crate::core::metadata::Column;
    use indexmap::IndexMap;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn factory() -> FactoryOption {
        FactoryOption::from_columns(vec![
            Column::primary("id", ColumnType::Integer),
            Column::new("name", ColumnType::String),
            Column::new("age", ColumnType::Integer),
        ])
    }

    #[test]
    fn test_select_fields() {
        let restriction = strings(&["age", "name"]);
        let requested = strings(&["name", "id", "age"]);

        assert_eq!(select_fields(None, None), Vec::<String>::new());
        assert_eq!(select_fields(None, Some(requested.as_slice())), requested);
        assert_eq!(select_fields(Some(restriction.as_slice()), None), restriction);
        assert_eq!(
            select_fields(Some(restriction.as_slice()), Some(requested.as_slice())),
            strings(&["age", "name"])
        );
        assert!(select_fields(Some(&strings(&["id"])[..]), Some(&strings(&["name"])[..])).is_empty());
    }

    #[test]
    fn test_check_fields_absent_or_empty() {
        assert_eq!(check_fields(None, &factory()).unwrap(), None);
        let empty = QueryValue::String(String::new());
        assert_eq!(check_fields(Some(&empty), &factory()).unwrap(), None);
        let empty = QueryValue::List(Vec::new());
        assert_eq!(check_fields(Some(&empty), &factory()).unwrap(), None);
    }

    #[test]
    fn test_check_fields_valid_shapes() {
        let single = QueryValue::String("name".into());
        assert_eq!(
            check_fields(Some(&single), &factory()).unwrap(),
            Some(strings(&["name"]))
        );
        let list = QueryValue::List(strings(&["name", "age"]));
        assert_eq!(
            check_fields(Some(&list), &factory()).unwrap(),
            Some(strings(&["name", "age"]))
        );
    }

    #[test]
    fn test_check_fields_rejects_keyed_values() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), QueryValue::String("name".into()));
        let err = check_fields(Some(&QueryValue::Map(map)), &factory()).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_check_fields_reports_unknown_names() {
        let list = QueryValue::List(strings(&["name", "col", "other"]));
        let err = check_fields(Some(&list), &factory()).unwrap_err();
        assert_eq!(err.to_string(), "used Invalid name col,other");
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}
