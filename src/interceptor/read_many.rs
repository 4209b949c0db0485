//! Read-many interceptor

use super::fields::{check_fields, select_fields};
use super::relations::resolve_relations;
use super::{InterceptorConfig, RequestInterceptor};
use crate::core::error::CrudError;
use crate::core::field::ColumnType;
use crate::core::method::Method;
use crate::core::options::RouteOptions;
use crate::core::query::{Pagination, Query, QueryValue, SortOrder, parse_sort};
use crate::core::request::{CrudReadManyRequest, CrudRequest, RequestContext};
use crate::core::search::{Condition, Operator, SearchClause};
use async_trait::async_trait;
use serde_json::Value;

const METHOD: Method = Method::ReadMany;

/// Query keys that are not filters
const RESERVED_KEYS: [&str; 4] = ["fields", "page", "limit", "sort"];

/// Resolves pagination, sorting and equality filters of a list read
///
/// Projection, soft-delete visibility and relations follow the read-one
/// precedence.
#[derive(Debug, Clone)]
pub struct ReadManyRequestInterceptor {
    config: InterceptorConfig,
}

impl ReadManyRequestInterceptor {
    pub fn new(config: InterceptorConfig) -> Self {
        Self { config }
    }

    fn pagination(&self, query: &Query) -> Result<Pagination, CrudError> {
        let (number_of_take, limit_of_take) = self.config.take_limits(METHOD);

        let page = match query.get("page") {
            None => 1,
            Some(value) => positive_integer("page", value)?,
        };
        let limit = match query.get("limit") {
            None => number_of_take,
            Some(value) => positive_integer("limit", value)?,
        };
        if limit > limit_of_take {
            return Err(CrudError::unprocessable(format!(
                "limit must not exceed {}",
                limit_of_take
            )));
        }

        let pagination = Pagination { page, limit };
        if pagination.checked_offset().is_none() {
            return Err(CrudError::unprocessable("page is out of range"));
        }
        Ok(pagination)
    }

    fn sort(&self, query: &Query) -> Result<Vec<SortOrder>, CrudError> {
        let Some(value) = query.get("sort") else {
            return Ok(Vec::new());
        };

        let expressions: Vec<&str> = match value {
            QueryValue::String(s) => vec![s.as_str()],
            QueryValue::List(items) => items.iter().map(String::as_str).collect(),
            QueryValue::Map(_) => return Err(CrudError::unprocessable("sort must be a string")),
        };

        let mut orders = Vec::new();
        for expression in expressions {
            orders.extend(parse_sort(expression).map_err(CrudError::unprocessable)?);
        }
        if let Some(order) = orders
            .iter()
            .find(|order| !self.config.factory.has_column(&order.column))
        {
            return Err(CrudError::unprocessable(format!(
                "Invalid sort column '{}'",
                order.column
            )));
        }
        Ok(orders)
    }

    fn filters(&self, query: &Query, route: &RouteOptions) -> Result<SearchClause, CrudError> {
        let mut filters = SearchClause::new();

        for (name, value) in query {
            if RESERVED_KEYS.contains(&name.as_str()) {
                continue;
            }

            let allowed = route
                .allowed_filters
                .as_ref()
                .is_none_or(|allowed| allowed.contains(name));
            let column = self
                .config
                .factory
                .column(name)
                .filter(|_| allowed)
                .ok_or_else(|| CrudError::unprocessable(format!("Invalid filter '{}'", name)))?;

            let condition = match value {
                QueryValue::String(raw) => {
                    Condition::eq(coerce_filter(column.column_type, raw)?)
                }
                QueryValue::List(items) => {
                    let operands = items
                        .iter()
                        .map(|raw| coerce_filter(column.column_type, raw))
                        .collect::<Result<Vec<_>, _>>()?;
                    Condition::new(Operator::In, Value::Array(operands))
                }
                QueryValue::Map(_) => {
                    return Err(CrudError::unprocessable(format!(
                        "Invalid filter '{}'",
                        name
                    )));
                }
            };
            filters.insert(name.clone(), condition);
        }

        Ok(filters)
    }
}

fn positive_integer(name: &str, value: &QueryValue) -> Result<usize, CrudError> {
    value
        .as_str()
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|number| *number >= 1)
        .ok_or_else(|| CrudError::unprocessable(format!("{} must be a positive integer", name)))
}

fn coerce_filter(column_type: ColumnType, raw: &str) -> Result<Value, CrudError> {
    column_type
        .parse_str(raw)
        .map(|value| value.to_json())
        .map_err(CrudError::unprocessable)
}

#[async_trait]
impl RequestInterceptor for ReadManyRequestInterceptor {
    fn method(&self) -> Method {
        METHOD
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<CrudRequest, CrudError> {
        let custom = ctx.take_custom_options();
        let route = self.config.route(METHOD);

        let requested = check_fields(ctx.query.get("fields"), &self.config.factory)?;
        let soft_deleted = self.config.soft_delete(METHOD, custom.soft_deleted);
        let filters = self.filters(&ctx.query, &route)?;
        let sort = self.sort(&ctx.query)?;
        let pagination = self.pagination(&ctx.query)?;

        Ok(CrudRequest::ReadMany(CrudReadManyRequest {
            filters,
            sort,
            pagination,
            fields: select_fields(custom.fields.as_deref(), requested.as_deref()),
            soft_deleted,
            relations: resolve_relations(custom.relations.as_deref(), route.relations.as_ref()),
            options: self.config.request_options(METHOD),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::{CrudOptions, CustomRequestOptions};
    use crate::core::query::SortDirection;
    use crate::interceptor::test_support::{base, config};
    use serde_json::json;

    async fn run(config: InterceptorConfig, query: &str) -> Result<CrudReadManyRequest, CrudError> {
        let mut ctx = RequestContext::new().with_raw_query(query).unwrap();
        ReadManyRequestInterceptor::new(config)
            .process(&mut ctx)
            .await
            .map(|request| match request {
                CrudRequest::ReadMany(request) => request,
                other => panic!("unexpected request: {:?}", other),
            })
    }

    #[tokio::test]
    async fn test_defaults() {
        let request = run(base(), "").await.unwrap();
        assert!(request.filters.is_empty());
        assert!(request.sort.is_empty());
        assert_eq!(request.pagination, Pagination { page: 1, limit: 20 });
        assert!(!request.soft_deleted);
        assert_eq!(request.relations, None);
    }

    #[tokio::test]
    async fn test_pagination_bounds() {
        let request = run(base(), "page=3&limit=100").await.unwrap();
        assert_eq!(request.pagination, Pagination { page: 3, limit: 100 });

        assert!(run(base(), "limit=101").await.is_err());
        assert!(run(base(), "limit=0").await.is_err());
        assert!(run(base(), "page=first").await.is_err());
    }

    #[tokio::test]
    async fn test_page_past_addressable_offset() {
        let err = run(base(), &format!("page={}", usize::MAX)).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "page is out of range");

        let request = run(base(), &format!("page={}&limit=1", usize::MAX)).await.unwrap();
        assert_eq!(request.pagination.offset(), usize::MAX - 1);
    }

    #[tokio::test]
    async fn test_sort() {
        let request = run(base(), "sort=age:desc,name").await.unwrap();
        assert_eq!(request.sort[0].direction, SortDirection::Desc);
        assert_eq!(request.sort[1], SortOrder::asc("name"));

        let err = run(base(), "sort=col").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid sort column 'col'");
    }

    #[tokio::test]
    async fn test_filters_are_coerced() {
        let request = run(base(), "age=3&name=a&name=b").await.unwrap();
        assert_eq!(request.filters.get("age"), Some(&Condition::eq(json!(3))));
        assert_eq!(
            request.filters.get("name"),
            Some(&Condition::new(Operator::In, json!(["a", "b"])))
        );

        assert!(run(base(), "age=three").await.is_err());
        assert!(run(base(), "unknown=1").await.is_err());
    }

    #[tokio::test]
    async fn test_allowed_filters() {
        let options = CrudOptions::new("base").route(
            METHOD,
            RouteOptions::default().with_allowed_filters(vec!["name".to_string()]),
        );
        assert!(run(config(options.clone()), "name=a").await.is_ok());
        let err = run(config(options), "age=3").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid filter 'age'");
    }

    #[tokio::test]
    async fn test_overrides_mirror_read_one() {
        let mut ctx = RequestContext::new().with_raw_query("fields=name").unwrap();
        ctx.set_custom_options(CustomRequestOptions {
            soft_deleted: Some(true),
            relations: Some(Vec::new()),
            fields: Some(vec!["id".to_string()]),
            ..Default::default()
        });
        let Ok(CrudRequest::ReadMany(request)) =
            ReadManyRequestInterceptor::new(base()).process(&mut ctx).await
        else {
            panic!("expected a read-many request");
        };
        assert!(request.soft_deleted);
        assert_eq!(request.relations, Some(Vec::new()));
        assert!(request.fields.is_empty());
    }
}
