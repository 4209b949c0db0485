//! Search interceptor

use super::fields::check_field_names;
use super::relations::resolve_relations;
use super::{InterceptorConfig, RequestInterceptor};
use crate::core::error::{CrudError, ValidationError, Violation};
use crate::core::method::{Group, Method};
use crate::core::options::RouteOptions;
use crate::core::query::SortOrder;
use crate::core::request::{CrudRequest, CrudSearchRequest, RequestContext};
use crate::core::search::{Operator, SearchBody, SearchClause};
use async_trait::async_trait;
use serde_json::Value;

const METHOD: Method = Method::Search;

/// Validates a search body against the resource columns
///
/// `where` columns are limited to `allowedParams` when the route declares
/// them. Operands are coerced to the column type and checked against the
/// field rules of the `search` group.
#[derive(Debug, Clone)]
pub struct SearchRequestInterceptor {
    config: InterceptorConfig,
}

impl SearchRequestInterceptor {
    pub fn new(config: InterceptorConfig) -> Self {
        Self { config }
    }

    fn parse_body(body: Option<&Value>) -> Result<SearchBody, CrudError> {
        match body {
            None | Some(Value::Null) => Ok(SearchBody::default()),
            Some(value @ Value::Object(_)) => serde_json::from_value(value.clone())
                .map_err(|e| CrudError::unprocessable(format!("Invalid search body: {}", e))),
            Some(_) => Err(ValidationError::InvalidBody.into()),
        }
    }

    fn validate_where(
        &self,
        clauses: Vec<SearchClause>,
        route: &RouteOptions,
    ) -> Result<Vec<SearchClause>, CrudError> {
        let mut violations = Vec::new();
        let mut validated = Vec::with_capacity(clauses.len());

        for (index, clause) in clauses.into_iter().enumerate() {
            let mut normalized = SearchClause::new();
            for (column_name, condition) in clause {
                let field = format!("where[{}].{}", index, column_name);

                let allowed = route
                    .allowed_params
                    .as_ref()
                    .is_none_or(|allowed| allowed.contains(&column_name));
                let Some(column) = self.config.factory.column(&column_name).filter(|_| allowed)
                else {
                    violations.push(Violation::new(
                        field,
                        "column",
                        format!("'{}' cannot be searched", column_name),
                    ));
                    continue;
                };

                let condition = match condition.normalize(column.column_type) {
                    Ok(condition) => condition,
                    Err(message) => {
                        violations.push(Violation::new(field, "operand", message));
                        continue;
                    }
                };

                for operand in rule_operands(condition.operator, condition.operand.as_ref()) {
                    for rule in self.config.rules.rules_for(&column_name, Group::Search) {
                        if let Err(message) = rule.kind.check(&column_name, operand) {
                            violations.push(Violation::new(&field, rule.kind.name(), message));
                        }
                    }
                }

                normalized.insert(column_name, condition);
            }
            validated.push(normalized);
        }

        if violations.is_empty() {
            Ok(validated)
        } else {
            Err(ValidationError::Violations(violations).into())
        }
    }
}

/// Values of an operand checked by field rules
fn rule_operands(operator: Operator, operand: Option<&Value>) -> Vec<&Value> {
    match (operator, operand) {
        (Operator::Like | Operator::ILike | Operator::Null, _) | (_, None) => Vec::new(),
        (Operator::In | Operator::Between, Some(Value::Array(items))) => items.iter().collect(),
        (_, Some(value)) => vec![value],
    }
}

#[async_trait]
impl RequestInterceptor for SearchRequestInterceptor {
    fn method(&self) -> Method {
        METHOD
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<CrudRequest, CrudError> {
        let custom = ctx.take_custom_options();
        let route = self.config.route(METHOD);
        let body = Self::parse_body(ctx.body.as_ref())?;

        let select = body.select.unwrap_or_default();
        check_field_names(&select, &self.config.factory)?;

        let where_ = self.validate_where(body.where_.unwrap_or_default(), &route)?;

        let order: Vec<SortOrder> = body
            .order
            .unwrap_or_default()
            .into_iter()
            .map(|(column, direction)| SortOrder { column, direction })
            .collect();
        let order_columns: Vec<String> = order.iter().map(|o| o.column.clone()).collect();
        check_field_names(&order_columns, &self.config.factory)?;

        let (number_of_take, limit_of_take) = self.config.take_limits(METHOD);
        let take = body.take.unwrap_or(number_of_take);
        if take == 0 || take > limit_of_take {
            return Err(CrudError::unprocessable(format!(
                "take must be between 1 and {}",
                limit_of_take
            )));
        }

        let skip = body.skip.unwrap_or(0);
        if skip.checked_add(take).is_none() {
            return Err(CrudError::unprocessable("skip is out of range"));
        }

        let soft_deleted = self
            .config
            .soft_delete(METHOD, custom.soft_deleted.or(body.with_deleted));

        Ok(CrudRequest::Search(CrudSearchRequest {
            select,
            where_,
            order,
            take,
            skip,
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
    use crate::core::search::Condition;
    use crate::interceptor::test_support::{base, config};
    use serde_json::json;

    async fn run(config: InterceptorConfig, mut ctx: RequestContext) -> Result<CrudSearchRequest, CrudError> {
        SearchRequestInterceptor::new(config)
            .process(&mut ctx)
            .await
            .map(|request| match request {
                CrudRequest::Search(request) => request,
                other => panic!("unexpected request: {:?}", other),
            })
    }

    fn body(value: Value) -> RequestContext {
        RequestContext::new().with_body(value)
    }

    #[tokio::test]
    async fn test_empty_body_defaults() {
        let request = run(base(), RequestContext::new()).await.unwrap();
        assert!(request.where_.is_empty());
        assert_eq!(request.take, 20);
        assert_eq!(request.skip, 0);
        assert!(!request.soft_deleted);
    }

    #[tokio::test]
    async fn test_full_body() {
        let request = run(
            base(),
            body(json!({
                "select": ["name"],
                "where": [
                    { "age": { "operator": ">=", "operand": 3.0 } },
                    { "name": { "operator": "LIKE", "operand": "a%" } }
                ],
                "order": { "age": "DESC" },
                "take": 5,
                "skip": 10
            })),
        )
        .await
        .unwrap();
        assert_eq!(request.select, vec!["name".to_string()]);
        assert_eq!(
            request.where_[0].get("age"),
            Some(&Condition::new(Operator::GreaterThanOrEqual, json!(3)))
        );
        assert_eq!(request.order[0].direction, SortDirection::Desc);
        assert_eq!((request.take, request.skip), (5, 10));
    }

    #[tokio::test]
    async fn test_rejects_bad_operands_and_columns() {
        let err = run(
            base(),
            body(json!({ "where": [{
                "age": { "operator": "BETWEEN", "operand": [1] },
                "unknown": { "operator": "=", "operand": 1 }
            }] })),
        )
        .await
        .unwrap_err();
        let CrudError::Validation(ValidationError::Violations(violations)) = err else {
            panic!("expected violations");
        };
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "where[0].age");
        assert_eq!(violations[1].rule, "column");
    }

    #[tokio::test]
    async fn test_search_group_rules_apply_to_operands() {
        // age carries an `always` positive rule
        let err = run(
            base(),
            body(json!({ "where": [{ "age": { "operator": "IN", "operand": [1, -2] } }] })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_allowed_params() {
        let options = CrudOptions::new("base").route(
            METHOD,
            RouteOptions::default().with_allowed_params(vec!["name".to_string()]),
        );
        let result = run(
            config(options),
            body(json!({ "where": [{ "age": { "operator": "=", "operand": 1 } }] })),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_take_and_unknown_keys() {
        assert!(run(base(), body(json!({ "take": 101 }))).await.is_err());
        assert!(run(base(), body(json!({ "take": 0 }))).await.is_err());
        assert!(run(base(), body(json!({ "limit": 3 }))).await.is_err());
        assert!(run(base(), body(json!(["name"]))).await.is_err());
    }

    #[tokio::test]
    async fn test_soft_delete_precedence() {
        let request = run(base(), body(json!({ "withDeleted": true }))).await.unwrap();
        assert!(request.soft_deleted);

        let mut ctx = body(json!({ "withDeleted": true }));
        ctx.set_custom_options(CustomRequestOptions {
            soft_deleted: Some(false),
            ..Default::default()
        });
        assert!(!run(base(), ctx).await.unwrap().soft_deleted);
    }

    #[tokio::test]
    async fn test_skip_past_addressable_window() {
        let err = run(base(), body(json!({ "take": 1, "skip": usize::MAX })))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "skip is out of range");

        let request = run(base(), body(json!({ "take": 1, "skip": usize::MAX - 1 })))
            .await
            .unwrap();
        assert_eq!(request.skip, usize::MAX - 1);
    }
}
