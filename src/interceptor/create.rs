//! Create interceptor

use super::{InterceptorConfig, RequestInterceptor};
use crate::core::error::{CrudError, ValidationError};
use crate::core::method::{Group, Method};
use crate::core::request::{CreateBody, CrudCreateRequest, CrudRequest, RequestContext};
use crate::core::validation::validate_body;
use async_trait::async_trait;
use serde_json::Value;

const METHOD: Method = Method::Create;

/// Validates a single entity or a batch for the `create` group
///
/// A batch is rejected as a whole when any item fails; violations carry the
/// item index.
#[derive(Debug, Clone)]
pub struct CreateRequestInterceptor {
    config: InterceptorConfig,
}

impl CreateRequestInterceptor {
    pub fn new(config: InterceptorConfig) -> Self {
        Self { config }
    }

    fn validate_body(&self, body: Option<&Value>) -> Result<CreateBody, CrudError> {
        let InterceptorConfig { factory, rules, .. } = &self.config;

        let Some(Value::Array(items)) = body else {
            let entity = validate_body(body, factory, rules, Group::Create)?;
            return Ok(CreateBody::One(entity));
        };

        if items.is_empty() {
            return Err(CrudError::unprocessable("Request body must not be an empty list"));
        }

        let mut entities = Vec::with_capacity(items.len());
        let mut violations = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match validate_body(Some(item), factory, rules, Group::Create) {
                Ok(entity) => entities.push(entity),
                Err(rejection) => violations.extend(rejection.at_index(index)),
            }
        }

        if violations.is_empty() {
            Ok(CreateBody::Many(entities))
        } else {
            Err(ValidationError::Violations(violations).into())
        }
    }
}

#[async_trait]
impl RequestInterceptor for CreateRequestInterceptor {
    fn method(&self) -> Method {
        METHOD
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<CrudRequest, CrudError> {
        // create takes no overrides, but they are still consumed
        ctx.take_custom_options();

        let body = self.validate_body(ctx.body.as_ref())?;
        Ok(CrudRequest::Create(CrudCreateRequest {
            body,
            options: self.config.request_options(METHOD),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::test_support::base;
    use serde_json::json;

    async fn run(body: Value) -> Result<CrudRequest, CrudError> {
        let mut ctx = RequestContext::new().with_body(body);
        CreateRequestInterceptor::new(base()).process(&mut ctx).await
    }

    #[tokio::test]
    async fn test_single_entity() {
        let request = run(json!({ "name": "a", "age": 3 })).await.unwrap();
        let CrudRequest::Create(CrudCreateRequest {
            body: CreateBody::One(entity),
            ..
        }) = request
        else {
            panic!("expected a single create");
        };
        assert_eq!(entity.get("name"), Some(&json!("a")));
    }

    #[tokio::test]
    async fn test_batch() {
        let request = run(json!([{ "name": "a" }, { "name": "b" }])).await.unwrap();
        let CrudRequest::Create(CrudCreateRequest {
            body: CreateBody::Many(entities),
            ..
        }) = request
        else {
            panic!("expected a batch create");
        };
        assert_eq!(entities.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_rejected_as_a_whole() {
        let err = run(json!([{ "name": "a" }, { "name": "b", "nonamed": 1 }]))
            .await
            .unwrap_err();
        let CrudError::Validation(ValidationError::Violations(violations)) = err else {
            panic!("expected violations");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "[1].nonamed");
    }

    #[tokio::test]
    async fn test_rejects_primary_key_and_bad_shapes() {
        let err = run(json!({ "id": 1, "name": "a" })).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot include value of primary key");

        assert!(run(json!("name")).await.is_err());
        assert!(run(json!([])).await.is_err());

        let mut ctx = RequestContext::new();
        assert!(
            CreateRequestInterceptor::new(base())
                .process(&mut ctx)
                .await
                .is_err()
        );
    }
}
