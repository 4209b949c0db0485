//! Upsert interceptor

use super::params::validate_params;
use super::{InterceptorConfig, RequestInterceptor};
use crate::core::error::CrudError;
use crate::core::method::{Group, Method};
use crate::core::request::{CrudRequest, CrudUpsertRequest, RequestContext};
use crate::core::validation::validate_body;
use async_trait::async_trait;

const METHOD: Method = Method::Upsert;

/// Resolves the key and a full body for the `upsert` group
///
/// A key that does not parse is a conflict rather than a validation error.
#[derive(Debug, Clone)]
pub struct UpsertRequestInterceptor {
    config: InterceptorConfig,
}

impl UpsertRequestInterceptor {
    pub fn new(config: InterceptorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RequestInterceptor for UpsertRequestInterceptor {
    fn method(&self) -> Method {
        METHOD
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<CrudRequest, CrudError> {
        ctx.take_custom_options();

        let params = validate_params(&ctx.params, &self.config.factory, |_| {
            CrudError::conflict("Invalid params")
        })?;
        let body = validate_body(
            ctx.body.as_ref(),
            &self.config.factory,
            &self.config.rules,
            Group::Upsert,
        )?;

        Ok(CrudRequest::Upsert(CrudUpsertRequest {
            params,
            body,
            options: self.config.request_options(METHOD),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::test_support::base;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn run(id: &str, body: serde_json::Value) -> Result<CrudRequest, CrudError> {
        let mut ctx = RequestContext::new().with_params([("id", id)]).with_body(body);
        UpsertRequestInterceptor::new(base()).process(&mut ctx).await
    }

    #[tokio::test]
    async fn test_valid_upsert() {
        let request = run("3", json!({ "name": "a" })).await.unwrap();
        assert!(matches!(request, CrudRequest::Upsert(_)));
    }

    #[tokio::test]
    async fn test_invalid_key_is_conflict() {
        let err = run("abc", json!({ "name": "a" })).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Invalid params");
    }

    #[tokio::test]
    async fn test_body_requires_upsert_fields() {
        let err = run("3", json!({ "age": 2 })).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
