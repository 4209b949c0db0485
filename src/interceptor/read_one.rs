//! Read-one interceptor

use super::fields::{check_fields, select_fields};
use super::params::validate_params;
use super::relations::resolve_relations;
use super::{InterceptorConfig, RequestInterceptor};
use crate::core::error::CrudError;
use crate::core::method::Method;
use crate::core::request::{CrudReadOneRequest, CrudRequest, RequestContext};
use async_trait::async_trait;

const METHOD: Method = Method::ReadOne;

/// Resolves the key, projection, soft-delete visibility and relations of a
/// single-row read
#[derive(Debug, Clone)]
pub struct ReadOneRequestInterceptor {
    config: InterceptorConfig,
}

impl ReadOneRequestInterceptor {
    pub fn new(config: InterceptorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RequestInterceptor for ReadOneRequestInterceptor {
    fn method(&self) -> Method {
        METHOD
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<CrudRequest, CrudError> {
        let custom = ctx.take_custom_options();
        let route = self.config.route(METHOD);

        let requested = check_fields(ctx.query.get("fields"), &self.config.factory)?;
        let soft_deleted = self.config.soft_delete(METHOD, custom.soft_deleted);
        let params = validate_params(&ctx.params, &self.config.factory, CrudError::unprocessable)?;

        Ok(CrudRequest::ReadOne(CrudReadOneRequest {
            params,
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
    use crate::core::field::FieldValue;
    use crate::core::options::{CrudOptions, CustomRequestOptions, ResponseShape, RouteOptions};
    use crate::interceptor::test_support::{base, config};

    fn ctx(query: &str) -> RequestContext {
        RequestContext::new()
            .with_params([("id", "7")])
            .with_raw_query(query)
            .unwrap()
    }

    async fn run(config: InterceptorConfig, mut ctx: RequestContext) -> CrudReadOneRequest {
        match ReadOneRequestInterceptor::new(config).process(&mut ctx).await {
            Ok(CrudRequest::ReadOne(request)) => request,
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_defaults_are_resolved() {
        let request = run(base(), ctx("")).await;
        assert_eq!(request.params.get("id"), Some(&FieldValue::Integer(7)));
        assert!(request.fields.is_empty());
        assert!(!request.soft_deleted);
        assert_eq!(request.relations, None);
        assert_eq!(request.options.response, ResponseShape::Entity);
    }

    #[tokio::test]
    async fn test_fields_intersect_with_override() {
        let mut ctx = ctx("fields=name&fields=age");
        ctx.set_custom_options(CustomRequestOptions {
            fields: Some(vec!["age".to_string(), "id".to_string()]),
            ..Default::default()
        });
        let request = run(base(), ctx).await;
        assert_eq!(request.fields, vec!["age".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_field_is_rejected() {
        let mut ctx = ctx("fields=col");
        let err = ReadOneRequestInterceptor::new(base())
            .process(&mut ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "used Invalid name col");
    }

    #[tokio::test]
    async fn test_soft_delete_override_beats_route() {
        let options = CrudOptions::new("base").route(
            METHOD,
            RouteOptions::default().with_soft_delete(false).without_relations(),
        );

        let request = run(config(options.clone()), ctx("")).await;
        assert!(!request.soft_deleted);
        assert_eq!(request.relations, Some(Vec::new()));

        let mut ctx = ctx("");
        ctx.set_custom_options(CustomRequestOptions {
            soft_deleted: Some(true),
            relations: Some(vec!["writer".to_string()]),
            ..Default::default()
        });
        let request = run(config(options), ctx).await;
        assert!(request.soft_deleted);
        assert_eq!(request.relations, Some(vec!["writer".to_string()]));
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let mut ctx = RequestContext::new().with_params([("id", "seven")]);
        let err = ReadOneRequestInterceptor::new(base())
            .process(&mut ctx)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}
