//! Delete interceptor

use super::params::validate_params;
use super::{InterceptorConfig, RequestInterceptor};
use crate::core::error::CrudError;
use crate::core::method::Method;
use crate::core::request::{CrudDeleteRequest, CrudRequest, RequestContext};
use async_trait::async_trait;

const METHOD: Method = Method::Delete;

/// Resolves the key (override params first) and whether to soft delete
#[derive(Debug, Clone)]
pub struct DeleteRequestInterceptor {
    config: InterceptorConfig,
}

impl DeleteRequestInterceptor {
    pub fn new(config: InterceptorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RequestInterceptor for DeleteRequestInterceptor {
    fn method(&self) -> Method {
        METHOD
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<CrudRequest, CrudError> {
        let custom = ctx.take_custom_options();
        let raw_params = custom.params.as_ref().unwrap_or(&ctx.params);
        let params = validate_params(raw_params, &self.config.factory, CrudError::unprocessable)?;

        // the soft-delete override only concerns read visibility
        let soft_deleted = self.config.soft_delete(METHOD, None);

        Ok(CrudRequest::Delete(CrudDeleteRequest {
            params,
            soft_deleted,
            options: self.config.request_options(METHOD),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use crate::core::options::{CrudOptions, CustomRequestOptions, RouteOptions};
    use crate::interceptor::test_support::{base, config};
    use std::collections::HashMap;

    async fn run(config: InterceptorConfig, mut ctx: RequestContext) -> CrudDeleteRequest {
        match DeleteRequestInterceptor::new(config).process(&mut ctx).await {
            Ok(CrudRequest::Delete(request)) => request,
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_soft_delete_by_default() {
        let request = run(base(), RequestContext::new().with_params([("id", "1")])).await;
        assert!(request.soft_deleted);
    }

    #[tokio::test]
    async fn test_route_can_select_hard_delete() {
        let options = CrudOptions::new("base")
            .route(METHOD, RouteOptions::default().with_soft_delete(false));
        let request = run(config(options), RequestContext::new().with_params([("id", "1")])).await;
        assert!(!request.soft_deleted);
    }

    #[tokio::test]
    async fn test_override_params() {
        let mut ctx = RequestContext::new().with_params([("id", "1")]);
        ctx.set_custom_options(CustomRequestOptions {
            params: Some(HashMap::from([("id".to_string(), "2".to_string())])),
            ..Default::default()
        });
        let request = run(base(), ctx).await;
        assert_eq!(request.params.get("id"), Some(&FieldValue::Integer(2)));
    }
}
