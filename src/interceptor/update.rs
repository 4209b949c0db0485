//! Update interceptor

use super::params::validate_params;
use super::{InterceptorConfig, RequestInterceptor};
use crate::core::error::CrudError;
use crate::core::method::{Group, Method};
use crate::core::request::{CrudRequest, CrudUpdateRequest, RequestContext};
use crate::core::validation::validate_body;
use async_trait::async_trait;

const METHOD: Method = Method::Update;

/// Resolves the key (override params first) and a partial body for the
/// `update` group
#[derive(Debug, Clone)]
pub struct UpdateRequestInterceptor {
    config: InterceptorConfig,
}

impl UpdateRequestInterceptor {
    pub fn new(config: InterceptorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RequestInterceptor for UpdateRequestInterceptor {
    fn method(&self) -> Method {
        METHOD
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<CrudRequest, CrudError> {
        let custom = ctx.take_custom_options();
        let raw_params = custom.params.as_ref().unwrap_or(&ctx.params);
        let params = validate_params(raw_params, &self.config.factory, CrudError::unprocessable)?;

        let body = validate_body(
            ctx.body.as_ref(),
            &self.config.factory,
            &self.config.rules,
            Group::Update,
        )?;

        Ok(CrudRequest::Update(CrudUpdateRequest {
            params,
            body,
            options: self.config.request_options(METHOD),
        }))
    }
}
