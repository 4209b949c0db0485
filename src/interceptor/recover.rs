//! Recover interceptor

use super::params::validate_params;
use super::{InterceptorConfig, RequestInterceptor};
use crate::core::error::CrudError;
use crate::core::method::Method;
use crate::core::request::{CrudRecoverRequest, CrudRequest, RequestContext};
use async_trait::async_trait;

const METHOD: Method = Method::Recover;

#[derive(Debug, Clone)]
pub struct RecoverRequestInterceptor {
    config: InterceptorConfig,
}

impl RecoverRequestInterceptor {
    pub fn new(config: InterceptorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RequestInterceptor for RecoverRequestInterceptor {
    fn method(&self) -> Method {
        METHOD
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<CrudRequest, CrudError> {
        let custom = ctx.take_custom_options();
        let raw_params = custom.params.as_ref().unwrap_or(&ctx.params);
        let params = validate_params(raw_params, &self.config.factory, CrudError::unprocessable)?;

        Ok(CrudRequest::Recover(CrudRecoverRequest {
            params,
            options: self.config.request_options(METHOD),
        }))
    }
}
