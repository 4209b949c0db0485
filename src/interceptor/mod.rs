//! Request interception pipeline
//!
//! Every generated route owns one stateless interceptor that turns the raw
//! request parts into a typed [`CrudRequest`]. The optional
//! [`CustomRequestHook`] runs first and can override params, fields,
//! relations and soft-delete visibility for that single request.
//!
//! ```text
//! request ─▶ CustomRequestHook ─▶ RequestInterceptor ─▶ CrudRequest ─▶ executor
//!              (optional)            (per operation)     (extensions)
//! ```

pub mod create;
pub mod custom;
pub mod delete;
pub mod fields;
pub mod params;
pub mod read_many;
pub mod read_one;
pub mod recover;
pub mod relations;
pub mod search;
pub mod update;
pub mod upsert;

pub use create::CreateRequestInterceptor;
pub use custom::{CustomRequestHook, apply_custom_options};
pub use delete::DeleteRequestInterceptor;
pub use fields::{check_fields, select_fields};
pub use params::validate_params;
pub use read_many::ReadManyRequestInterceptor;
pub use read_one::ReadOneRequestInterceptor;
pub use recover::RecoverRequestInterceptor;
pub use relations::resolve_relations;
pub use search::SearchRequestInterceptor;
pub use update::UpdateRequestInterceptor;
pub use upsert::UpsertRequestInterceptor;

use crate::core::error::CrudError;
use crate::core::metadata::FactoryOption;
use crate::core::method::Method;
use crate::core::options::{CrudOptions, RouteOptions};
use crate::core::policy::{MethodPolicy, policy};
use crate::core::request::{CrudRequest, RequestContext, RequestOptions};
use crate::core::validation::ValidationRuleSet;
use async_trait::async_trait;
use std::sync::Arc;

/// One stage of the pipeline, bound to an operation kind
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Operation kind handled by this interceptor
    fn method(&self) -> Method;

    /// Resolve the descriptor of a request
    ///
    /// Consumes the per-request overrides stored in `ctx`, if any.
    async fn process(&self, ctx: &mut RequestContext) -> Result<CrudRequest, CrudError>;

    /// Resolve the descriptor and attach it to the request
    async fn intercept(&self, ctx: &mut RequestContext) -> Result<(), CrudError> {
        let request = self.process(ctx).await?;
        tracing::debug!(method = %self.method(), ?request, "resolved crud request");
        ctx.attach(request);
        Ok(())
    }
}

/// Shared, read-only configuration of a resource's interceptors
#[derive(Debug, Clone)]
pub struct InterceptorConfig {
    pub options: Arc<CrudOptions>,
    pub factory: Arc<FactoryOption>,
    pub rules: Arc<ValidationRuleSet>,
}

impl InterceptorConfig {
    pub fn new(options: CrudOptions, factory: FactoryOption, rules: ValidationRuleSet) -> Self {
        Self {
            options: Arc::new(options),
            factory: Arc::new(factory),
            rules: Arc::new(rules),
        }
    }

    pub fn entity(&self) -> &str {
        &self.options.entity
    }

    /// Route options of a method, empty when none were configured
    pub fn route(&self, method: Method) -> RouteOptions {
        self.options
            .route_options(method)
            .cloned()
            .unwrap_or_default()
    }

    /// Response options: route setting, else policy default
    pub fn request_options(&self, method: Method) -> RequestOptions {
        let response = self
            .options
            .route_options(method)
            .and_then(|route| route.response)
            .unwrap_or(policy(method).response);
        RequestOptions { response }
    }

    /// Soft-delete setting: override, else route option, else policy default
    pub fn soft_delete(&self, method: Method, override_value: Option<bool>) -> bool {
        override_value
            .or_else(|| {
                self.options
                    .route_options(method)
                    .and_then(|route| route.soft_delete)
            })
            .or(policy(method).default_soft_delete)
            .unwrap_or(false)
    }

    /// Default and maximum page size: route options, else policy
    pub fn take_limits(&self, method: Method) -> (usize, usize) {
        let MethodPolicy {
            number_of_take,
            limit_of_take,
            ..
        } = policy(method);
        let route = self.options.route_options(method);
        let number = route
            .and_then(|route| route.number_of_take)
            .or(number_of_take)
            .unwrap_or(crate::core::policy::DEFAULT_NUMBER_OF_TAKE);
        let limit = route
            .and_then(|route| route.limit_of_take)
            .or(limit_of_take)
            .unwrap_or(crate::core::policy::DEFAULT_LIMIT_OF_TAKE);
        (number, limit)
    }
}

/// Build the interceptor of an operation kind
pub fn interceptor_for(method: Method, config: InterceptorConfig) -> Arc<dyn RequestInterceptor> {
    match method {
        Method::Create => Arc::new(CreateRequestInterceptor::new(config)),
        Method::ReadOne => Arc::new(ReadOneRequestInterceptor::new(config)),
        Method::ReadMany => Arc::new(ReadManyRequestInterceptor::new(config)),
        Method::Search => Arc::new(SearchRequestInterceptor::new(config)),
        Method::Update => Arc::new(UpdateRequestInterceptor::new(config)),
        Method::Upsert => Arc::new(UpsertRequestInterceptor::new(config)),
        Method::Delete => Arc::new(DeleteRequestInterceptor::new(config)),
        Method::Recover => Arc::new(RecoverRequestInterceptor::new(config)),
    }
}

/// Hook followed by interceptor, as mounted on one route
#[derive(Clone)]
pub struct Pipeline {
    hook: Option<Arc<dyn CustomRequestHook>>,
    interceptor: Arc<dyn RequestInterceptor>,
}

impl Pipeline {
    pub fn new(
        interceptor: Arc<dyn RequestInterceptor>,
        hook: Option<Arc<dyn CustomRequestHook>>,
    ) -> Self {
        Self { hook, interceptor }
    }

    pub fn method(&self) -> Method {
        self.interceptor.method()
    }

    /// Run the hook, then the interceptor
    ///
    /// On success the descriptor is attached to `ctx`; the first failure
    /// stops the pipeline.
    pub async fn run(&self, ctx: &mut RequestContext) -> Result<(), CrudError> {
        apply_custom_options(self.hook.as_deref(), ctx).await?;
        self.interceptor.intercept(ctx).await
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("method", &self.interceptor.method())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::field::ColumnType;
    use crate::core::metadata::Column;
    use crate::core::method::Group;
    use crate::core::validation::{Rule, RuleKind};

    /// `base` resource: integer `id`, `name`, `age`, relation `writer`
    pub fn config(options: CrudOptions) -> InterceptorConfig {
        let factory = FactoryOption::from_columns(vec![
            Column::primary("id", ColumnType::Integer),
            Column::new("name", ColumnType::String),
            Column::new("age", ColumnType::Integer),
        ])
        .with_relations(vec!["writer".to_string()]);

        let rules = ValidationRuleSet::new()
            .rule(
                "name",
                Rule::new(RuleKind::Required).groups(&[Group::Create, Group::Upsert]),
            )
            .rule("name", Rule::new(RuleKind::Optional).groups(&[Group::Update]))
            .rule("age", Rule::new(RuleKind::Positive).always());

        InterceptorConfig::new(options, factory, rules)
    }

    pub fn base() -> InterceptorConfig {
        config(CrudOptions::new("base"))
    }
}
