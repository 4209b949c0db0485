//! Resource registration and route table generation

use crate::core::error::ConfigError;
use crate::core::metadata::FactoryOption;
use crate::core::method::Method;
use crate::core::options::{CrudOptions, RelationsOption};
use crate::core::policy::{RoutePath, policy};
use crate::core::validation::ValidationRuleSet;
use crate::interceptor::{
    CustomRequestHook, InterceptorConfig, Pipeline, RequestInterceptor, interceptor_for,
};
use axum::http;
use std::sync::Arc;

/// One generated route
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub method: Method,
    pub http_method: http::Method,
    pub path: RoutePath,
    pub pipeline: Pipeline,
}

/// A validated resource with its route table
///
/// # Example
///
/// ```rust,ignore
/// let resource = Resource::builder(factory)
///     .options(CrudOptions::new("comment").exclude(vec![Method::Recover]))
///     .rules(rules)
///     .build()?;
///
/// for (method, http_method, path) in resource.paths("/comments") {
///     println!("{} {} ({})", http_method, path, method);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Resource {
    config: InterceptorConfig,
    routes: Vec<RouteSpec>,
}

impl Resource {
    pub fn builder(factory: FactoryOption) -> ResourceBuilder {
        ResourceBuilder {
            factory,
            options: CrudOptions::default(),
            rules: ValidationRuleSet::default(),
            hook: None,
        }
    }

    /// Entity name
    pub fn name(&self) -> &str {
        self.config.entity()
    }

    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    /// Routes of the enabled methods, in method order
    pub fn route_table(&self) -> &[RouteSpec] {
        &self.routes
    }

    pub fn route(&self, method: Method) -> Option<&RouteSpec> {
        self.routes.iter().find(|route| route.method == method)
    }

    /// Concrete path of a route under `prefix`
    pub fn render_path(&self, route: &RouteSpec, prefix: &str) -> String {
        route
            .path
            .render(prefix, &self.config.factory.primary_key_names())
    }

    /// Every route as `(method, http method, path)` under `prefix`
    pub fn paths(&self, prefix: &str) -> Vec<(Method, http::Method, String)> {
        self.routes
            .iter()
            .map(|route| {
                (
                    route.method,
                    route.http_method.clone(),
                    self.render_path(route, prefix),
                )
            })
            .collect()
    }
}

/// Builder validating a resource's configuration
pub struct ResourceBuilder {
    factory: FactoryOption,
    options: CrudOptions,
    rules: ValidationRuleSet,
    hook: Option<Arc<dyn CustomRequestHook>>,
}

impl ResourceBuilder {
    pub fn options(mut self, options: CrudOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rules(mut self, rules: ValidationRuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Run a hook before every interceptor of the resource
    pub fn hook(mut self, hook: impl CustomRequestHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn shared_hook(mut self, hook: Arc<dyn CustomRequestHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Validate the configuration and generate the route table
    pub fn build(self) -> Result<Resource, ConfigError> {
        self.validate()?;

        let methods = self.options.enabled_methods();
        let config = InterceptorConfig::new(self.options, self.factory, self.rules);
        let routes: Vec<RouteSpec> = methods
            .into_iter()
            .map(|method| {
                let policy = policy(method);
                let interceptor: Arc<dyn RequestInterceptor> =
                    interceptor_for(method, config.clone());
                RouteSpec {
                    method,
                    http_method: policy.http_method,
                    path: policy.path,
                    pipeline: Pipeline::new(interceptor, self.hook.clone()),
                }
            })
            .collect();

        tracing::info!(
            resource = %config.entity(),
            routes = routes.len(),
            "registered crud resource"
        );

        Ok(Resource { config, routes })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let resource = self.options.entity.clone();

        if self.factory.primary_keys.is_empty() {
            return Err(ConfigError::NoPrimaryKey { resource });
        }
        if self.options.only.is_some() && self.options.exclude.is_some() {
            return Err(ConfigError::OnlyAndExclude { resource });
        }
        if self.options.enabled_methods().is_empty() {
            return Err(ConfigError::NoRoutes { resource });
        }

        for (method, route) in &self.options.routes {
            if let Some(RelationsOption::List(relations)) = &route.relations {
                if let Some(relation) = relations.iter().find(|r| !self.factory.has_relation(r)) {
                    return Err(ConfigError::UnknownRelation {
                        resource,
                        method: method.to_string(),
                        relation: relation.clone(),
                    });
                }
            }

            let columns = [
                ("allowedFilters", &route.allowed_filters),
                ("allowedParams", &route.allowed_params),
            ];
            for (context, names) in columns {
                let unknown = names
                    .iter()
                    .flatten()
                    .find(|name| !self.factory.has_column(name));
                if let Some(column) = unknown {
                    return Err(ConfigError::UnknownColumn {
                        resource,
                        context: format!("{} of {}", context, method),
                        column: column.clone(),
                    });
                }
            }

            let defaults = policy(*method);
            let number = route.number_of_take.or(defaults.number_of_take);
            let limit = route.limit_of_take.or(defaults.limit_of_take);
            if let (Some(number), Some(limit)) = (number, limit) {
                if number == 0 || number > limit {
                    return Err(ConfigError::InvalidTake {
                        resource,
                        method: method.to_string(),
                    });
                }
            }
        }

        self.rules.check_columns(&resource, &self.factory)
    }
}
