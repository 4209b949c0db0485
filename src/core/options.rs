//! Resource-level and request-level options

use crate::core::method::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Shape of the payload returned by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// The full entity
    #[default]
    Entity,
    /// Only the primary-key columns
    Id,
}

/// Route-level relation setting
///
/// `false` disables relation loading, a list selects relations explicitly.
/// `true` behaves as if the option was absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationsOption {
    Toggle(bool),
    List(Vec<String>),
}

/// Per-route overrides of the policy defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RouteOptions {
    /// Response shape, falls back to the policy default
    pub response: Option<ResponseShape>,

    /// Soft-delete setting
    ///
    /// For reads this is the default visibility of soft-deleted rows, for
    /// delete it selects a soft delete over a hard delete.
    pub soft_delete: Option<bool>,

    pub relations: Option<RelationsOption>,

    /// Columns usable as read-many query filters
    pub allowed_filters: Option<Vec<String>>,

    /// Columns usable in search `where` clauses
    pub allowed_params: Option<Vec<String>>,

    /// Default page size for read-many and search
    pub number_of_take: Option<usize>,

    /// Upper bound for a caller-supplied page size
    pub limit_of_take: Option<usize>,
}

impl RouteOptions {
    pub fn with_response(mut self, response: ResponseShape) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_soft_delete(mut self, soft_delete: bool) -> Self {
        self.soft_delete = Some(soft_delete);
        self
    }

    pub fn with_relations(mut self, relations: Vec<String>) -> Self {
        self.relations = Some(RelationsOption::List(relations));
        self
    }

    pub fn without_relations(mut self) -> Self {
        self.relations = Some(RelationsOption::Toggle(false));
        self
    }

    pub fn with_allowed_filters(mut self, filters: Vec<String>) -> Self {
        self.allowed_filters = Some(filters);
        self
    }

    pub fn with_allowed_params(mut self, params: Vec<String>) -> Self {
        self.allowed_params = Some(params);
        self
    }
}

/// Configuration of one resource
///
/// Immutable once the resource is registered; every interceptor of the
/// resource shares it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudOptions {
    /// Entity name, used in logs and error messages
    pub entity: String,

    #[serde(default)]
    pub routes: BTreeMap<Method, RouteOptions>,

    /// Restrict the generated routes to these methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<Method>>,

    /// Generate every route except these methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<Method>>,
}

impl CrudOptions {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Default::default()
        }
    }

    pub fn route(mut self, method: Method, options: RouteOptions) -> Self {
        self.routes.insert(method, options);
        self
    }

    pub fn only(mut self, methods: Vec<Method>) -> Self {
        self.only = Some(methods);
        self
    }

    pub fn exclude(mut self, methods: Vec<Method>) -> Self {
        self.exclude = Some(methods);
        self
    }

    /// Route options for a method, if any were configured
    pub fn route_options(&self, method: Method) -> Option<&RouteOptions> {
        self.routes.get(&method)
    }

    /// Methods for which a route is generated
    pub fn enabled_methods(&self) -> Vec<Method> {
        Method::ALL
            .into_iter()
            .filter(|method| {
                self.only.as_ref().is_none_or(|only| only.contains(method))
                    && self
                        .exclude
                        .as_ref()
                        .is_none_or(|exclude| !exclude.contains(method))
            })
            .collect()
    }
}

/// Per-request overrides produced by a [`CustomRequestHook`]
///
/// Every field left as `None` means "no override".
///
/// [`CustomRequestHook`]: crate::interceptor::CustomRequestHook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomRequestOptions {
    /// Replacement path parameters (delete, recover and update routes)
    pub params: Option<HashMap<String, String>>,

    /// Relations to load, taken verbatim (an empty list loads none)
    pub relations: Option<Vec<String>>,

    /// Field restriction intersected with the caller's `fields`
    pub fields: Option<Vec<String>>,

    /// Soft-deleted row visibility for reads
    pub soft_deleted: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_methods_defaults_to_all() {
        let options = CrudOptions::new("base");
        assert_eq!(options.enabled_methods(), Method::ALL.to_vec());
    }

    #[test]
    fn test_enabled_methods_only() {
        let options = CrudOptions::new("base").only(vec![Method::ReadOne, Method::Create]);
        assert_eq!(
            options.enabled_methods(),
            vec![Method::Create, Method::ReadOne]
        );
    }

    #[test]
    fn test_enabled_methods_exclude() {
        let options = CrudOptions::new("base").exclude(vec![Method::Recover]);
        let enabled = options.enabled_methods();
        assert_eq!(enabled.len(), 7);
        assert!(!enabled.contains(&Method::Recover));
    }

    #[test]
    fn test_route_options_from_yaml() {
        let yaml = r#"
entity: comment
routes:
  readOne:
    relations: false
    response: id
  readMany:
    relations: [writer]
    softDelete: true
"#;
        let options: CrudOptions = serde_yaml::from_str(yaml).unwrap();
        let read_one = options.route_options(Method::ReadOne).unwrap();
        assert_eq!(read_one.relations, Some(RelationsOption::Toggle(false)));
        assert_eq!(read_one.response, Some(ResponseShape::Id));

        let read_many = options.route_options(Method::ReadMany).unwrap();
        assert_eq!(
            read_many.relations,
            Some(RelationsOption::List(vec!["writer".to_string()]))
        );
        assert_eq!(read_many.soft_delete, Some(true));
        assert!(options.route_options(Method::Create).is_none());
    }

    #[test]
    fn test_route_options_reject_unknown_keys() {
        let yaml = "responce: id\n";
        assert!(serde_yaml::from_str::<RouteOptions>(yaml).is_err());
    }

    #[test]
    fn test_custom_request_options_default_is_empty() {
        let options = CustomRequestOptions::default();
        assert!(options.params.is_none());
        assert!(options.relations.is_none());
        assert!(options.fields.is_none());
        assert!(options.soft_deleted.is_none());
    }
}
