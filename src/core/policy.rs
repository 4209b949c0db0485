//! Library-wide default behavior per operation kind

use crate::core::method::Method;
use crate::core::options::ResponseShape;
use axum::http;

/// Default page size for read-many and search
pub const DEFAULT_NUMBER_OF_TAKE: usize = 20;

/// Default upper bound for a caller-supplied page size
pub const DEFAULT_LIMIT_OF_TAKE: usize = 100;

/// Path suffix of a generated route, relative to the resource prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePath {
    /// `/{prefix}`
    Root,
    /// `/{prefix}/search`
    Search,
    /// `/{prefix}/{pk..}`
    Key,
    /// `/{prefix}/{pk..}/recover`
    KeyRecover,
}

impl RoutePath {
    /// Whether the path carries the primary key
    pub fn uses_params(&self) -> bool {
        matches!(self, RoutePath::Key | RoutePath::KeyRecover)
    }

    /// Render the axum path template for a resource prefix and its primary keys
    ///
    /// Composite keys produce one path segment per key column.
    pub fn render(&self, prefix: &str, primary_keys: &[&str]) -> String {
        let prefix = prefix.trim_end_matches('/');
        let key_segments: String = primary_keys
            .iter()
            .map(|name| format!("/{{{}}}", name))
            .collect();

        match self {
            RoutePath::Root => {
                if prefix.is_empty() {
                    "/".to_string()
                } else {
                    prefix.to_string()
                }
            }
            RoutePath::Search => format!("{}/search", prefix),
            RoutePath::Key => format!("{}{}", prefix, key_segments),
            RoutePath::KeyRecover => format!("{}{}/recover", prefix, key_segments),
        }
    }
}

/// Default behavior of one operation kind
#[derive(Debug, Clone, PartialEq)]
pub struct MethodPolicy {
    pub method: Method,
    pub http_method: http::Method,
    pub path: RoutePath,
    pub response: ResponseShape,

    /// Default soft-delete setting, `None` when the method has no such notion
    pub default_soft_delete: Option<bool>,

    /// Default page size, for paginated methods
    pub number_of_take: Option<usize>,

    /// Maximum page size, for paginated methods
    pub limit_of_take: Option<usize>,
}

impl MethodPolicy {
    /// Whether the route path carries the primary key
    pub fn uses_params(&self) -> bool {
        self.path.uses_params()
    }
}

/// Look up the policy of an operation kind
pub fn policy(method: Method) -> MethodPolicy {
    let (http_method, path, default_soft_delete, paginated) = match method {
        Method::Create => (http::Method::POST, RoutePath::Root, None, false),
        Method::ReadOne => (http::Method::GET, RoutePath::Key, Some(false), false),
        Method::ReadMany => (http::Method::GET, RoutePath::Root, Some(false), true),
        Method::Search => (http::Method::POST, RoutePath::Search, Some(false), true),
        Method::Update => (http::Method::PATCH, RoutePath::Key, None, false),
        Method::Upsert => (http::Method::PUT, RoutePath::Key, None, false),
        Method::Delete => (http::Method::DELETE, RoutePath::Key, Some(true), false),
        Method::Recover => (http::Method::POST, RoutePath::KeyRecover, None, false),
    };

    MethodPolicy {
        method,
        http_method,
        path,
        response: ResponseShape::Entity,
        default_soft_delete,
        number_of_take: paginated.then_some(DEFAULT_NUMBER_OF_TAKE),
        limit_of_take: paginated.then_some(DEFAULT_LIMIT_OF_TAKE),
    }
}
