//! Router builder for resource routes

use super::executor::CrudExecutor;
use super::resource::{Resource, RouteSpec};
use crate::core::error::{CrudError, RequestError};
use crate::core::method::Method;
use crate::core::query::parse_query;
use crate::core::repository::CrudRepository;
use crate::core::request::RequestContext;
use crate::interceptor::Pipeline;
use anyhow::{Result, anyhow};
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter, on};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// State of one generated route
#[derive(Clone)]
pub struct RouteState {
    pipeline: Pipeline,
    executor: Arc<CrudExecutor>,
}

impl RouteState {
    fn method(&self) -> Method {
        self.pipeline.method()
    }
}

/// Build the routes of a resource under `prefix`
///
/// Routes sharing a path (e.g. read-one, update, upsert and delete on
/// `/{prefix}/{id}`) are merged into a single method router:
/// - POST   /{prefix}                 - Create
/// - GET    /{prefix}                 - Read many
/// - POST   /{prefix}/search          - Search
/// - GET    /{prefix}/{pk}            - Read one
/// - PATCH  /{prefix}/{pk}            - Update
/// - PUT    /{prefix}/{pk}            - Upsert
/// - DELETE /{prefix}/{pk}            - Delete
/// - POST   /{prefix}/{pk}/recover    - Recover
pub fn build_resource_routes(
    prefix: &str,
    resource: &Resource,
    repository: Arc<dyn CrudRepository>,
) -> Result<Router> {
    let executor = Arc::new(CrudExecutor::new(
        resource.name(),
        resource.config().factory.clone(),
        repository,
    ));

    let mut by_path: IndexMap<String, MethodRouter> = IndexMap::new();
    for route in resource.route_table() {
        let path = resource.render_path(route, prefix);
        let method_router = method_router(route, executor.clone())?;

        let merged = match by_path.shift_remove(&path) {
            Some(existing) => existing.merge(method_router),
            None => method_router,
        };
        by_path.insert(path, merged);
    }

    Ok(by_path
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(&path, method_router)
        }))
}

fn method_router(route: &RouteSpec, executor: Arc<CrudExecutor>) -> Result<MethodRouter> {
    let filter = MethodFilter::try_from(route.http_method.clone())
        .map_err(|e| anyhow!("Unsupported HTTP method for {}: {}", route.method, e))?;

    let state = RouteState {
        pipeline: route.pipeline.clone(),
        executor,
    };

    let method_router = if route.path.uses_params() {
        on(filter, keyed_handler).with_state(state)
    } else {
        on(filter, collection_handler).with_state(state)
    };
    Ok(method_router)
}

/// Handler for routes carrying the primary key in their path
async fn keyed_handler(
    State(state): State<RouteState>,
    Path(params): Path<HashMap<String, String>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    dispatch(&state, params, query, body).await
}

/// Handler for collection routes
async fn collection_handler(
    State(state): State<RouteState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    dispatch(&state, HashMap::new(), query, body).await
}

async fn dispatch(
    state: &RouteState,
    params: HashMap<String, String>,
    query: Option<String>,
    body: Bytes,
) -> Response {
    match run(state, params, query, body).await {
        Ok(response) => response.into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                tracing::error!(method = %state.method(), %status, error = %err, "crud request failed");
            } else {
                tracing::warn!(method = %state.method(), %status, error = %err, "crud request rejected");
            }
            err.into_response()
        }
    }
}

async fn run(
    state: &RouteState,
    params: HashMap<String, String>,
    query: Option<String>,
    body: Bytes,
) -> Result<super::executor::CrudResponse, CrudError> {
    let query = parse_query(query.as_deref()).map_err(CrudError::unprocessable)?;
    let body = parse_body(&body)?;

    let mut ctx = RequestContext::new().with_params(params).with_query(query);
    ctx.body = body;

    state.pipeline.run(&mut ctx).await?;
    state.executor.execute(&mut ctx).await
}

/// Empty payloads are absent; anything else must be JSON
fn parse_body(bytes: &[u8]) -> Result<Option<Value>, CrudError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes).map(Some).map_err(|e| {
        RequestError::InvalidJson {
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b"").unwrap(), None);
        assert_eq!(parse_body(b"  \n").unwrap(), None);
        assert_eq!(
            parse_body(br#"{"name":"a"}"#).unwrap(),
            Some(serde_json::json!({ "name": "a" }))
        );
        let err = parse_body(b"{name").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
