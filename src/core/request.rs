//! Request-scoped context and the typed descriptors produced by interceptors

use crate::core::metadata::Key;
use crate::core::method::Method;
use crate::core::options::{CustomRequestOptions, ResponseShape};
use crate::core::query::{Pagination, Query, SortOrder, parse_query};
use crate::core::search::SearchClause;
use crate::core::validation::ValidatedEntity;
use axum::http::Extensions;
use serde_json::Value;
use std::collections::HashMap;

/// The parts of an incoming request seen by the pipeline
///
/// Hooks and interceptors communicate through the request-scoped
/// [`Extensions`]: the hook stores its [`CustomRequestOptions`], the
/// interceptor consumes them and attaches the resulting [`CrudRequest`].
#[derive(Debug, Default)]
pub struct RequestContext {
    /// Raw path parameters
    pub params: HashMap<String, String>,

    /// Decoded query string
    pub query: Query,

    /// Parsed JSON body, if any
    pub body: Option<Value>,

    extensions: Extensions,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Decode and set a raw query string
    pub fn with_raw_query(self, raw: &str) -> Result<Self, String> {
        Ok(self.with_query(parse_query(Some(raw))?))
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Store the per-request overrides
    pub fn set_custom_options(&mut self, options: CustomRequestOptions) {
        self.extensions.insert(options);
    }

    /// Consume the per-request overrides, empty when no hook ran
    pub fn take_custom_options(&mut self) -> CustomRequestOptions {
        self.extensions
            .remove::<CustomRequestOptions>()
            .unwrap_or_default()
    }

    /// Attach the resolved descriptor
    pub fn attach(&mut self, request: CrudRequest) {
        self.extensions.insert(request);
    }

    /// Take the resolved descriptor, at most once
    pub fn take_crud_request(&mut self) -> Option<CrudRequest> {
        self.extensions.remove::<CrudRequest>()
    }
}

/// Options carried by every descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestOptions {
    pub response: ResponseShape,
}

/// Payload of a create request
#[derive(Debug, Clone, PartialEq)]
pub enum CreateBody {
    One(ValidatedEntity),
    Many(Vec<ValidatedEntity>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrudCreateRequest {
    pub body: CreateBody,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrudReadOneRequest {
    pub params: Key,
    /// Projection, empty for every column
    pub fields: Vec<String>,
    /// Include soft-deleted rows
    pub soft_deleted: bool,
    /// `None` loads the entity's default relations
    pub relations: Option<Vec<String>>,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrudReadManyRequest {
    /// Equality filters from the query string
    pub filters: SearchClause,
    pub sort: Vec<SortOrder>,
    pub pagination: Pagination,
    pub fields: Vec<String>,
    pub soft_deleted: bool,
    pub relations: Option<Vec<String>>,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrudSearchRequest {
    pub select: Vec<String>,
    /// Clauses OR-ed together, empty for every row
    pub where_: Vec<SearchClause>,
    pub order: Vec<SortOrder>,
    pub take: usize,
    pub skip: usize,
    pub soft_deleted: bool,
    pub relations: Option<Vec<String>>,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrudUpdateRequest {
    pub params: Key,
    pub body: ValidatedEntity,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrudUpsertRequest {
    pub params: Key,
    pub body: ValidatedEntity,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrudDeleteRequest {
    pub params: Key,
    /// Soft delete instead of removing the row
    pub soft_deleted: bool,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrudRecoverRequest {
    pub params: Key,
    pub options: RequestOptions,
}

/// The canonical, policy-checked descriptor of one request
#[derive(Debug, Clone, PartialEq)]
pub enum CrudRequest {
    Create(CrudCreateRequest),
    ReadOne(CrudReadOneRequest),
    ReadMany(CrudReadManyRequest),
    Search(CrudSearchRequest),
    Update(CrudUpdateRequest),
    Upsert(CrudUpsertRequest),
    Delete(CrudDeleteRequest),
    Recover(CrudRecoverRequest),
}

impl CrudRequest {
    pub fn method(&self) -> Method {
        match self {
            CrudRequest::Create(_) => Method::Create,
            CrudRequest::ReadOne(_) => Method::ReadOne,
            CrudRequest::ReadMany(_) => Method::ReadMany,
            CrudRequest::Search(_) => Method::Search,
            CrudRequest::Update(_) => Method::Update,
            CrudRequest::Upsert(_) => Method::Upsert,
            CrudRequest::Delete(_) => Method::Delete,
            CrudRequest::Recover(_) => Method::Recover,
        }
    }

    pub fn options(&self) -> &RequestOptions {
        match self {
            CrudRequest::Create(r) => &r.options,
            CrudRequest::ReadOne(r) => &r.options,
            CrudRequest::ReadMany(r) => &r.options,
            CrudRequest::Search(r) => &r.options,
            CrudRequest::Update(r) => &r.options,
            CrudRequest::Upsert(r) => &r.options,
            CrudRequest::Delete(r) => &r.options,
            CrudRequest::Recover(r) => &r.options,
        }
    }
}
