//! # crudgen
//!
//! Declarative REST CRUD route generation for axum.
//!
//! A resource is declared once (entity columns, primary keys, relations,
//! per-route options and validation rules) and the framework generates up to
//! eight routes for it. Every request goes through a stateless interceptor
//! that validates and normalizes it into a typed descriptor before a
//! [`CrudRepository`](core::CrudRepository) executes it.
//!
//! ## Features
//!
//! - **Policy Table**: One fixed HTTP method, path shape and response shape per operation
//! - **Typed Descriptors**: Interceptors resolve params, fields, relations and soft-delete visibility
//! - **Validation Groups**: Body rules apply per lifecycle group (create, update, upsert...)
//! - **Custom Hook**: Override params, fields, relations or visibility for a single request
//! - **Configuration-Based**: Declare resources via YAML configuration
//! - **Pluggable Storage**: Any backend implementing `CrudRepository`, in-memory included
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crudgen::prelude::*;
//!
//! let factory = FactoryOption::from_columns(vec![
//!     Column::primary("id", ColumnType::Integer),
//!     Column::new("body", ColumnType::String),
//! ]);
//!
//! let comments = Resource::builder(factory.clone())
//!     .options(CrudOptions::new("comment").exclude(vec![Method::Recover]))
//!     .build()?;
//!
//! let app = ServerBuilder::new()
//!     .register("/comments", comments, InMemoryRepository::new(factory))
//!     .build()?;
//! ```

pub mod config;
pub mod core;
pub mod interceptor;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        Column, ColumnType, Condition, ConfigError, CreateBody, CrudError, CrudOptions,
        CrudRepository, CrudRequest, CustomRequestOptions, FactoryOption, FieldValue,
        FindManyOptions, FindManyResult, FindOptions, Group, Key, Method, Operator,
        PaginatedResponse, RelationsOption, RequestContext, RequestError, ResponseShape,
        RouteOptions, SearchClause, SortOrder, StorageError, ValidatedEntity, ValidationError,
        ValidationRuleSet, Violation, policy,
    };
    pub use crate::core::validation::{FieldFilter, Rule, RuleKind};

    // === Interceptors ===
    pub use crate::interceptor::{CustomRequestHook, Pipeline, RequestInterceptor};

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::{InMemoryRepository, RelationDef};

    // === Config ===
    pub use crate::config::{ResourceConfig, ResourcesConfig};

    // === Server ===
    pub use crate::server::{CrudExecutor, Resource, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};

    // === Axum ===
    pub use axum::Router;
}
