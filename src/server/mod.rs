//! Server module: resource registration, execution and axum routing
//!
//! A [`Resource`] turns its configuration into a route table; the
//! [`ServerBuilder`] mounts route tables on an axum router, each route
//! running hook, interceptor and [`CrudExecutor`] in order.

pub mod builder;
pub mod executor;
pub mod resource;
pub mod router;

pub use builder::ServerBuilder;
pub use executor::{CrudExecutor, CrudResponse};
pub use resource::{Resource, ResourceBuilder, RouteSpec};
pub use router::build_resource_routes;
