//! Core module containing fundamental types of the request pipeline

pub mod error;
pub mod field;
pub mod metadata;
pub mod method;
pub mod options;
pub mod policy;
pub mod query;
pub mod repository;
pub mod request;
pub mod search;
pub mod validation;

pub use error::{ConfigError, CrudError, RequestError, StorageError, ValidationError, Violation};
pub use field::{ColumnType, FieldFormat, FieldValue};
pub use metadata::{Column, FactoryOption, Key, PrimaryKey};
pub use method::{Group, Method};
pub use options::{CrudOptions, CustomRequestOptions, RelationsOption, ResponseShape, RouteOptions};
pub use policy::{MethodPolicy, RoutePath, policy};
pub use query::{PaginatedResponse, PaginationMeta, Pagination, SortDirection, SortOrder};
pub use repository::{CrudRepository, FindManyOptions, FindManyResult, FindOptions};
pub use request::{CreateBody, CrudRequest, RequestContext, RequestOptions};
pub use search::{Condition, Operator, SearchClause};
pub use validation::{ValidatedEntity, ValidationRuleSet};
