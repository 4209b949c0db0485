//! Typed error handling for crudgen
//!
//! Every failure of the request pipeline maps to one [`CrudError`] variant,
//! which carries its HTTP status, a stable error code and optional
//! structured details.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: malformed or unknown input, always `422`
//! - [`RequestError`]: key conflicts (`409`), missing rows (`404`) and
//!   unreadable payloads (`400`)
//! - [`ConfigError`]: invalid resource registration
//! - [`StorageError`]: repository failures
//! - `Hook`: a failure raised by a custom request hook, propagated as-is
//!
//! # Example
//!
//! ```rust,ignore
//! match interceptor.process(&mut ctx).await {
//!     Err(CrudError::Validation(ValidationError::Violations(list))) => {
//!         for violation in list {
//!             println!("{}: {}", violation.field, violation.message);
//!         }
//!     }
//!     Err(e) => eprintln!("{} ({})", e, e.status_code()),
//!     Ok(request) => println!("{:?}", request),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type of the request pipeline
#[derive(Debug)]
pub enum CrudError {
    /// Input validation errors
    Validation(ValidationError),

    /// Request-level errors (conflict, not found, unreadable payload)
    Request(RequestError),

    /// Resource registration errors
    Config(ConfigError),

    /// Repository errors
    Storage(StorageError),

    /// Error raised by a custom request hook
    Hook(anyhow::Error),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for CrudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrudError::Validation(e) => write!(f, "{}", e),
            CrudError::Request(e) => write!(f, "{}", e),
            CrudError::Config(e) => write!(f, "{}", e),
            CrudError::Storage(e) => write!(f, "{}", e),
            CrudError::Hook(e) => write!(f, "{}", e),
            CrudError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for CrudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrudError::Validation(e) => Some(e),
            CrudError::Request(e) => Some(e),
            CrudError::Config(e) => Some(e),
            CrudError::Storage(e) => Some(e),
            CrudError::Hook(e) => Some(&**e),
            CrudError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body
    pub status: u16,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CrudError {
    /// Shorthand for a descriptive `422`
    pub fn unprocessable(message: impl Into<String>) -> Self {
        CrudError::Validation(ValidationError::Unprocessable {
            message: message.into(),
        })
    }

    /// Shorthand for a `409`
    pub fn conflict(message: impl Into<String>) -> Self {
        CrudError::Request(RequestError::Conflict {
            message: message.into(),
        })
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CrudError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CrudError::Request(e) => e.status_code(),
            CrudError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CrudError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CrudError::Hook(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CrudError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CrudError::Validation(e) => e.error_code(),
            CrudError::Request(e) => e.error_code(),
            CrudError::Config(_) => "CONFIG_ERROR",
            CrudError::Storage(_) => "STORAGE_ERROR",
            CrudError::Hook(_) => "HOOK_ERROR",
            CrudError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: self.status_code().as_u16(),
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            CrudError::Validation(ValidationError::Violations(violations)) => {
                Some(serde_json::json!({ "violations": violations }))
            }
            CrudError::Validation(ValidationError::InvalidFields { names }) => {
                Some(serde_json::json!({ "fields": names }))
            }
            CrudError::Request(RequestError::NotFound { resource, key }) => {
                Some(serde_json::json!({ "resource": resource, "key": key }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
///
/// All of them are client errors reported as `422 Unprocessable Entity`.
#[derive(Debug)]
pub enum ValidationError {
    /// Generic malformed input with a descriptive message
    Unprocessable { message: String },

    /// Field names that are not columns of the resource
    InvalidFields { names: Vec<String> },

    /// Body is absent or not a JSON object
    InvalidBody,

    /// Body tries to set a primary-key column
    PrimaryKeyInBody,

    /// Structured list of rule violations
    Violations(Vec<Violation>),
}

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub field: String,
    pub rule: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Unprocessable { message } => write!(f, "{}", message),
            ValidationError::InvalidFields { names } => {
                write!(f, "used Invalid name {}", names.join(","))
            }
            ValidationError::InvalidBody => write!(f, "Request body must be a JSON object"),
            ValidationError::PrimaryKeyInBody => {
                write!(f, "Cannot include value of primary key")
            }
            ValidationError::Violations(violations) => {
                let msgs: Vec<String> = violations
                    .iter()
                    .map(|v| format!("{}: {}", v.field, v.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::Unprocessable { .. } => "UNPROCESSABLE_ENTITY",
            ValidationError::InvalidFields { .. } => "INVALID_FIELDS",
            ValidationError::InvalidBody => "INVALID_BODY",
            ValidationError::PrimaryKeyInBody => "PRIMARY_KEY_IN_BODY",
            ValidationError::Violations(_) => "VALIDATION_FAILED",
        }
    }
}

impl From<ValidationError> for CrudError {
    fn from(err: ValidationError) -> Self {
        CrudError::Validation(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to the request as a whole
#[derive(Debug)]
pub enum RequestError {
    /// The key does not match the expected state of the row
    Conflict { message: String },

    /// No row matches the key
    NotFound { resource: String, key: String },

    /// The payload is not valid JSON
    InvalidJson { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Conflict { message } => write!(f, "{}", message),
            RequestError::NotFound { resource, key } => {
                write!(f, "{} with key '{}' not found", resource, key)
            }
            RequestError::InvalidJson { message } => write!(f, "Invalid JSON: {}", message),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Conflict { .. } => StatusCode::CONFLICT,
            RequestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RequestError::InvalidJson { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Conflict { .. } => "CONFLICT",
            RequestError::NotFound { .. } => "NOT_FOUND",
            RequestError::InvalidJson { .. } => "INVALID_JSON",
        }
    }
}

impl From<RequestError> for CrudError {
    fn from(err: RequestError) -> Self {
        CrudError::Request(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors raised while registering a resource
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("resource '{resource}' declares no primary key")]
    NoPrimaryKey { resource: String },

    #[error("resource '{resource}' sets both `only` and `exclude`")]
    OnlyAndExclude { resource: String },

    #[error("resource '{resource}' has no route enabled")]
    NoRoutes { resource: String },

    #[error("{method} route of '{resource}' references unknown relation '{relation}'")]
    UnknownRelation {
        resource: String,
        method: String,
        relation: String,
    },

    #[error("{context} of '{resource}' references unknown column '{column}'")]
    UnknownColumn {
        resource: String,
        context: String,
        column: String,
    },

    #[error("{method} route of '{resource}' has numberOfTake greater than limitOfTake")]
    InvalidTake { resource: String, method: String },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<ConfigError> for CrudError {
    fn from(err: ConfigError) -> Self {
        CrudError::Config(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by a repository
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage operation '{operation}' failed: {message}")]
    OperationFailed { operation: String, message: String },
}

impl StorageError {
    pub fn operation(operation: &str, err: anyhow::Error) -> Self {
        StorageError::OperationFailed {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for CrudError {
    fn from(err: StorageError) -> Self {
        CrudError::Storage(err)
    }
}
