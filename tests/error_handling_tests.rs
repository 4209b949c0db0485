//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses are properly formatted
//! - Error conversions work correctly
//! - Error matching allows clients to handle specific cases

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use crudgen::prelude::*;
use serde_json::Value;

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_validation_errors_return_422() {
        let errors: Vec<CrudError> = vec![
            CrudError::unprocessable("page must be a positive integer"),
            ValidationError::InvalidFields {
                names: vec!["col".to_string()],
            }
            .into(),
            ValidationError::InvalidBody.into(),
            ValidationError::PrimaryKeyInBody.into(),
            ValidationError::Violations(vec![Violation::new("name", "required", "'name' is required")])
                .into(),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn test_conflict_returns_409() {
        assert_eq!(
            CrudError::conflict("Invalid params").status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_not_found_returns_404() {
        let err: CrudError = RequestError::NotFound {
            resource: "comment".to_string(),
            key: "id=1".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_json_returns_400() {
        let err: CrudError = RequestError::InvalidJson {
            message: "expected value".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_server_side_errors_return_500() {
        let storage: CrudError =
            StorageError::operation("save", anyhow::anyhow!("disk full")).into();
        assert_eq!(storage.error_code(), "STORAGE_ERROR");
        let hook = CrudError::Hook(anyhow::anyhow!("hook failed"));
        let config: CrudError = ConfigError::NoRoutes {
            resource: "comment".to_string(),
        }
        .into();

        for err in [storage, hook, config, CrudError::Internal("oops".to_string())] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

// =============================================================================
// Error Code Tests
// =============================================================================

mod error_code_tests {
    use super::*;

    #[test]
    fn test_validation_error_codes() {
        assert_eq!(
            CrudError::from(ValidationError::InvalidBody).error_code(),
            "INVALID_BODY"
        );
        assert_eq!(
            CrudError::from(ValidationError::PrimaryKeyInBody).error_code(),
            "PRIMARY_KEY_IN_BODY"
        );
        assert_eq!(
            CrudError::from(ValidationError::Violations(vec![])).error_code(),
            "VALIDATION_FAILED"
        );
    }

    #[test]
    fn test_request_error_codes() {
        assert_eq!(CrudError::conflict("x").error_code(), "CONFLICT");
        assert_eq!(
            CrudError::from(RequestError::NotFound {
                resource: "comment".to_string(),
                key: "id=1".to_string(),
            })
            .error_code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_hook_error_code() {
        let err = CrudError::Hook(anyhow::anyhow!("denied"));
        assert_eq!(err.error_code(), "HOOK_ERROR");
    }
}

// =============================================================================
// Error Response Tests
// =============================================================================

mod error_response_tests {
    use super::*;

    #[test]
    fn test_invalid_fields_message() {
        let err: CrudError = ValidationError::InvalidFields {
            names: vec!["a".to_string(), "b".to_string()],
        }
        .into();
        let response = err.to_response();
        assert_eq!(response.status, 422);
        assert_eq!(response.message, "used Invalid name a,b");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "fields": ["a", "b"] }))
        );
    }

    #[test]
    fn test_violations_are_listed_in_details() {
        let err: CrudError = ValidationError::Violations(vec![
            Violation::new("[1].color", "whitelist", "property color should not exist"),
        ])
        .into();
        let details = err.to_response().details.unwrap_or_default();
        assert_eq!(details["violations"][0]["field"], "[1].color");
        assert_eq!(details["violations"][0]["rule"], "whitelist");
    }

    #[test]
    fn test_not_found_details() {
        let err: CrudError = RequestError::NotFound {
            resource: "comment".to_string(),
            key: "id=7".to_string(),
        }
        .into();
        let response = err.to_response();
        assert_eq!(response.message, "comment with key 'id=7' not found");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "resource": "comment", "key": "id=7" }))
        );
    }

    #[test]
    fn test_plain_errors_have_no_details() {
        assert!(CrudError::conflict("Invalid params").to_response().details.is_none());
    }
}

// =============================================================================
// Error Matching Tests
// =============================================================================

mod error_matching_tests {
    use super::*;

    #[test]
    fn test_can_match_violations() {
        let err: CrudError =
            ValidationError::Violations(vec![Violation::new("name", "required", "missing")])
                .into();
        match err {
            CrudError::Validation(ValidationError::Violations(list)) => {
                assert_eq!(list[0].field, "name");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_hook_error_keeps_source() {
        let err = CrudError::Hook(anyhow::anyhow!("denied"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "denied");
    }
}

// =============================================================================
// IntoResponse Tests
// =============================================================================

mod into_response_tests {
    use super::*;

    #[tokio::test]
    async fn test_into_response_body() {
        let response = CrudError::conflict("Invalid params").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&bytes).expect("Body is not JSON");
        assert_eq!(body["status"], 409);
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["message"], "Invalid params");
    }
}
