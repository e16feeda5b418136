//! Response types for the roster API.
//!
//! This module defines the error response structures and the mapping from
//! [`RosterError`] and request rejections to HTTP responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::RosterError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// Plain acknowledgement body, e.g. `{"status": "deleted"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// What happened.
    pub status: String,
}

impl StatusResponse {
    /// Creates an acknowledgement.
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<RosterError> for ApiErrorResponse {
    fn from(error: RosterError) -> Self {
        let message = error.to_string();
        match error {
            RosterError::ConfigNotFound { .. } | RosterError::ConfigParseError { .. } => {
                ApiErrorResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                )
            }
            RosterError::NotFound { entity, key } => ApiErrorResponse::new(
                StatusCode::NOT_FOUND,
                ApiError::with_details(
                    "NOT_FOUND",
                    message,
                    format!("No {} exists with key '{}'", entity.to_lowercase(), key),
                ),
            ),
            RosterError::ShiftNotResolved { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "SHIFT_NOT_RESOLVED",
                    message,
                    "No active shift version covers the requested date",
                ),
            ),
            RosterError::Unauthorized { reason } => ApiErrorResponse::new(
                StatusCode::UNAUTHORIZED,
                ApiError::new("UNAUTHORIZED", reason),
            ),
            RosterError::Forbidden { reason } => {
                ApiErrorResponse::new(StatusCode::FORBIDDEN, ApiError::new("FORBIDDEN", reason))
            }
            RosterError::Conflict { message } => {
                ApiErrorResponse::new(StatusCode::CONFLICT, ApiError::new("CONFLICT", message))
            }
            RosterError::Validation { message } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::validation_error(message),
            ),
            // Storage details stay in the logs.
            RosterError::Storage { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("STORAGE_ERROR", "Storage operation failed"),
            ),
        }
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        let error = match rejection {
            JsonRejection::JsonDataError(err) => {
                let body_text = err.body_text();
                if body_text.contains("missing field") {
                    ApiError::validation_error(body_text)
                } else {
                    ApiError::malformed_json(body_text)
                }
            }
            JsonRejection::JsonSyntaxError(err) => {
                ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
            }
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
            }
            _ => ApiError::malformed_json("Failed to parse request body"),
        };
        ApiErrorResponse::new(StatusCode::BAD_REQUEST, error)
    }
}

impl From<QueryRejection> for ApiErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        ApiErrorResponse::new(
            StatusCode::BAD_REQUEST,
            ApiError::validation_error(rejection.body_text()),
        )
    }
}

impl From<PathRejection> for ApiErrorResponse {
    fn from(rejection: PathRejection) -> Self {
        ApiErrorResponse::new(
            StatusCode::BAD_REQUEST,
            ApiError::validation_error(rejection.body_text()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_status_codes_follow_error_kind() {
        let cases = [
            (RosterError::not_found("Project", 9), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (RosterError::forbidden("no"), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (RosterError::conflict("dup"), StatusCode::CONFLICT, "CONFLICT"),
            (RosterError::validation("bad"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (
                RosterError::Unauthorized { reason: "no token".to_string() },
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                RosterError::ShiftNotResolved {
                    project_id: 1,
                    shift_code: "MORNING".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                },
                StatusCode::BAD_REQUEST,
                "SHIFT_NOT_RESOLVED",
            ),
        ];

        for (error, status, code) in cases {
            let response: ApiErrorResponse = error.into();
            assert_eq!(response.status, status);
            assert_eq!(response.error.code, code);
        }
    }

    #[test]
    fn test_storage_error_hides_details() {
        let response: ApiErrorResponse = RosterError::Storage {
            message: "database is locked".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.error.message.contains("locked"));
    }
}
