//! API error handling
//!
//! Domain errors keep their kind as the `error` code of the response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_guest::GuestError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// A workflow rejected the request
    #[error(transparent)]
    Domain(#[from] GuestError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body failed field validation
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(e) => match e {
                GuestError::Validation { .. } | GuestError::InvalidData(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                GuestError::DuplicateDocument(_) | GuestError::InvalidRelation(_) => {
                    StatusCode::CONFLICT
                }
                GuestError::NotFound(_) => StatusCode::NOT_FOUND,
                GuestError::Persistence(port) if port.is_transient() => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                GuestError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Domain(e) => e.kind(),
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Validation { .. } => "validation_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let (message, details) = match self {
            ApiError::Validation { message, details } => (message, Some(details)),
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            error: code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_validation_errors("", &errors, &mut details);
        details.sort();
        ApiError::Validation {
            message: "Request body failed validation".to_string(),
            details,
        }
    }
}

/// Flattens nested validation errors into `path: message` lines
fn collect_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<String>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    match &e.message {
                        Some(message) => out.push(format!("{}: {}", path, message)),
                        None => out.push(format!("{}: {}", path, e.code)),
                    }
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}
