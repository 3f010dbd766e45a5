//! Error handling for the Quill API
//!
//! One error type serves both surfaces: the GraphQL endpoint (through
//! [`ErrorExtensions`]) and the REST upload route (through [`IntoResponse`]).
//! Both render the same `{message, code, data}` triple, where `code` is the
//! numeric HTTP status.

use async_graphql::ErrorExtensions;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::token::TokenError;

/// Message returned in place of store and file-system failures
const MASKED_MESSAGE: &str = "An unexpected error occurred";

/// REST error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,
    /// HTTP status code
    pub code: u16,
    /// Extra detail, e.g. the offending input fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Main API error type
#[derive(Error, Debug)]
pub enum ApiError {
    // ========== Input ==========
    /// Input failed shape or content checks
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    /// Multipart body could not be read
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// Upload body exceeded the configured size limit
    #[error("upload too large: {0}")]
    UploadTooLarge(String),

    // ========== Authentication & Authorization ==========
    /// Login failed. Unknown email and wrong password are indistinguishable.
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// No valid identity where one is required
    #[error("Not authenticated.")]
    NotAuthenticated,

    /// Valid identity without the required ownership
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Token verification failed
    #[error("invalid authentication token: {0}")]
    Token(#[from] TokenError),

    // ========== Resources ==========
    /// Email is already registered
    #[error("A user with email {0} already exists.")]
    DuplicateEmail(String),

    /// Requested resource not found
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    // ========== Infrastructure ==========
    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Asset storage failed
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Internal server error (catch-all for unexpected errors)
    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidCredentials | Self::NotAuthenticated | Self::Token(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotAuthorized(_) => StatusCode::FORBIDDEN,
            Self::DuplicateEmail(_) => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Extra payload surfaced to clients alongside the message
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { fields, .. } if !fields.is_empty() => {
                serde_json::to_value(fields).ok()
            }
            _ => None,
        }
    }

    /// Message safe to show a client. Store and file-system details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Storage(_) => MASKED_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// Create a validation error listing the rejected fields
    pub fn invalid_input(fields: Vec<FieldError>) -> Self {
        Self::Validation {
            message: "Invalid input.".to_string(),
            fields,
        }
    }

    /// An image path that another post already references
    pub fn image_taken() -> Self {
        Self::invalid_input(vec![FieldError::new(
            "imageUrl",
            "Image is already attached to another post.",
        )])
    }

    /// Log the error with appropriate severity based on status code
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Server error occurred");
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(error = %self, status = status.as_u16(), "Authorization error");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Client error");
        }
    }

    fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse {
            message: self.client_message(),
            code: self.status_code().as_u16(),
            data: self.data(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), Json(self.to_response_body())).into_response()
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        self.log();
        let code = i32::from(self.status_code().as_u16());
        let data = self.data();
        async_graphql::Error::new(self.client_message()).extend_with(|_, e| {
            e.set("code", code);
            if let Some(data) = data {
                if let Ok(value) = async_graphql::Value::from_json(data) {
                    e.set("data", value);
                }
            }
        })
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
