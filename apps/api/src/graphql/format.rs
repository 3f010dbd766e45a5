//! Uniform GraphQL error shaping
//!
//! Every error leaving the GraphQL endpoint is rendered as
//! `{message, code, data?, locations?, path?}`. `code` comes from the
//! error's `code` extension (set by [`crate::error::ApiError`]) and falls
//! back to 500 for errors raised by the engine itself, such as parse or
//! validation failures.

use async_graphql::{PathSegment, Pos, ServerError, Value};
use serde::Serialize;

/// Code used when an error carries none
pub const DEFAULT_ERROR_CODE: u16 = 500;

const DEFAULT_ERROR_MESSAGE: &str = "An error occurred.";

#[derive(Debug, Serialize)]
pub struct FormattedError {
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Pos>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

#[derive(Debug, Serialize)]
pub struct FormattedResponse {
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FormattedError>,
}

impl FormattedResponse {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn format_error(error: ServerError) -> FormattedError {
    let extension = |name: &str| {
        error
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.get(name))
    };

    let code = match extension("code") {
        Some(Value::Number(code)) => code
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(DEFAULT_ERROR_CODE),
        _ => DEFAULT_ERROR_CODE,
    };
    let data = extension("data")
        .cloned()
        .and_then(|data| data.into_json().ok());

    let message = if error.message.trim().is_empty() {
        DEFAULT_ERROR_MESSAGE.to_string()
    } else {
        error.message
    };

    FormattedError {
        message,
        code,
        data,
        locations: error.locations,
        path: error.path,
    }
}

pub fn format_response(response: async_graphql::Response) -> FormattedResponse {
    FormattedResponse {
        data: response
            .data
            .into_json()
            .unwrap_or(serde_json::Value::Null),
        errors: response.errors.into_iter().map(format_error).collect(),
    }
}
