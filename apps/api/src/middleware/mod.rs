//! Middleware components for Quill API
//!
//! - `authenticate`: attaches an `Identity` to every request, never rejects
//! - `Identity` extractor for handlers (implemented in `auth`)

pub mod auth;

pub use auth::{authenticate, extract_bearer_token, identify};
