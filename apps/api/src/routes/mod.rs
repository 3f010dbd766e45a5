//! HTTP route handlers for the Quill API
//!
//! This module contains all endpoint handlers including:
//! - The GraphQL endpoint, playground and SDL
//! - Image upload
//! - Health check and status endpoints

pub mod graphql;
pub mod health;
pub mod upload;

pub use graphql::graphql_router;
pub use health::{health_router, HealthState};
pub use upload::{upload_router, UploadResponse, UploadState};
