//! GraphQL schema and resolvers for Quill
//!
//! This module contains the async-graphql schema including:
//! - Query resolvers for login, posts and the caller's profile
//! - Mutation resolvers for accounts and posts
//! - Type definitions for all GraphQL objects
//! - The uniform error formatter

pub mod format;
pub mod mutation;
pub mod query;
pub mod schema;
pub mod types;

pub use format::{format_response, FormattedError, FormattedResponse};
pub use schema::{build_schema, sdl, QuillSchema};

use async_graphql::Context;

use crate::models::Identity;

/// Identity attached to the current request by the authentication gate.
/// Requests that never passed through the gate count as anonymous.
pub fn request_identity(ctx: &Context<'_>) -> Identity {
    ctx.data_opt::<Identity>().copied().unwrap_or_default()
}
