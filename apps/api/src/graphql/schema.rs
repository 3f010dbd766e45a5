//! GraphQL schema builder for Quill
//!
//! This module provides the schema construction for the async-graphql API.

use async_graphql::{EmptySubscription, Schema, SchemaBuilder};

use crate::services::{AccountService, PostService};

use super::mutation::Mutation;
use super::query::Query;

/// The Quill GraphQL schema type
pub type QuillSchema = Schema<Query, Mutation, EmptySubscription>;

fn builder() -> SchemaBuilder<Query, Mutation, EmptySubscription> {
    Schema::build(Query::default(), Mutation::default(), EmptySubscription)
}

/// Create a new GraphQL schema with the provided services
///
/// Resolvers find both services in the schema data; the caller's
/// `Identity` is added per request.
pub fn build_schema(accounts: AccountService, posts: PostService) -> QuillSchema {
    builder().data(accounts).data(posts).finish()
}

/// Schema definition language for the full type graph
pub fn sdl() -> String {
    builder().finish().sdl()
}
