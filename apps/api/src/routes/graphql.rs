//! GraphQL HTTP routes
//!
//! - `POST /graphql` - Execute a query or mutation
//! - `GET /graphql/playground` - GraphQL Playground (outside production)
//! - `GET /graphql/schema` - Schema definition language
//!
//! The endpoint always answers 200; failures travel in the `errors` array
//! in the shape produced by [`crate::graphql::format`].

use async_graphql_axum::GraphQLRequest;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};

use crate::graphql::{format_response, FormattedResponse, QuillSchema};
use crate::models::Identity;

/// Create the GraphQL router
pub fn graphql_router(schema: QuillSchema, playground: bool) -> Router {
    let mut router = Router::new()
        .route("/", post(graphql_handler))
        .route("/schema", get(graphql_sdl));

    if playground {
        router = router.route("/playground", get(graphql_playground));
    }

    router.with_state(schema)
}

/// Execute a GraphQL request with the identity the gate attached
async fn graphql_handler(
    State(schema): State<QuillSchema>,
    identity: Identity,
    req: GraphQLRequest,
) -> Json<FormattedResponse> {
    let request = req.into_inner().data(identity);
    let response = format_response(schema.execute(request).await);

    if !response.is_ok() {
        tracing::debug!(errors = response.errors.len(), "GraphQL request returned errors");
    }

    Json(response)
}

/// GraphQL Playground handler for development
async fn graphql_playground() -> impl IntoResponse {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql"),
    ))
}

async fn graphql_sdl(State(schema): State<QuillSchema>) -> String {
    schema.sdl()
}
