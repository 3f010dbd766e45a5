//! Application assembly
//!
//! Wires repositories into services and services into the axum router.
//! The binary and the integration tests both build the app through here,
//! so they differ only in the store and the hashing cost they pass in.

use argon2::Argon2;
use axum::{
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::error::ApiResult;
use crate::graphql::{build_schema, QuillSchema};
use crate::middleware::authenticate;
use crate::repositories::{DynPostRepository, DynUserRepository};
use crate::routes::{graphql_router, health_router, upload_router, HealthState, UploadState};
use crate::services::{
    AccountService, AssetConfig, AssetCoordinator, HealthService, PostService, TokenConfig,
    TokenService,
};

/// URL prefix under which uploaded images are served
pub const IMAGE_ROUTE: &str = "/image";

/// Every long-lived component the routes need
#[derive(Clone)]
pub struct AppComponents {
    pub tokens: TokenService,
    pub accounts: AccountService,
    pub posts: PostService,
    pub assets: AssetCoordinator,
    pub health: HealthService,
}

impl AppComponents {
    /// Build the services over the given stores
    pub fn assemble(
        users: DynUserRepository,
        posts: DynPostRepository,
        token_config: TokenConfig,
        asset_config: AssetConfig,
        page_size: i64,
        argon2: Argon2<'static>,
    ) -> ApiResult<Self> {
        let tokens = TokenService::new(token_config);
        let accounts = AccountService::with_argon2(users.clone(), tokens.clone(), argon2)?;
        let health = HealthService::new(users, asset_config.upload_dir.clone());
        let assets = AssetCoordinator::new(asset_config, posts.clone());
        let post_service = PostService::new(posts, assets.clone(), page_size);

        Ok(Self {
            tokens,
            accounts,
            posts: post_service,
            assets,
            health,
        })
    }

    pub fn schema(&self) -> QuillSchema {
        build_schema(self.accounts.clone(), self.posts.clone())
    }
}

/// Router settings that do not belong to any single service
#[derive(Clone)]
pub struct RouterOptions {
    /// Serve GraphQL Playground at `/graphql/playground`
    pub playground: bool,
    /// Body cap for `PUT /post-image`
    pub max_upload_bytes: usize,
    pub cors: CorsLayer,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            playground: false,
            max_upload_bytes: 5 * 1024 * 1024,
            cors: CorsLayer::new(),
        }
    }
}

impl RouterOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            playground: !config.is_production(),
            max_upload_bytes: config.max_upload_bytes,
            cors: build_cors_layer(config),
        }
    }
}

/// Build the full HTTP surface
pub fn build_router(components: AppComponents, options: RouterOptions) -> Router {
    let upload_dir = components.assets.upload_dir().to_path_buf();

    Router::new()
        .route("/", get(root))
        .nest(
            "/graphql",
            graphql_router(components.schema(), options.playground),
        )
        .merge(upload_router(
            UploadState::new(components.assets.clone()),
            options.max_upload_bytes,
        ))
        // Nested health routes: /health, /health/live, /health/ready
        .nest("/health", health_router(HealthState::new(components.health)))
        .nest_service(IMAGE_ROUTE, ServeDir::new(upload_dir))
        .layer(from_fn_with_state(components.tokens, authenticate))
        .layer(TraceLayer::new_for_http())
        // Outermost: CORS answers preflights before tracing or the gate
        .layer(options.cors)
}

/// Build the CORS layer based on configuration.
///
/// In production mode:
/// - If `CORS_ORIGINS` is set, only those origins are allowed
/// - If `CORS_ORIGINS` is not set, CORS requests are rejected (no origins allowed)
///
/// In development mode:
/// - If `CORS_ORIGINS` is set, those origins are used
/// - If `CORS_ORIGINS` is not set, permissive CORS is used for convenience
pub fn build_cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                CorsLayer::new()
            } else {
                tracing::info!(
                    "CORS configured with {} allowed origin(s): {:?}",
                    allowed_origins.len(),
                    origins
                );
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                    .max_age(std::time::Duration::from_secs(3600))
            }
        }
        _ if config.is_production() => {
            tracing::warn!(
                "CORS_ORIGINS not configured in production mode. \
                 CORS requests will be rejected."
            );
            CorsLayer::new()
        }
        _ => {
            tracing::warn!(
                "Using permissive CORS in development mode. \
                 Set CORS_ORIGINS for production-like behavior."
            );
            CorsLayer::permissive()
        }
    }
}

async fn root() -> &'static str {
    "Quill API"
}
