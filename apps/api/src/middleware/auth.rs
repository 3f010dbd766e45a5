//! Authentication gate
//!
//! [`authenticate`] runs before every route. It reads the `Authorization`
//! header, verifies the bearer token and stores an [`Identity`] in the
//! request extensions. It never rejects: a missing, expired or forged token
//! simply yields [`Identity::Anonymous`], and each operation decides for
//! itself whether that is enough.
//!
//! Handlers read the result back with the [`Identity`] extractor:
//!
//! ```rust,ignore
//! async fn handler(identity: Identity) -> impl IntoResponse {
//!     match identity.user_id() {
//!         Some(id) => format!("Hello, {}!", id),
//!         None => "Hello, guest!".to_string(),
//!     }
//! }
//! ```

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::models::Identity;
use crate::services::TokenService;

/// Extract the bearer token from the Authorization header.
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolve the identity a set of request headers carries
pub fn identify(tokens: &TokenService, headers: &HeaderMap) -> Identity {
    let Some(token) = extract_bearer_token(headers) else {
        return Identity::Anonymous;
    };

    match tokens.verify(token) {
        Ok(user_id) => Identity::User(user_id),
        Err(reason) => {
            tracing::debug!(%reason, "Ignoring invalid bearer token");
            Identity::Anonymous
        }
    }
}

/// Middleware attaching an [`Identity`] to every request
pub async fn authenticate(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = identify(&tokens, request.headers());
    request.extensions_mut().insert(identity);
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Identity>()
            .copied()
            .unwrap_or_default())
    }
}
