//! Account queries for Quill GraphQL API
//!
//! - login: Exchange credentials for a bearer token
//! - user: The signed-in caller's profile

use async_graphql::{Context, ErrorExtensions, Object, Result};

use crate::graphql::request_identity;
use crate::graphql::types::{AuthData, User};
use crate::services::AccountService;

/// Account-related queries
#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// Check credentials and return a token.
    ///
    /// Unknown email and wrong password fail with the same error.
    async fn login(&self, ctx: &Context<'_>, email: String, password: String) -> Result<AuthData> {
        let accounts = ctx.data::<AccountService>()?;
        let session = accounts
            .login(&email, &password)
            .await
            .map_err(|e| e.extend())?;
        Ok(AuthData::from(session))
    }

    /// The signed-in caller, with posts resolvable
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        let accounts = ctx.data::<AccountService>()?;
        let user = accounts
            .profile(&request_identity(ctx))
            .await
            .map_err(|e| e.extend())?;
        Ok(User::from(user))
    }
}
