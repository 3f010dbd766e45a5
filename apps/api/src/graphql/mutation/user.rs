//! Account mutations for Quill GraphQL API
//!
//! - createUser: Register a new account
//! - updateStatus: Replace the signed-in caller's status line

use async_graphql::{Context, ErrorExtensions, Object, Result};

use crate::graphql::request_identity;
use crate::graphql::types::{User, UserInputData};
use crate::services::AccountService;

/// Account mutations
#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    /// Register a new account.
    ///
    /// # Errors
    /// - 422 with the rejected fields in `data` when input is invalid
    /// - 409 when the email is already registered
    async fn create_user(&self, ctx: &Context<'_>, user_input: UserInputData) -> Result<User> {
        let accounts = ctx.data::<AccountService>()?;
        let user = accounts
            .register(user_input.into())
            .await
            .map_err(|e| e.extend())?;
        Ok(User::from(user))
    }

    /// Set the signed-in caller's status line
    async fn update_status(&self, ctx: &Context<'_>, status: String) -> Result<User> {
        let accounts = ctx.data::<AccountService>()?;
        let user = accounts
            .update_status(&request_identity(ctx), &status)
            .await
            .map_err(|e| e.extend())?;
        Ok(User::from(user))
    }
}
