//! User and authentication GraphQL types

use async_graphql::{Context, ErrorExtensions, InputObject, Object, Result, SimpleObject, ID};

use crate::models::User as DbUser;
use crate::services::{PostService, Registration, Session};

use super::Post;

/// User account exposed via GraphQL. The password hash is never exposed.
pub struct User {
    inner: DbUser,
}

impl User {
    pub fn new(user: DbUser) -> Self {
        Self { inner: user }
    }
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self::new(user)
    }
}

#[Object]
impl User {
    /// Unique user identifier
    #[graphql(name = "_id")]
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    /// Display name
    async fn name(&self) -> &str {
        &self.inner.name
    }

    /// Email address
    async fn email(&self) -> &str {
        &self.inner.email
    }

    /// Free-text status line
    async fn status(&self) -> &str {
        &self.inner.status
    }

    /// Posts written by this user, newest first
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let posts = ctx.data::<PostService>()?;
        let owned = posts
            .by_creator(self.inner.id)
            .await
            .map_err(|e| e.extend())?;
        Ok(owned.into_iter().map(Post::from).collect())
    }
}

/// Login result
#[derive(Debug, Clone, SimpleObject)]
pub struct AuthData {
    /// Bearer token for the `Authorization` header
    pub token: String,
    /// Id of the signed-in user
    pub user_id: String,
}

impl From<Session> for AuthData {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user_id: session.user_id.to_string(),
        }
    }
}

/// Input for account registration
#[derive(Debug, InputObject)]
pub struct UserInputData {
    pub name: String,
    /// Must be unique
    pub email: String,
    /// Minimum 8 characters
    pub password: String,
}

impl From<UserInputData> for Registration {
    fn from(input: UserInputData) -> Self {
        Self {
            name: input.name,
            email: input.email,
            password: input.password,
        }
    }
}
