//! Post GraphQL types

use async_graphql::{Context, ErrorExtensions, InputObject, Object, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};

use crate::models::Post as DbPost;
use crate::services::{AccountService, PostInput, PostPage};

use super::User;

/// Blog post exposed via GraphQL
pub struct Post {
    inner: DbPost,
}

impl Post {
    pub fn new(post: DbPost) -> Self {
        Self { inner: post }
    }
}

impl From<DbPost> for Post {
    fn from(post: DbPost) -> Self {
        Self::new(post)
    }
}

#[Object]
impl Post {
    /// Unique post identifier
    #[graphql(name = "_id")]
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn title(&self) -> &str {
        &self.inner.title
    }

    async fn content(&self) -> &str {
        &self.inner.content
    }

    /// Stored image path, e.g. `image/<file>`
    async fn image_url(&self) -> Option<&str> {
        self.inner.image_url.as_deref()
    }

    /// The post's author
    async fn creator(&self, ctx: &Context<'_>) -> Result<User> {
        let accounts = ctx.data::<AccountService>()?;
        let user = accounts
            .find(self.inner.creator_id)
            .await
            .map_err(|e| e.extend())?;
        Ok(User::from(user))
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

/// One page of posts
#[derive(SimpleObject)]
pub struct PostData {
    /// Total number of posts across all pages
    pub total_posts: i32,
    /// Posts on this page, newest first
    pub posts: Vec<Post>,
}

impl From<PostPage> for PostData {
    fn from(page: PostPage) -> Self {
        Self {
            total_posts: i32::try_from(page.total_posts).unwrap_or(i32::MAX),
            posts: page.posts.into_iter().map(Post::from).collect(),
        }
    }
}

/// Input for creating or updating a post
#[derive(Debug, InputObject)]
pub struct PostInputData {
    pub title: String,
    pub content: String,
    /// Path returned by `PUT /post-image`. Omit on update to keep the current image.
    pub image_url: Option<String>,
}

impl From<PostInputData> for PostInput {
    fn from(input: PostInputData) -> Self {
        Self {
            title: input.title,
            content: input.content,
            image_url: input.image_url,
        }
    }
}
