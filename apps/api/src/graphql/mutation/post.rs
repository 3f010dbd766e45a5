//! Post mutations for Quill GraphQL API
//!
//! All three require a signed-in caller; update and delete also require
//! that the caller wrote the post.

use async_graphql::{Context, ErrorExtensions, Object, Result, ID};

use crate::graphql::request_identity;
use crate::graphql::types::{Post, PostInputData};
use crate::services::PostService;

/// Post mutations
#[derive(Default)]
pub struct PostMutation;

#[Object]
impl PostMutation {
    async fn create_post(&self, ctx: &Context<'_>, post_input: PostInputData) -> Result<Post> {
        let posts = ctx.data::<PostService>()?;
        let post = posts
            .create(&request_identity(ctx), post_input.into())
            .await
            .map_err(|e| e.extend())?;
        Ok(Post::from(post))
    }

    /// Replace a post's fields. Omitting `imageUrl` keeps the current image;
    /// a new path removes the old file.
    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: ID,
        post_input: PostInputData,
    ) -> Result<Post> {
        let posts = ctx.data::<PostService>()?;
        let post = posts
            .update(&request_identity(ctx), &id, post_input.into())
            .await
            .map_err(|e| e.extend())?;
        Ok(Post::from(post))
    }

    /// Delete a post and its image
    async fn delete_post(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        let posts = ctx.data::<PostService>()?;
        posts
            .delete(&request_identity(ctx), &id)
            .await
            .map_err(|e| e.extend())
    }
}
