//! Post queries for Quill GraphQL API

use async_graphql::{Context, ErrorExtensions, Object, Result, ID};

use crate::graphql::types::{Post, PostData};
use crate::services::PostService;

/// Public post queries
#[derive(Default)]
pub struct PostQuery;

#[Object]
impl PostQuery {
    /// A page of posts, newest first. Pages start at 1.
    async fn posts(&self, ctx: &Context<'_>, page: Option<i32>) -> Result<PostData> {
        let posts = ctx.data::<PostService>()?;
        let page = posts.list(page).await.map_err(|e| e.extend())?;
        Ok(PostData::from(page))
    }

    /// A single post by id
    async fn post(&self, ctx: &Context<'_>, id: ID) -> Result<Post> {
        let posts = ctx.data::<PostService>()?;
        let post = posts.get(&id).await.map_err(|e| e.extend())?;
        Ok(Post::from(post))
    }
}
