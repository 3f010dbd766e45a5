//! Post service for Quill
//!
//! Listing, reading and owner-gated mutation of posts. An image path may be
//! attached to one post only. Image cleanup runs after the store change it
//! accompanies, so a failed cleanup never undoes or blocks the mutation.

use uuid::Uuid;

use crate::error::{ApiError, ApiResult, FieldError};
use crate::models::{Identity, NewPost, Post, PostChanges};
use crate::repositories::DynPostRepository;
use crate::services::assets::AssetCoordinator;
use crate::services::policy::{self, Operation};

/// Default number of posts per page
pub const DEFAULT_PAGE_SIZE: i64 = 2;

/// Maximum title length
pub const MAX_TITLE_LENGTH: usize = 255;

/// Post fields supplied by a client
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    /// `None` keeps the stored image on update; an empty string clears it
    pub image_url: Option<String>,
}

/// One page of posts
#[derive(Debug, Clone)]
pub struct PostPage {
    /// Number of posts in the store, regardless of page
    pub total_posts: i64,
    /// The page, newest first
    pub posts: Vec<Post>,
}

#[derive(Clone)]
pub struct PostService {
    posts: DynPostRepository,
    assets: AssetCoordinator,
    page_size: i64,
}

impl PostService {
    pub fn new(posts: DynPostRepository, assets: AssetCoordinator, page_size: i64) -> Self {
        Self {
            posts,
            assets,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// List a page of posts. Pages start at 1; pages past the end are empty.
    pub async fn list(&self, page: Option<i32>) -> ApiResult<PostPage> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(ApiError::invalid_input(vec![FieldError::new(
                "page",
                "Page must be 1 or greater.",
            )]));
        }

        let offset = (i64::from(page) - 1) * self.page_size;
        let total_posts = self.posts.count().await?;
        let posts = self.posts.find_page(self.page_size, offset).await?;

        Ok(PostPage { total_posts, posts })
    }

    /// Fetch a single post
    pub async fn get(&self, id: &str) -> ApiResult<Post> {
        let post_id = parse_post_id(id)?;
        self.find(post_id).await
    }

    /// Posts written by `creator_id`, newest first
    pub async fn by_creator(&self, creator_id: Uuid) -> ApiResult<Vec<Post>> {
        self.posts.find_by_creator(creator_id).await
    }

    pub async fn create(&self, identity: &Identity, input: PostInput) -> ApiResult<Post> {
        let creator_id = policy::require_user(Operation::CreatePost, identity)?;
        validate_post_input(&input)?;

        let image_url = normalize_image_url(input.image_url);
        if let Some(image_url) = image_url.as_deref() {
            self.assets.ensure_unclaimed(image_url, None).await?;
        }

        let post = self
            .posts
            .create(NewPost {
                title: input.title.trim().to_string(),
                content: input.content.trim().to_string(),
                image_url,
                creator_id,
            })
            .await?;

        tracing::info!(post_id = %post.id, user_id = %creator_id, "Post created");
        Ok(post)
    }

    /// Replace a post's fields. When the image reference changes, the file
    /// the row held at write time is removed once the new values are stored.
    pub async fn update(&self, identity: &Identity, id: &str, input: PostInput) -> ApiResult<Post> {
        let post_id = parse_post_id(id)?;
        let existing = self.find(post_id).await?;
        policy::require(Operation::UpdatePost, identity, Some(&existing))?;
        validate_post_input(&input)?;

        let image_url = match input.image_url {
            Some(url) => normalize_image_url(Some(url)),
            None => existing.image_url.clone(),
        };
        if image_url != existing.image_url {
            if let Some(image_url) = image_url.as_deref() {
                self.assets.ensure_unclaimed(image_url, Some(post_id)).await?;
            }
        }

        let update = self
            .posts
            .update(
                post_id,
                PostChanges {
                    title: input.title.trim().to_string(),
                    content: input.content.trim().to_string(),
                    image_url,
                },
            )
            .await?
            .ok_or_else(|| ApiError::not_found("post", post_id.to_string()))?;

        self.assets
            .replace(
                update.previous_image_url.as_deref(),
                update.post.image_url.as_deref(),
            )
            .await;

        tracing::info!(post_id = %post_id, "Post updated");
        Ok(update.post)
    }

    /// Delete a post and its image. Always `true`; a missing post is an error.
    pub async fn delete(&self, identity: &Identity, id: &str) -> ApiResult<bool> {
        let post_id = parse_post_id(id)?;
        let existing = self.find(post_id).await?;
        policy::require(Operation::DeletePost, identity, Some(&existing))?;

        if !self.posts.delete(post_id).await? {
            return Err(ApiError::not_found("post", post_id.to_string()));
        }

        if let Some(image_url) = existing.image_url.as_deref() {
            self.assets.discard(image_url).await;
        }

        tracing::info!(post_id = %post_id, "Post deleted");
        Ok(true)
    }

    async fn find(&self, post_id: Uuid) -> ApiResult<Post> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| ApiError::not_found("post", post_id.to_string()))
    }
}

/// Unparseable ids cannot name a post, so they are reported as missing.
fn parse_post_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| ApiError::not_found("post", id))
}

fn normalize_image_url(image_url: Option<String>) -> Option<String> {
    image_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

fn validate_post_input(input: &PostInput) -> ApiResult<()> {
    let mut fields = Vec::new();

    let title = input.title.trim();
    if title.is_empty() {
        fields.push(FieldError::new("title", "Title is required."));
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        fields.push(FieldError::new(
            "title",
            format!("Title must be at most {} characters.", MAX_TITLE_LENGTH),
        ));
    }

    if input.content.trim().is_empty() {
        fields.push(FieldError::new("content", "Content is required."));
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::invalid_input(fields))
    }
}
