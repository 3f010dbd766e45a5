//! Post repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::utils::{map_post_write_error, POST_COLUMNS};
use crate::error::ApiResult;
use crate::models::{NewPost, Post, PostChanges, PostUpdate};

/// Store operations on posts
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post with both timestamps set to now
    async fn create(&self, post: NewPost) -> ApiResult<Post>;

    /// Find a post by its unique ID
    async fn find_by_id(&self, post_id: Uuid) -> ApiResult<Option<Post>>;

    /// One page of posts, newest first
    async fn find_page(&self, limit: i64, offset: i64) -> ApiResult<Vec<Post>>;

    /// Total number of posts
    async fn count(&self) -> ApiResult<i64>;

    /// All posts owned by a user, newest first
    async fn find_by_creator(&self, creator_id: Uuid) -> ApiResult<Vec<Post>>;

    /// Replace title, content and image and bump `updated_at`, reporting the
    /// image reference the row held just before the write.
    /// Returns `None` if the post does not exist.
    async fn update(&self, post_id: Uuid, changes: PostChanges)
        -> ApiResult<Option<PostUpdate>>;

    /// Remove a post. Returns whether a row was removed.
    async fn delete(&self, post_id: Uuid) -> ApiResult<bool>;

    /// Whether any live post other than `except` references one of `image_urls`
    async fn image_in_use(&self, image_urls: &[String], except: Option<Uuid>)
        -> ApiResult<bool>;
}

/// PostgreSQL-backed post repository
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    /// Create a new PgPostRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: NewPost) -> ApiResult<Post> {
        let sql = format!(
            r#"
            INSERT INTO posts (title, content, image_url, creator_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.image_url)
            .bind(post.creator_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_write_error)?)
    }

    async fn find_by_id(&self, post_id: Uuid) -> ApiResult<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_page(&self, limit: i64, offset: i64) -> ApiResult<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count(&self) -> ApiResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_creator(&self, creator_id: Uuid) -> ApiResult<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE creator_id = $1 ORDER BY created_at DESC",
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(
        &self,
        post_id: Uuid,
        changes: PostChanges,
    ) -> ApiResult<Option<PostUpdate>> {
        // The locked subquery yields the row as it was before this write
        let row = sqlx::query_as::<_, UpdatedPostRow>(
            r#"
            UPDATE posts p
            SET title = $1, content = $2, image_url = $3, updated_at = NOW()
            FROM (SELECT id, image_url FROM posts WHERE id = $4 FOR UPDATE) old
            WHERE p.id = old.id
            RETURNING p.id, p.title, p.content, p.image_url, p.creator_id,
                      p.created_at, p.updated_at,
                      old.image_url AS previous_image_url
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.image_url)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_write_error)?;

        Ok(row.map(|row| PostUpdate {
            post: row.post,
            previous_image_url: row.previous_image_url,
        }))
    }

    async fn delete(&self, post_id: Uuid) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn image_in_use(&self, image_urls: &[String], except: Option<Uuid>) -> ApiResult<bool> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM posts
                WHERE image_url = ANY($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(image_urls)
        .bind(except)
        .fetch_one(&self.pool)
        .await?)
    }
}

/// `UPDATE .. RETURNING` row carrying the image the post held before
#[derive(sqlx::FromRow)]
struct UpdatedPostRow {
    #[sqlx(flatten)]
    post: Post,
    previous_image_url: Option<String>,
}
