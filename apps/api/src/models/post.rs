//! Post models for Quill

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Post record from the posts table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    /// Unique post identifier
    pub id: Uuid,

    /// Post title
    pub title: String,

    /// Post body
    pub content: String,

    /// Stored path of the attached image, e.g. `image/<file>`
    pub image_url: Option<String>,

    /// Owning user. Fixed at creation.
    pub creator_id: Uuid,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Values needed to insert a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub creator_id: Uuid,
}

/// Replacement field values for an update. The owner is not among them.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// A stored update together with the image reference it replaced, read in
/// the same statement so concurrent edits cannot misreport it.
#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub post: Post,
    pub previous_image_url: Option<String>,
}
