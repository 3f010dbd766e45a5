//! Shared utility functions for repositories

use crate::error::ApiError;

// ============================================================================
// SQL Column Constants
// ============================================================================

/// SQL columns for user queries
pub const USER_COLUMNS: &str = r#"
    id, name, email, password_hash, status,
    created_at, updated_at
"#;

/// SQL columns for post queries
pub const POST_COLUMNS: &str = r#"
    id, title, content, image_url, creator_id,
    created_at, updated_at
"#;

/// Name of the unique index guarding `users.email`
pub const USERS_EMAIL_UNIQUE: &str = "users_email_key";

/// Name of the unique index guarding `posts.image_url`
pub const POSTS_IMAGE_URL_UNIQUE: &str = "posts_image_url_key";

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Map an insert failure on `users`, turning the email uniqueness
/// violation into [`ApiError::DuplicateEmail`].
pub fn map_user_insert_error(err: sqlx::Error, email: &str) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation()
                && db_err.constraint().map_or(true, |c| c == USERS_EMAIL_UNIQUE) =>
        {
            ApiError::DuplicateEmail(email.to_string())
        }
        _ => ApiError::Database(err),
    }
}

/// Map a write failure on `posts`, turning the image uniqueness violation
/// into the same field error the service reports.
pub fn map_post_write_error(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation()
                && db_err.constraint() == Some(POSTS_IMAGE_URL_UNIQUE) =>
        {
            ApiError::image_taken()
        }
        _ => ApiError::Database(err),
    }
}
