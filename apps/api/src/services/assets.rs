//! Image asset lifecycle
//!
//! Posts reference images by a stored path of the form `image/<file>`,
//! which maps to `<upload_dir>/<file>` on disk. The coordinator writes new
//! uploads and removes superseded files once the post mutation that
//! replaced them has been persisted.
//!
//! An image path belongs to at most one post. Cleanup is a single
//! best-effort attempt: failures are logged and swallowed, and a file still
//! referenced by any live post is never removed.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::repositories::DynPostRepository;

/// Content types accepted for upload
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpg", "image/jpeg"];

/// URL segment under which uploads are served
pub const PUBLIC_PREFIX: &str = "image";

/// Check an upload's declared content type against [`ALLOWED_IMAGE_TYPES`]
pub fn is_allowed_image(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES.contains(&essence.as_str())
}

/// Asset storage configuration
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Directory holding uploaded images
    pub upload_dir: PathBuf,
}

impl AssetConfig {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }
}

/// Result of a cleanup attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The file was deleted
    Removed,
    /// No old path, or the path did not change
    NothingToDo,
    /// A live post still points at the file
    StillReferenced,
    /// The path does not name a file inside the upload directory
    Rejected,
    /// The deletion was attempted and failed; already logged
    Failed,
}

/// Ties image files to the posts that reference them
#[derive(Clone)]
pub struct AssetCoordinator {
    upload_dir: PathBuf,
    posts: DynPostRepository,
}

impl AssetCoordinator {
    pub fn new(config: AssetConfig, posts: DynPostRepository) -> Self {
        Self {
            upload_dir: config.upload_dir,
            posts,
        }
    }

    /// Directory holding uploaded images
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Map a stored path (`image/<file>` or `/image/<file>`) to its file on
    /// disk. Anything that would land outside the upload directory is `None`.
    pub fn resolve(&self, stored: &str) -> Option<PathBuf> {
        file_name_of(stored).map(|name| self.upload_dir.join(name))
    }

    /// Write an uploaded image and return its stored path
    pub async fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> ApiResult<String> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let file_name = unique_file_name(original_name.unwrap_or_default());
        tokio::fs::write(self.upload_dir.join(&file_name), bytes).await?;

        let stored = format!("{}/{}", PUBLIC_PREFIX, file_name);
        tracing::info!(path = %stored, size = bytes.len(), "Image stored");
        Ok(stored)
    }

    /// Fail with a field error when a post other than `except` already
    /// references `stored` in any of its spellings.
    pub async fn ensure_unclaimed(&self, stored: &str, except: Option<Uuid>) -> ApiResult<()> {
        if self.posts.image_in_use(&references(stored), except).await? {
            return Err(ApiError::image_taken());
        }
        Ok(())
    }

    /// Called after a post's image reference changed from `old` to `new`.
    pub async fn replace(&self, old: Option<&str>, new: Option<&str>) -> CleanupOutcome {
        match old {
            Some(old) if !old.trim().is_empty() && Some(old) != new => self.discard(old).await,
            _ => CleanupOutcome::NothingToDo,
        }
    }

    /// Remove a stored image unless a live post still references it
    pub async fn discard(&self, stored: &str) -> CleanupOutcome {
        let stored = stored.trim();
        if stored.is_empty() {
            return CleanupOutcome::NothingToDo;
        }

        let Some(name) = file_name_of(stored) else {
            tracing::warn!(path = %stored, "Refusing to remove image outside upload directory");
            return CleanupOutcome::Rejected;
        };

        match self.posts.image_in_use(&references(stored), None).await {
            Ok(true) => {
                tracing::debug!(path = %stored, "Image still referenced, keeping it");
                return CleanupOutcome::StillReferenced;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(path = %stored, error = %e, "Image reference check failed, keeping it");
                return CleanupOutcome::Failed;
            }
        }

        let file = self.upload_dir.join(name);
        match tokio::fs::remove_file(&file).await {
            Ok(()) => {
                tracing::info!(path = %stored, "Image removed");
                CleanupOutcome::Removed
            }
            Err(e) => {
                tracing::warn!(path = %stored, error = %e, "Image cleanup failed");
                CleanupOutcome::Failed
            }
        }
    }
}

/// Extract the bare file name from a stored path, rejecting traversal.
fn file_name_of(stored: &str) -> Option<&str> {
    let relative = stored.trim().trim_start_matches('/');
    let name = relative
        .strip_prefix(PUBLIC_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))?;

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(name),
        _ => None,
    }
}

/// Every stored spelling that names the same file as `stored`
fn references(stored: &str) -> Vec<String> {
    let stored = stored.trim();
    let mut references = match file_name_of(stored) {
        Some(name) => {
            let canonical = format!("{}/{}", PUBLIC_PREFIX, name);
            vec![format!("/{}", canonical), canonical]
        }
        None => Vec::new(),
    };
    if !references.iter().any(|r| r == stored) {
        references.push(stored.to_string());
    }
    references
}

/// Timestamp-prefixed unique name keeping a sanitized form of the original
fn unique_file_name(original: &str) -> String {
    let sanitized: String = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    let sanitized = if sanitized.is_empty() {
        "upload"
    } else {
        sanitized
    };

    let unique = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        Utc::now().format("%Y%m%dT%H%M%S%3fZ"),
        &unique[..8],
        sanitized
    )
}
