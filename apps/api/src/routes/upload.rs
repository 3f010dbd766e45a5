//! Image upload route
//!
//! - `PUT /post-image` - Store one image for the signed-in caller
//!
//! The multipart body carries at most one file part (conventionally named
//! `image`) and an optional `oldPath` text part naming a previously
//! uploaded image to discard. Parts whose content type is not PNG or JPEG
//! are ignored, so a request carrying only such a part is answered as
//! "no file". A body that is not valid multipart is a 400, and one that
//! runs past the size cap is a 413; nothing is stored in either case.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::put,
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult, FieldError};
use crate::models::Identity;
use crate::services::assets::{is_allowed_image, AssetCoordinator};
use crate::services::policy::{self, Operation};

/// Name of the optional form part naming an image to discard
pub const OLD_PATH_FIELD: &str = "oldPath";

/// Shared state for upload handlers
#[derive(Clone)]
pub struct UploadState {
    pub assets: AssetCoordinator,
}

impl UploadState {
    pub fn new(assets: AssetCoordinator) -> Self {
        Self { assets }
    }
}

/// Upload response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Create the upload router. `max_bytes` caps the request body.
pub fn upload_router(state: UploadState, max_bytes: usize) -> Router {
    Router::new()
        .route("/post-image", put(upload_image))
        .layer(DefaultBodyLimit::max(max_bytes))
        .with_state(state)
}

struct UploadedFile {
    name: Option<String>,
    bytes: axum::body::Bytes,
}

/// Store an uploaded image
///
/// # Response
/// - 201 Created with `{message, filePath}` when an image was stored
/// - 200 OK with `{message}` when no acceptable file was attached
/// - 401 Unauthorized without a valid identity
/// - 400 Bad Request for a malformed multipart body
/// - 413 Payload Too Large past the body cap
/// - 422 when more than one file is attached
async fn upload_image(
    State(state): State<UploadState>,
    identity: Identity,
    multipart: Option<Multipart>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let user_id = policy::require_user(Operation::UploadImage, &identity)?;

    let mut file: Option<UploadedFile> = None;
    let mut file_parts = 0usize;
    let mut old_path: Option<String> = None;

    if let Some(mut multipart) = multipart {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(multipart_error)?
        {
            if field.file_name().is_none() {
                if field.name() == Some(OLD_PATH_FIELD) {
                    let text = field
                        .text()
                        .await
                        .map_err(multipart_error)?;
                    old_path = Some(text).filter(|path| !path.trim().is_empty());
                }
                continue;
            }

            file_parts += 1;
            if file_parts > 1 {
                return Err(ApiError::invalid_input(vec![FieldError::new(
                    "image",
                    "Only one file may be uploaded.",
                )]));
            }

            let name = field.file_name().map(str::to_string);
            if !is_allowed_image(field.content_type()) {
                tracing::debug!(
                    content_type = ?field.content_type(),
                    "Ignoring upload with unsupported content type"
                );
                continue;
            }

            let bytes = field
                .bytes()
                .await
                .map_err(multipart_error)?;
            file = Some(UploadedFile { name, bytes });
        }
    }

    let Some(file) = file else {
        return Ok((
            StatusCode::OK,
            Json(UploadResponse {
                message: "No file provided!".to_string(),
                file_path: None,
            }),
        ));
    };

    let stored = state.assets.store(file.name.as_deref(), &file.bytes).await?;
    tracing::info!(user_id = %user_id, path = %stored, "Image uploaded");

    if let Some(old_path) = old_path {
        state.assets.discard(&old_path).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File stored.".to_string(),
            file_path: Some(stored),
        }),
    ))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::UploadTooLarge(err.body_text())
    } else {
        ApiError::InvalidUpload(err.body_text())
    }
}
