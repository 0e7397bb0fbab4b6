//! Image uploads to Cloudinary.
//!
//! A `public_id` containing `/` (folder paths) must be sent percent-encoded
//! as a single path segment.

use std::collections::BTreeMap;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::instrument;

use super::extract::{Json, Path};
use crate::config::CloudinaryConfig;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::uploads::{
    ImageInfo, IncomingFile, MAX_FILES_PER_REQUEST, UploadError, UploadService, UploadedImage,
};
use crate::state::AppState;

/// Multipart overhead allowed on top of the file bytes.
const MULTIPART_SLACK: usize = 1024 * 1024;

/// Build the upload router, sized to the configured file limit.
pub fn router(config: &CloudinaryConfig) -> Router<AppState> {
    Router::new()
        .route("/file", post(upload_file))
        .route("/files", post(upload_files))
        .route("/file/{public_id}", get(info).delete(remove))
        .route("/file/{public_id}/urls", get(responsive_urls))
        .layer(DefaultBodyLimit::max(body_limit(config.max_file_size)))
}

pub(crate) fn body_limit(max_file_size: u64) -> usize {
    usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(MULTIPART_SLACK)
}

/// Read every part named `field`, validating each as it arrives.
async fn read_files(
    uploads: &UploadService,
    mut multipart: Multipart,
    field: &'static str,
    max_files: usize,
) -> std::result::Result<Vec<IncomingFile>, UploadError> {
    if !uploads.is_configured() {
        return Err(UploadError::NotConfigured);
    }

    let mut files = Vec::new();
    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }
        if files.len() == max_files {
            return Err(UploadError::TooManyFiles {
                count: files.len() + 1,
                max: max_files,
            });
        }

        let file_name = part.file_name().unwrap_or_default().to_string();
        let bytes = part.bytes().await?;
        uploads.validate(&file_name, bytes.len() as u64)?;

        files.push(IncomingFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(UploadError::MissingFile(field));
    }
    Ok(files)
}

#[instrument(skip_all)]
pub async fn upload_file(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadedImage>> {
    let uploads = state.uploads();
    let mut files = read_files(uploads, multipart?, "file", 1).await?;
    let file = files.pop().ok_or(UploadError::MissingFile("file"))?;

    let image = uploads.upload(file).await?;
    tracing::info!(user_id = %user.id, public_id = %image.public_id, "Image uploaded");
    Ok(Json(image))
}

#[instrument(skip_all)]
pub async fn upload_files(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let uploads = state.uploads();
    let files = read_files(uploads, multipart?, "files", MAX_FILES_PER_REQUEST).await?;

    let images = uploads.upload_many(files).await?;
    tracing::info!(user_id = %user.id, count = images.len(), "Images uploaded");
    Ok(Json(json!({ "files": images, "count": images.len() })))
}

#[instrument(skip(state))]
pub async fn remove(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<Value>> {
    state.uploads().delete(&public_id).await?;
    Ok(Json(json!({ "message": "File deleted" })))
}

#[instrument(skip(state))]
pub async fn info(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<ImageInfo>> {
    Ok(Json(state.uploads().info(&public_id)?))
}

#[instrument(skip(state))]
pub async fn responsive_urls(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<BTreeMap<String, String>>> {
    Ok(Json(state.uploads().responsive_urls(&public_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_covers_a_full_batch() {
        let limit = body_limit(10 * 1024 * 1024);
        assert_eq!(limit, 10 * 10 * 1024 * 1024 + MULTIPART_SLACK);
        assert_eq!(body_limit(u64::MAX), usize::MAX);
    }
}
