//! Gallery API routes: upload, list and delete images.

use axum::extract::{Multipart, Path, State};
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use gallery_common::{Error, ImageId};
use gallery_db::models::ImageRecord;
use serde::Serialize;

use super::error::AppError;
use super::request_id::RequestId;
use super::AppContext;
use crate::images::{ImageUpload, MAX_FILES_PER_UPLOAD};

/// Multipart field carrying the image files.
const IMAGES_FIELD: &str = "images";

/// Create image-related routes.
pub fn image_routes() -> Router<AppContext> {
    Router::new()
        .route("/upload", post(upload_images))
        .route("/images", get(list_images))
        .route("/images/{id}", delete(delete_image))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /upload
///
/// Every file is validated before the first one is sent to the media store,
/// so a rejected request stores nothing.
async fn upload_images(
    State(ctx): State<AppContext>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    multipart: Multipart,
) -> Result<Json<Vec<ImageRecord>>, AppError> {
    let fail = |e: Error| {
        AppError::new(e)
            .with_summary("Upload failed")
            .with_request_id(request_id.clone())
    };

    let files = read_uploads(multipart).await.map_err(fail)?;
    tracing::debug!(count = files.len(), "upload request validated");

    let records = ctx.gallery.upload_batch(files).await.map_err(fail)?;
    Ok(Json(records))
}

/// GET /images
async fn list_images(
    State(ctx): State<AppContext>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> Result<Json<Vec<ImageRecord>>, AppError> {
    let records = ctx.gallery.list().await.map_err(|e| {
        AppError::new(e)
            .with_summary("Failed to fetch images")
            .with_request_id(request_id)
    })?;
    Ok(Json(records))
}

/// DELETE /images/{id}
///
/// An id that does not parse is treated like one that does not exist and
/// answers 404 rather than a server error.
async fn delete_image(
    State(ctx): State<AppContext>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let result = match id.parse::<ImageId>() {
        Ok(image_id) => ctx.gallery.delete(image_id).await,
        Err(_) => Err(Error::not_found("image", &id)),
    };

    result.map_err(|e| {
        let summary = match &e {
            Error::NotFound { .. } => "Image not found",
            _ => "Failed to delete image",
        };
        AppError::new(e)
            .with_summary(summary)
            .with_request_id(request_id)
    })?;

    Ok(Json(MessageResponse {
        message: "Image deleted successfully",
    }))
}

/// Collect and validate the `images` parts of an upload request.
async fn read_uploads(mut multipart: Multipart) -> gallery_common::Result<Vec<ImageUpload>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }

        if files.len() == MAX_FILES_PER_UPLOAD {
            return Err(Error::Validation(format!(
                "Too many files; at most {MAX_FILES_PER_UPLOAD} per upload"
            )));
        }

        let file_name = field.file_name().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("Failed to read upload: {e}")))?;

        files.push(ImageUpload::from_part(file_name.as_deref(), data)?);
    }

    Ok(files)
}
