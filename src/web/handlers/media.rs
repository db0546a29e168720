//! Image upload handlers and multipart helpers.
//!
//! Images arrive as the `image` part of a multipart/form-data body, either
//! together with the fields of a new thread or reply, or on their own to
//! replace the image of an existing one.

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use validator::Validate;

use super::thread::thread_response;
use super::AppState;
use crate::board::BoardService;
use crate::media::{ImageKind, ImageStorage};
use crate::web::dto::{ApiResponse, ReplyResponse, ThreadResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::OptionalAuthUser;

/// Name of the multipart part carrying the image.
const IMAGE_FIELD: &str = "image";

/// Uploaded image part.
pub(super) struct ImageUpload {
    filename: String,
    content: Vec<u8>,
}

/// Decoded body of a create request.
pub(super) struct CreateForm<T> {
    pub data: T,
    pub image: Option<ImageUpload>,
}

/// Read a create body sent either as JSON or as multipart/form-data.
///
/// Multipart text parts become string fields; the `image` part, if any,
/// is returned alongside.
pub(super) async fn read_create_form<T>(
    req: Request,
    max_size: usize,
) -> Result<CreateForm<T>, ApiError>
where
    T: DeserializeOwned + Validate,
{
    if !is_multipart(req.headers()) {
        let ValidatedJson(data) = ValidatedJson::<T>::from_request(req, &()).await?;
        return Ok(CreateForm { data, image: None });
    }

    let multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text())))?;
    let (fields, image) = read_parts(multipart, max_size).await?;

    let data: T = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::bad_request(format!("Invalid form data: {e}")))?;
    data.validate().map_err(ApiError::from_validation_errors)?;

    Ok(CreateForm { data, image })
}

/// Write an optional upload to storage, returning its stored path.
pub(super) fn store_image(
    storage: &ImageStorage,
    kind: ImageKind,
    upload: Option<ImageUpload>,
) -> Result<Option<String>, ApiError> {
    upload
        .map(|upload| storage.save(kind, &upload.content, &upload.filename))
        .transpose()
        .map_err(ApiError::from)
}

/// Remove a stored image, logging failures.
pub(super) fn discard(storage: &ImageStorage, stored: &str) {
    if let Err(e) = storage.delete(stored) {
        tracing::warn!(image = %stored, error = %e, "Failed to delete image");
    }
}

/// Remove the images of deleted threads and replies.
pub(super) fn discard_all(storage: &ImageStorage, images: &[String]) {
    for image in images {
        discard(storage, image);
    }
}

/// PUT /api/threads/:id/image - Replace a thread's image (owner only).
///
/// Counts as an edit.
pub async fn upload_thread_image(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(thread_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ThreadResponse>>, ApiError> {
    let actor = auth.identity();
    let service = BoardService::new(&state.db);
    service.editable_thread(actor.as_ref(), thread_id).await?;

    let upload = read_image(multipart, state.max_upload_size).await?;
    let stored = state
        .storage
        .save(ImageKind::Thread, &upload.content, &upload.filename)?;

    let (thread, previous) = match service
        .set_thread_image(actor.as_ref(), thread_id, &stored)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            discard(&state.storage, &stored);
            return Err(e.into());
        }
    };
    if let Some(ref previous) = previous {
        discard(&state.storage, previous);
    }

    Ok(Json(ApiResponse::new(
        thread_response(&state.db, thread).await?,
    )))
}

/// PUT /api/replies/:id/image - Replace a reply's image (owner only).
///
/// Counts as an edit.
pub async fn upload_reply_image(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(reply_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ReplyResponse>>, ApiError> {
    let actor = auth.identity();
    let service = BoardService::new(&state.db);
    service.editable_reply(actor.as_ref(), reply_id).await?;

    let upload = read_image(multipart, state.max_upload_size).await?;
    let stored = state
        .storage
        .save(ImageKind::Reply, &upload.content, &upload.filename)?;

    let (reply, previous) = match service
        .set_reply_image(actor.as_ref(), reply_id, &stored)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            discard(&state.storage, &stored);
            return Err(e.into());
        }
    };
    if let Some(ref previous) = previous {
        discard(&state.storage, previous);
    }

    Ok(Json(ApiResponse::new(reply.into())))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Pull the required `image` part out of a multipart body.
async fn read_image(multipart: Multipart, max_size: usize) -> Result<ImageUpload, ApiError> {
    let (_, image) = read_parts(multipart, max_size).await?;
    image.ok_or_else(|| ApiError::field(IMAGE_FIELD, "No file was submitted."))
}

/// Split a multipart body into text fields and the `image` part.
///
/// An `image` part with no file name and no content (an empty file input)
/// counts as absent.
async fn read_parts(
    mut multipart: Multipart,
    max_size: usize,
) -> Result<(Map<String, Value>, Option<ImageUpload>), ApiError> {
    let mut fields = Map::new();
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGE_FIELD {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content = field.bytes().await.map_err(|e| {
                tracing::error!("Failed to read image content: {}", e);
                ApiError::bad_request("Failed to read image")
            })?;
            if content.len() > max_size {
                let max_mb = max_size / 1024 / 1024;
                return Err(ApiError::payload_too_large(format!(
                    "Image too large (max {}MB)",
                    max_mb
                )));
            }
            if filename.is_empty() && content.is_empty() {
                continue;
            }
            image = Some(ImageUpload {
                filename,
                content: content.to_vec(),
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|_| ApiError::field(name.clone(), "Not a valid string."))?;
            fields.insert(name, Value::String(text));
        }
    }

    Ok((fields, image))
}
