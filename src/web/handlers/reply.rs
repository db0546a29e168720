//! Reply handlers.

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::media::{discard, discard_all, read_create_form, store_image};
use crate::board::{BoardService, ReplyUpdate};
use crate::media::ImageKind;
use crate::web::dto::{ApiResponse, ReplyListQuery, ReplyRequest, ReplyResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::OptionalAuthUser;

/// GET /api/replies - List replies in creation order.
///
/// `?thread=<id>` and `?reply=<id>` select direct children of a thread or
/// a reply.
pub async fn list_replies(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Query(query): Query<ReplyListQuery>,
) -> Result<Json<ApiResponse<Vec<ReplyResponse>>>, ApiError> {
    let replies = BoardService::new(&state.db)
        .list_replies(auth.identity().as_ref(), &query.into())
        .await?;

    Ok(Json(ApiResponse::new(
        replies.into_iter().map(ReplyResponse::from).collect(),
    )))
}

/// GET /api/replies/:id
pub async fn get_reply(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(reply_id): Path<i64>,
) -> Result<Json<ApiResponse<ReplyResponse>>, ApiError> {
    let reply = BoardService::new(&state.db)
        .get_reply(auth.identity().as_ref(), reply_id)
        .await?;

    Ok(Json(ApiResponse::new(reply.into())))
}

/// POST /api/replies - Reply to a thread or to another reply.
///
/// Accepts JSON, or multipart/form-data with an optional `image` file.
pub async fn create_reply(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    req: Request,
) -> Result<(StatusCode, Json<ApiResponse<ReplyResponse>>), ApiError> {
    let form = read_create_form::<ReplyRequest>(req, state.max_upload_size).await?;
    let mut input = form.data.into_input()?;
    input.image = store_image(&state.storage, ImageKind::Reply, form.image)?;
    let stored = input.image.clone();

    let reply = match BoardService::new(&state.db)
        .create_reply(auth.identity().as_ref(), input)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            if let Some(ref stored) = stored {
                discard(&state.storage, stored);
            }
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::new(reply.into()))))
}

/// PUT/PATCH /api/replies/:id - Edit reply text (owner only).
pub async fn update_reply(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(reply_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ReplyRequest>,
) -> Result<Json<ApiResponse<ReplyResponse>>, ApiError> {
    let reply = BoardService::new(&state.db)
        .update_reply(auth.identity().as_ref(), reply_id, ReplyUpdate::sparse(req.text))
        .await?;

    Ok(Json(ApiResponse::new(reply.into())))
}

/// DELETE /api/replies/:id - Delete a reply and its subtree.
pub async fn delete_reply(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(reply_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = BoardService::new(&state.db)
        .delete_reply(auth.identity().as_ref(), reply_id)
        .await?;

    discard_all(&state.storage, &removed.images);
    Ok(StatusCode::NO_CONTENT)
}
