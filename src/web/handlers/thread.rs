//! Thread and vote handlers.

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::media::{discard, discard_all, read_create_form, store_image};
use crate::board::{BoardService, Thread, ThreadUpdate, VoteKind, VoteLedger, VoteOutcome};
use crate::media::ImageKind;
use crate::web::dto::{
    required_pk, ApiResponse, MessageResponse, ThreadListQuery, ThreadRequest, ThreadResponse,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::OptionalAuthUser;
use crate::Database;

/// Attach the current voter lists to a thread.
pub(super) async fn thread_response(db: &Database, thread: Thread) -> Result<ThreadResponse, ApiError> {
    let ledger = VoteLedger::new(db.pool());
    let upvotes = ledger.voters(thread.id, VoteKind::Up).await?;
    let downvotes = ledger.voters(thread.id, VoteKind::Down).await?;
    Ok(ThreadResponse::new(thread, upvotes, downvotes))
}

/// GET /api/threads - List threads, most recent reply activity first.
///
/// `?board=1,2` restricts the listing to those boards.
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Query(query): Query<ThreadListQuery>,
) -> Result<Json<ApiResponse<Vec<ThreadResponse>>>, ApiError> {
    let filter = query.filter()?;
    let threads = BoardService::new(&state.db)
        .list_threads(auth.identity().as_ref(), &filter)
        .await?;

    let mut responses = Vec::with_capacity(threads.len());
    for thread in threads {
        responses.push(thread_response(&state.db, thread).await?);
    }

    Ok(Json(ApiResponse::new(responses)))
}

/// GET /api/threads/:id - Get a thread.
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(thread_id): Path<i64>,
) -> Result<Json<ApiResponse<ThreadResponse>>, ApiError> {
    let thread = BoardService::new(&state.db)
        .get_thread(auth.identity().as_ref(), thread_id)
        .await?;

    Ok(Json(ApiResponse::new(
        thread_response(&state.db, thread).await?,
    )))
}

/// POST /api/threads - Create a thread.
///
/// Accepts JSON, or multipart/form-data with an optional `image` file. A
/// thread posted with an image is not marked as edited.
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    req: Request,
) -> Result<(StatusCode, Json<ApiResponse<ThreadResponse>>), ApiError> {
    let form = read_create_form::<ThreadRequest>(req, state.max_upload_size).await?;
    let mut input = form.data.into_input()?;
    input.image = store_image(&state.storage, ImageKind::Thread, form.image)?;
    let stored = input.image.clone();

    let thread = match BoardService::new(&state.db)
        .create_thread(auth.identity().as_ref(), input)
        .await
    {
        Ok(thread) => thread,
        Err(e) => {
            if let Some(ref stored) = stored {
                discard(&state.storage, stored);
            }
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ThreadResponse::new(thread, Vec::new(), Vec::new()))),
    ))
}

/// PUT/PATCH /api/threads/:id - Update a thread (owner only).
///
/// Absent or blank fields keep their stored value. Any successful update
/// marks the thread as edited.
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(thread_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ThreadRequest>,
) -> Result<Json<ApiResponse<ThreadResponse>>, ApiError> {
    let update = ThreadUpdate::sparse(req.title, req.content);
    let thread = BoardService::new(&state.db)
        .update_thread(auth.identity().as_ref(), thread_id, update)
        .await?;

    Ok(Json(ApiResponse::new(
        thread_response(&state.db, thread).await?,
    )))
}

/// DELETE /api/threads/:id - Delete a thread with its replies and votes.
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(thread_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = BoardService::new(&state.db)
        .delete_thread(auth.identity().as_ref(), thread_id)
        .await?;

    discard_all(&state.storage, &removed.images);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/threads/:id/upvote-thread
pub async fn upvote_thread(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(thread_id): Path<i64>,
    body: Bytes,
) -> Result<Response, ApiError> {
    vote(&state, auth, thread_id, &body, VoteKind::Up).await
}

/// POST /api/threads/:id/downvote-thread
pub async fn downvote_thread(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(thread_id): Path<i64>,
    body: Bytes,
) -> Result<Response, ApiError> {
    vote(&state, auth, thread_id, &body, VoteKind::Down).await
}

/// Apply a vote. Responds 200 with a message when a vote is cast or
/// swapped, and 204 when a repeated vote cancels it.
async fn vote(
    state: &AppState,
    auth: OptionalAuthUser,
    thread_id: i64,
    body: &[u8],
    kind: VoteKind,
) -> Result<Response, ApiError> {
    let actor = auth.identity();
    let service = BoardService::new(&state.db);

    // A missing thread is reported before a malformed payload.
    service.get_thread(actor.as_ref(), thread_id).await?;
    let payload_thread = required_pk(&parse_body(body)?, "thread")?;

    let outcome = service
        .vote(actor.as_ref(), thread_id, payload_thread, kind)
        .await?;

    Ok(match outcome {
        VoteOutcome::Cast | VoteOutcome::Swapped => {
            Json(MessageResponse::new(kind.message())).into_response()
        }
        VoteOutcome::Cancelled => StatusCode::NO_CONTENT.into_response(),
    })
}

/// An empty body counts as an empty object.
fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b"").unwrap(), serde_json::json!({}));
        assert_eq!(parse_body(b"  \n").unwrap(), serde_json::json!({}));
        assert_eq!(
            parse_body(br#"{"thread": 3}"#).unwrap(),
            serde_json::json!({"thread": 3})
        );
        assert!(parse_body(b"{thread").is_err());
    }
}
