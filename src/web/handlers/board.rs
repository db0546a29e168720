//! Board handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::media::discard_all;
use crate::board::BoardService;
use crate::web::dto::{ApiResponse, BoardRequest, BoardResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::OptionalAuthUser;

/// GET /api/boards - List all boards.
pub async fn list_boards(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
) -> Result<Json<ApiResponse<Vec<BoardResponse>>>, ApiError> {
    let boards = BoardService::new(&state.db)
        .list_boards(auth.identity().as_ref())
        .await?;

    Ok(Json(ApiResponse::new(
        boards.into_iter().map(BoardResponse::from).collect(),
    )))
}

/// GET /api/boards/:id - Get a board.
pub async fn get_board(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(board_id): Path<i64>,
) -> Result<Json<ApiResponse<BoardResponse>>, ApiError> {
    let board = BoardService::new(&state.db)
        .get_board(auth.identity().as_ref(), board_id)
        .await?;

    Ok(Json(ApiResponse::new(board.into())))
}

/// POST /api/boards - Create a board (admin only).
pub async fn create_board(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    ValidatedJson(req): ValidatedJson<BoardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BoardResponse>>), ApiError> {
    let board = BoardService::new(&state.db)
        .create_board(auth.identity().as_ref(), req.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(board.into()))))
}

/// PUT/PATCH /api/boards/:id - Update a board (admin only).
pub async fn update_board(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(board_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<BoardRequest>,
) -> Result<Json<ApiResponse<BoardResponse>>, ApiError> {
    let board = BoardService::new(&state.db)
        .update_board(auth.identity().as_ref(), board_id, req.into())
        .await?;

    Ok(Json(ApiResponse::new(board.into())))
}

/// DELETE /api/boards/:id - Delete a board and its threads (admin only).
pub async fn delete_board(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(board_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = BoardService::new(&state.db)
        .delete_board(auth.identity().as_ref(), board_id)
        .await?;

    discard_all(&state.storage, &removed.images);
    Ok(StatusCode::NO_CONTENT)
}
