use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use pinboard_core::board;
use pinboard_types::api::{BoardPatch, Claims, NewBoard};

use crate::auth::AppState;
use crate::error::{ApiError, run};
use crate::extract::ApiJson;

/// Boards the caller owns or belongs to.
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let boards = run(&state, move |db| board::list_boards(db, claims.sub)).await?;
    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<NewBoard>,
) -> Result<impl IntoResponse, ApiError> {
    let board = run(&state, move |db| board::create_board(db, claims.sub, &req)).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// The board with its ordered lists, their ordered cards and the members.
pub async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = run(&state, move |db| board::get_board(db, claims.sub, board_id)).await?;
    Ok(Json(detail))
}

pub async fn update_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    ApiJson(patch): ApiJson<BoardPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let board = run(&state, move |db| {
        board::update_board(db, claims.sub, board_id, &patch)
    })
    .await?;
    Ok(Json(board))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    run(&state, move |db| board::delete_board(db, claims.sub, board_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
