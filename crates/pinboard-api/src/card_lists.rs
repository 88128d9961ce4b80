use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use pinboard_core::{card_list, ordering};
use pinboard_types::api::{CardListPatch, Claims, NewCardList, ReorderItem};

use crate::auth::AppState;
use crate::error::{ApiError, run};
use crate::extract::ApiJson;

pub async fn list_card_lists(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let lists = run(&state, move |db| {
        card_list::list_card_lists(db, claims.sub, board_id)
    })
    .await?;
    Ok(Json(lists))
}

pub async fn get_card_list(
    State(state): State<AppState>,
    Path(list_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let list = run(&state, move |db| card_list::get_card_list(db, claims.sub, list_id)).await?;
    Ok(Json(list))
}

pub async fn create_card_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<NewCardList>,
) -> Result<impl IntoResponse, ApiError> {
    let list = run(&state, move |db| card_list::create_card_list(db, claims.sub, &req)).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn update_card_list(
    State(state): State<AppState>,
    Path(list_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    ApiJson(patch): ApiJson<CardListPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let list = run(&state, move |db| {
        card_list::update_card_list(db, claims.sub, list_id, &patch)
    })
    .await?;
    Ok(Json(list))
}

pub async fn delete_card_list(
    State(state): State<AppState>,
    Path(list_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    run(&state, move |db| card_list::delete_card_list(db, claims.sub, list_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Applies a batch of `{id, order}` pairs atomically.
pub async fn reorder_card_lists(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(batch): ApiJson<Vec<ReorderItem>>,
) -> Result<impl IntoResponse, ApiError> {
    run(&state, move |db| ordering::reorder_card_lists(db, claims.sub, &batch)).await?;
    Ok(StatusCode::NO_CONTENT)
}
