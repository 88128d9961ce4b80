use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use pinboard_core::{card, ordering};
use pinboard_types::api::{CardPatch, Claims, MoveCard, NewCard, ReorderItem};

use crate::auth::AppState;
use crate::error::{ApiError, run};
use crate::extract::ApiJson;

pub async fn list_cards(
    State(state): State<AppState>,
    Path(list_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let cards = run(&state, move |db| card::list_cards(db, claims.sub, list_id)).await?;
    Ok(Json(cards))
}

pub async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let card = run(&state, move |db| card::get_card(db, claims.sub, card_id)).await?;
    Ok(Json(card))
}

pub async fn create_card(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<NewCard>,
) -> Result<impl IntoResponse, ApiError> {
    let card = run(&state, move |db| card::create_card(db, claims.sub, &req)).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn update_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    ApiJson(patch): ApiJson<CardPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let card = run(&state, move |db| {
        card::update_card(db, claims.sub, card_id, &patch)
    })
    .await?;
    Ok(Json(card))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    run(&state, move |db| card::delete_card(db, claims.sub, card_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Moves the card to the end of another list on the same board.
pub async fn move_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    ApiJson(target): ApiJson<MoveCard>,
) -> Result<impl IntoResponse, ApiError> {
    let card = run(&state, move |db| card::move_card(db, claims.sub, card_id, &target)).await?;
    Ok(Json(card))
}

pub async fn reorder_cards(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(batch): ApiJson<Vec<ReorderItem>>,
) -> Result<impl IntoResponse, ApiError> {
    run(&state, move |db| ordering::reorder_cards(db, claims.sub, &batch)).await?;
    Ok(StatusCode::NO_CONTENT)
}
