use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use pinboard_core::member;
use pinboard_types::api::{AddMember, Claims, MemberRolePatch};

use crate::auth::AppState;
use crate::error::{ApiError, run};
use crate::extract::ApiJson;

pub async fn list_members(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let members = run(&state, move |db| member::list_members(db, claims.sub, board_id)).await?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<AddMember>,
) -> Result<impl IntoResponse, ApiError> {
    let membership = run(&state, move |db| {
        member::add_member(db, claims.sub, board_id, &req)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn update_member_role(
    State(state): State<AppState>,
    Path((board_id, user_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
    ApiJson(patch): ApiJson<MemberRolePatch>,
) -> Result<impl IntoResponse, ApiError> {
    let membership = run(&state, move |db| {
        member::update_member_role(db, claims.sub, board_id, user_id, &patch)
    })
    .await?;
    Ok(Json(membership))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((board_id, user_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    run(&state, move |db| {
        member::remove_member(db, claims.sub, board_id, user_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
