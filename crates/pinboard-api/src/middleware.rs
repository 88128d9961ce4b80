use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use axum_extra::typed_header::TypedHeaderRejection;
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use pinboard_types::api::Claims;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// Validates the bearer JWT and puts its [`Claims`] into request extensions.
/// The account must still exist and be active.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.map_err(|_| ApiError::unauthorized("missing bearer token"))?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::unauthorized("invalid or expired token")
    })?;

    let db = state.clone();
    let user_id = token_data.claims.sub.to_string();
    let user = blocking(move || db.db.get_user_by_id(&user_id).map_err(ApiError::internal)).await?;
    if !user.is_some_and(|u| u.is_active) {
        return Err(ApiError::unauthorized("account is unknown or inactive"));
    }

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
