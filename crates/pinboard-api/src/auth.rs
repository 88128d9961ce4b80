use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::{info, warn};
use uuid::Uuid;

use pinboard_db::{Database, is_unique_violation};
use pinboard_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::{ApiError, blocking};
use crate::extract::ApiJson;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    let username = req.username.trim().to_string();
    if !(3..=32).contains(&username.chars().count()) {
        return Err(ApiError::bad_request("username must be 3 to 32 characters"));
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }

    let user_id = Uuid::new_v4();
    let db = state.clone();
    let name = username.clone();
    blocking(move || {
        // Check if username is taken
        let existing = db.db.get_user_by_username(&name).map_err(ApiError::internal)?;
        if existing.is_some() {
            return Err(ApiError::new(StatusCode::CONFLICT, "username already taken"));
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(ApiError::internal)?
            .to_string();

        let full_name = req.full_name.unwrap_or_default();
        db.db
            .create_user(&user_id.to_string(), &name, full_name.trim(), &password_hash)
            .map_err(|e| {
                // Lost a race with a concurrent registration.
                if is_unique_violation(&e) {
                    ApiError::new(StatusCode::CONFLICT, "username already taken")
                } else {
                    ApiError::internal(e)
                }
            })
    })
    .await?;

    let token = create_token(&state, user_id, &username).map_err(ApiError::internal)?;
    info!("User {} registered as '{}'", user_id, username);

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user = blocking(move || {
        let user = db
            .db
            .get_user_by_username(req.username.trim())
            .map_err(ApiError::internal)?
            .filter(|u| u.is_active)
            .ok_or_else(|| ApiError::unauthorized("invalid username or password"))?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password).map_err(ApiError::internal)?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| {
                warn!("Failed login for '{}'", user.username);
                ApiError::unauthorized("invalid username or password")
            })?;

        Ok(user)
    })
    .await?;

    let user_id: Uuid = user.id.parse().map_err(ApiError::internal)?;
    let token = create_token(&state, user_id, &user.username).map_err(ApiError::internal)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

fn create_token(state: &AppStateInner, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let days = state.token_ttl_days;
    let ttl = chrono::TimeDelta::try_days(days)
        .ok_or_else(|| anyhow::anyhow!("token TTL of {} days is out of range", days))?;
    let expires = chrono::Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("token expiry overflows"))?;
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: expires.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(token_ttl_days: i64) -> AppStateInner {
        AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            token_ttl_days,
        }
    }

    #[test]
    fn token_is_issued_for_a_sane_ttl() {
        let token = create_token(&state(30), Uuid::new_v4(), "alice").unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn oversized_ttl_is_an_error() {
        assert!(create_token(&state(i64::MAX), Uuid::new_v4(), "alice").is_err());
    }
}
