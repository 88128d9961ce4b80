use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use pinboard_core::KanbanError;
use pinboard_db::Database;
use pinboard_types::api::ErrorResponse;

use crate::auth::AppState;

/// An HTTP status plus the message sent back as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Logs the cause; the client only learns that something failed.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!("Internal error: {}", cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl From<KanbanError> for ApiError {
    fn from(e: KanbanError) -> Self {
        let status = match &e {
            KanbanError::Validation(_) => StatusCode::BAD_REQUEST,
            KanbanError::NotFound(_) => StatusCode::NOT_FOUND,
            KanbanError::Forbidden(_) => StatusCode::FORBIDDEN,
            KanbanError::Conflict(_) => StatusCode::CONFLICT,
            KanbanError::Storage(_) => return Self::internal(format!("{:#}", e)),
        };
        if matches!(status, StatusCode::FORBIDDEN | StatusCode::CONFLICT) {
            warn!("Request rejected ({}): {}", status, e);
        }
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Runs blocking work (SQLite, password hashing) off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    })?
}

/// Runs one board operation against the database.
pub(crate) async fn run<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> pinboard_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    blocking(move || f(&state.db).map_err(ApiError::from)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kanban_errors_map_to_statuses() {
        let cases = [
            (KanbanError::validation("bad"), StatusCode::BAD_REQUEST),
            (KanbanError::NotFound("board"), StatusCode::NOT_FOUND),
            (KanbanError::forbidden("no"), StatusCode::FORBIDDEN),
            (KanbanError::conflict("taken"), StatusCode::CONFLICT),
            (
                KanbanError::Storage(anyhow::anyhow!("disk on fire")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_details_stay_private() {
        let err = ApiError::from(KanbanError::Storage(anyhow::anyhow!("disk on fire")));
        assert_eq!(err.message, "internal server error");

        let err = ApiError::from(KanbanError::NotFound("board"));
        assert_eq!(err.message, "board not found");
    }
}
