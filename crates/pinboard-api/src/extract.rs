use axum::{
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
};

use crate::error::ApiError;

/// `axum::Json` whose rejections come back as `{"error": ...}` bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_)
            | JsonRejection::JsonSyntaxError(_)
            | JsonRejection::MissingJsonContentType(_) => {
                ApiError::bad_request(rejection.body_text())
            }
            other => {
                let status = other.status();
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    ApiError::internal(other.body_text())
                } else {
                    ApiError::new(status, other.body_text())
                }
            }
        }
    }
}
