use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::NotFound(message) = self;

        let body = Json(json!({
            "error": message,
            "status": StatusCode::NOT_FOUND.as_u16(),
        }));

        (StatusCode::NOT_FOUND, body).into_response()
    }
}
