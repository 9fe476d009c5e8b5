use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Missing query parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unauthorized, please log in first")]
    Unauthorized,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Not found")]
    NotFound,

    #[error("KV storage not configured")]
    StorageNotConfigured,

    #[error("KV error: {0}")]
    Kv(#[from] redis::RedisError),

    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload | AppError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::WrongPassword => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::StorageNotConfigured
            | AppError::Kv(_)
            | AppError::Render(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            AppError::Kv(_) | AppError::Render(_) | AppError::InternalError(_) => {
                error!("{self}");
                "Internal error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
