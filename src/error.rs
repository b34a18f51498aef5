use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Missing signature headers")]
    MissingSignature,

    #[error("Signature mismatch")]
    InvalidSignature,

    #[error("Request timestamp outside the allowed window")]
    StaleTimestamp,

    #[error("Malformed event payload")]
    MalformedEvent,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Internal server error")]
    InternalServerError,

    #[error("Resource not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::JsonParsing(_) => (StatusCode::BAD_REQUEST, "Invalid JSON"),
            AppError::MissingSignature => (StatusCode::UNAUTHORIZED, "Missing signature"),
            AppError::InvalidSignature => (StatusCode::UNAUTHORIZED, "Invalid signature"),
            AppError::StaleTimestamp => (StatusCode::UNAUTHORIZED, "Stale request timestamp"),
            AppError::MalformedEvent => (StatusCode::BAD_REQUEST, "Malformed event payload"),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"),
            AppError::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
        };

        tracing::warn!("Error occurred: {}", self);

        let body = Json(json!({
            "status": status.as_u16(),
            "message": message
        }));

        (status, body).into_response()
    }
}
