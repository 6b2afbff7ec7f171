use ai_client::AssistantError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Assistant(err) => assistant_status(err),
            ApiError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::JsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

// Each transport condition keeps its own status so the frontend can show a
// specific notice instead of a generic failure.
fn assistant_status(err: &AssistantError) -> StatusCode {
    match err {
        AssistantError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        AssistantError::QuotaExhausted => StatusCode::PAYMENT_REQUIRED,
        AssistantError::Http(_) | AssistantError::Network(_) => StatusCode::BAD_GATEWAY,
        AssistantError::InvalidBaseUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_error_status_mapping() {
        assert_eq!(
            assistant_status(&AssistantError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            assistant_status(&AssistantError::QuotaExhausted),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            assistant_status(&AssistantError::Http(StatusCode::INTERNAL_SERVER_ERROR)),
            StatusCode::BAD_GATEWAY
        );
    }
}
