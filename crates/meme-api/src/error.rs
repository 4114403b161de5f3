//! HTTP error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Error returned by handlers, rendered as
/// `{"error": true, "success": false, "error_message": ..., "statusCode": ...}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unavailable(String),
    Internal(meme_core::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<meme_core::Error> for ApiError {
    fn from(err: meme_core::Error) -> Self {
        match &err {
            meme_core::Error::MemeNotFound(id) => {
                ApiError::NotFound(format!("ID {} does not exist in database", id))
            }
            meme_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            meme_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            meme_core::Error::IndexNotReady => ApiError::Unavailable(err.to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Unavailable(msg) => msg,
            ApiError::Internal(err) => {
                // Details stay in the server log
                error!(error = %err, "Request failed");
                "Unexpected Server Error".to_string()
            }
        };

        let body = Json(json!({
            "error": true,
            "success": false,
            "error_message": message,
            "statusCode": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
