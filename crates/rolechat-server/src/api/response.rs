use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rolechat_core::services::{ChatError, ReplyError};
use serde_json::json;

/// Error response rendered as `{"error": "..."}`.
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
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(error: ChatError) -> Self {
        let status = match &error {
            ChatError::TopicNotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Forbidden => StatusCode::FORBIDDEN,
            ChatError::EmptyContent | ChatError::InvalidRole(_) => StatusCode::BAD_REQUEST,
            ChatError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, error.to_string())
    }
}

impl From<ReplyError> for ApiError {
    fn from(error: ReplyError) -> Self {
        match error {
            ReplyError::InvalidPersona(key) => {
                Self::bad_request(format!("Invalid role/persona: {}", key))
            }
            ReplyError::Chat(chat) => chat.into(),
            ReplyError::Context(e) => {
                tracing::error!(error = %e, "Failed to build conversation context");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("failed to load conversation history: {}", e),
                )
            }
        }
    }
}
