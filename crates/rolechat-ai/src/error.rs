//! Error types for the AI module

use reqwest::Response;
use thiserror::Error;

/// Upstream error bodies longer than this are truncated before being
/// surfaced, so large or sensitive provider responses never reach clients.
const MAX_ERROR_BODY: usize = 512;

/// AI module error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{provider} error {status}: {message}")]
    LlmHttp {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for AI operations
pub type Result<T> = std::result::Result<T, AiError>;

/// Convert a non-success provider response into an [`AiError::LlmHttp`].
pub async fn response_to_error(response: Response, provider: &str) -> AiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let message = if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &body[..end])
    } else {
        body
    };

    AiError::LlmHttp {
        provider: provider.to_string(),
        status,
        message,
    }
}
