use std::convert::Infallible;

use axum::{
    Extension, Json,
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use rolechat_core::services::ReplyRequest;
use rolechat_core::streaming::{SessionReport, SseTransport, sse_headers};
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::api::{ApiError, state::AppState};
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct RoleReplyRequest {
    #[serde(default)]
    pub topic_id: u64,
    #[serde(default)]
    pub persona_name: Option<String>,
    #[serde(default)]
    pub role_id: Option<String>,
    pub content: String,
}

// POST /api/chat/role-reply/stream
pub async fn stream_role_reply(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<RoleReplyRequest>,
) -> Result<Response, ApiError> {
    let Some(service) = state.core.role_reply.as_ref() else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "role reply streaming is not configured",
        ));
    };

    let role_key =
        ReplyRequest::select_role_key(request.role_id.as_deref(), request.persona_name.as_deref());
    let prepared = service
        .prepare(ReplyRequest {
            user_id: user.user_id,
            topic_id: request.topic_id,
            role_key,
            content: request.content,
        })
        .await?;

    tracing::info!(
        user_id = user.user_id,
        topic_id = prepared.topic.id,
        new_topic = prepared.new_topic,
        persona = %prepared.persona.name,
        "Streaming role reply"
    );

    let (transport, body) = SseTransport::channel();
    let cancel = state.shutdown.child_token();
    let topic_id = prepared.topic.id;
    let session = tokio::spawn(prepared.run(transport, cancel));
    tokio::spawn(join_session(topic_id, session));

    let body = Body::from_stream(body.map(Ok::<_, Infallible>));
    Ok((sse_headers(), body).into_response())
}

/// Wait for a spawned session so a panic inside it is logged.
async fn join_session(topic_id: u64, session: JoinHandle<SessionReport>) -> Option<SessionReport> {
    match session.await {
        Ok(report) => {
            tracing::debug!(topic_id, outcome = report.outcome.as_str(), "Session task joined");
            Some(report)
        }
        Err(e) => {
            tracing::error!(topic_id, error = %e, "Session task failed");
            None
        }
    }
}
