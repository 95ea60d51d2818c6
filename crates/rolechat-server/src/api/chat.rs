use crate::api::{ApiError, state::AppState};
use crate::middleware::AuthUser;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use rolechat_core::models::{ChatMessage, ChatRole, Topic};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub topic_id: u64,
    #[serde(default)]
    pub role: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct TopicRef {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct MessageRef {
    pub id: u64,
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub new_topic: bool,
    pub topic: TopicRef,
    pub message: MessageRef,
}

// GET /api/chat/topics
pub async fn list_topics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Topic>>, ApiError> {
    let topics = state.core.chat.list_topics(user.user_id, query.limit).await?;
    Ok(Json(topics))
}

// GET /api/chat/topics/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(topic_id): Path<u64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let messages = state
        .core
        .chat
        .list_messages(user.user_id, topic_id, query.limit, query.offset.unwrap_or(0))
        .await?;
    Ok(Json(messages))
}

// POST /api/chat/message
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let role_name = request.role.unwrap_or_default();
    let role = ChatRole::parse(&role_name)
        .ok_or_else(|| ApiError::bad_request(format!("invalid role: {}", role_name)))?;

    let added = state
        .core
        .chat
        .add_message(user.user_id, request.topic_id, role, &request.content)
        .await?;

    Ok(Json(SendMessageResponse {
        new_topic: added.new_topic,
        topic: TopicRef {
            id: added.topic.id,
            title: added.topic.title,
        },
        message: MessageRef {
            id: added.message.id,
            role: added.message.role,
            content: added.message.content,
        },
    }))
}
