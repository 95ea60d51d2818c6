//! Streamed role-play replies: validation, context, then the session.

use std::sync::Arc;

use rolechat_ai::{LlmClient, LlmSettings, TokenStream};
use rolechat_traits::{ChatMessage, ChatRole, MessageStore, Persona, PersonaRegistry, StoreError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::models::Topic;
use crate::services::chat::{ChatError, ChatService};
use crate::services::context::ContextBuilder;
use crate::streaming::{SessionReport, SseTransport, StreamSession, StreamSettings};

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("Invalid role/persona: {0}")]
    InvalidPersona(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("failed to load conversation history: {0}")]
    Context(#[from] StoreError),
}

/// One incoming request for a streamed reply.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    pub user_id: u64,
    /// `0` creates a new topic
    pub topic_id: u64,
    pub role_key: String,
    pub content: String,
}

impl ReplyRequest {
    /// Pick the role key: `role_id` when present, else `persona_name`.
    pub fn select_role_key(role_id: Option<&str>, persona_name: Option<&str>) -> String {
        [role_id, persona_name]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|key| !key.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// A validated exchange whose user message is already stored.
pub struct PreparedReply {
    pub topic: Topic,
    pub new_topic: bool,
    pub user_message: ChatMessage,
    pub persona: Persona,
    session_store: Arc<dyn MessageStore>,
    settings: StreamSettings,
    upstream: TokenStream,
}

impl PreparedReply {
    /// Stream the reply into `transport` until it ends or `cancel` fires.
    pub async fn run(self, transport: SseTransport, cancel: CancellationToken) -> SessionReport {
        StreamSession::new(self.topic.id, self.session_store, transport, self.settings)
            .run(self.upstream, cancel)
            .await
    }
}

/// Everything needed to start streamed replies.
#[derive(Clone)]
pub struct RoleReplyService {
    chat: ChatService,
    personas: Arc<dyn PersonaRegistry>,
    llm: Arc<dyn LlmClient>,
    context: ContextBuilder,
    settings: StreamSettings,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl RoleReplyService {
    pub fn new(
        chat: ChatService,
        personas: Arc<dyn PersonaRegistry>,
        llm: Arc<dyn LlmClient>,
        settings: StreamSettings,
    ) -> Self {
        let context = ContextBuilder::new(Arc::new(chat.clone()))
            .with_history_limit(settings.history_limit);
        let defaults = LlmSettings::default();
        Self {
            chat,
            personas,
            llm,
            context,
            settings,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Replace the history source used for prompts.
    pub fn with_context(mut self, context: ContextBuilder) -> Self {
        self.context = context;
        self
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    /// Validate the request, assemble the prompt, store the user message and
    /// open the upstream. Every failure here happens before any byte is
    /// streamed, and nothing is written unless the user message is stored.
    pub async fn prepare(&self, request: ReplyRequest) -> Result<PreparedReply, ReplyError> {
        let persona = self
            .personas
            .lookup(&request.role_key)
            .ok_or_else(|| ReplyError::InvalidPersona(request.role_key.clone()))?;
        if request.content.trim().is_empty() {
            return Err(ChatError::EmptyContent.into());
        }
        if request.topic_id != 0 {
            self.chat.owned_topic(request.user_id, request.topic_id).await?;
        }

        // History is read before the new user turn is stored so it is not
        // sent twice. Topic id 0 has no history.
        let context = self
            .context
            .build(request.topic_id, &persona, &request.content)
            .await?;

        let added = self
            .chat
            .add_message(request.user_id, request.topic_id, ChatRole::User, &request.content)
            .await?;
        let topic = added.topic;

        tracing::debug!(
            topic_id = topic.id,
            persona = %persona.name,
            turns = context.len(),
            provider = self.llm.provider(),
            model = self.llm.model(),
            "Opening role reply stream"
        );
        let upstream = self
            .llm
            .complete_stream(context.into_request(self.temperature, self.max_tokens));

        Ok(PreparedReply {
            topic,
            new_topic: added.new_topic,
            user_message: added.message,
            persona,
            session_store: Arc::new(self.chat.clone()),
            settings: self.settings.clone(),
            upstream,
        })
    }
}
