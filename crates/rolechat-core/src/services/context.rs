//! Prompt assembly for a role-play exchange.

use std::sync::Arc;

use rolechat_ai::{CompletionRequest, Message, Role};
use rolechat_traits::{ChatRole, MessageStore, Persona, StoreResult};

use crate::streaming::DEFAULT_HISTORY_LIMIT;

/// Ordered turns sent upstream for one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationContext {
    messages: Vec<Message>,
}

impl ConversationContext {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_request(self, temperature: f32, max_tokens: Option<u32>) -> CompletionRequest {
        let request = CompletionRequest::new(self.messages).with_temperature(temperature);
        match max_tokens {
            Some(max) => request.with_max_tokens(max),
            None => request,
        }
    }
}

/// Builds persona instruction + recent history + new user text.
#[derive(Clone)]
pub struct ContextBuilder {
    store: Arc<dyn MessageStore>,
    history_limit: usize,
}

impl ContextBuilder {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self {
            store,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Fails only when the message history cannot be read.
    pub async fn build(
        &self,
        topic_id: u64,
        persona: &Persona,
        user_text: &str,
    ) -> StoreResult<ConversationContext> {
        let history = self.store.list_recent(topic_id, self.history_limit).await?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(instruction) = persona.system_instruction() {
            messages.push(Message::system(instruction));
        }
        messages.extend(history.into_iter().map(|m| Message {
            role: upstream_role(m.role),
            content: m.content,
        }));
        messages.push(Message::user(user_text));

        Ok(ConversationContext { messages })
    }
}

fn upstream_role(role: ChatRole) -> Role {
    match role {
        ChatRole::System => Role::System,
        ChatRole::User => Role::User,
        ChatRole::Assistant => Role::Assistant,
    }
}
