pub mod models;
pub mod registry;
pub mod services;
pub mod storage;
pub mod streaming;

pub use models::*;

use std::path::Path;
use std::sync::Arc;

use rolechat_ai::LlmClient;
use rolechat_traits::PersonaRegistry;
use services::{ChatService, RoleReplyService};
use storage::Storage;
use streaming::StreamSettings;
use tracing::{info, warn};

/// Core application state shared by the HTTP layer.
///
/// `role_reply` is `None` when no upstream model is configured; the chat
/// history API still works in that case.
pub struct AppCore {
    pub storage: Arc<Storage>,
    pub chat: ChatService,
    pub personas: Arc<dyn PersonaRegistry>,
    pub role_reply: Option<RoleReplyService>,
}

impl AppCore {
    pub fn new(
        db_path: impl AsRef<Path>,
        personas: Arc<dyn PersonaRegistry>,
        llm: Option<Arc<dyn LlmClient>>,
        settings: StreamSettings,
    ) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(db_path)?);
        Ok(Self::with_storage(storage, personas, llm, settings))
    }

    pub fn with_storage(
        storage: Arc<Storage>,
        personas: Arc<dyn PersonaRegistry>,
        llm: Option<Arc<dyn LlmClient>>,
        settings: StreamSettings,
    ) -> Self {
        let chat = ChatService::new(storage.clone());
        let role_reply = match llm {
            Some(llm) => {
                info!(provider = llm.provider(), model = llm.model(), "Role reply streaming enabled");
                Some(RoleReplyService::new(chat.clone(), personas.clone(), llm, settings))
            }
            None => {
                warn!("No LLM client configured, role reply streaming disabled");
                None
            }
        };

        Self {
            storage,
            chat,
            personas,
            role_reply,
        }
    }

    /// Sampling parameters sent with every upstream request.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: Option<u32>) -> Self {
        self.role_reply = self
            .role_reply
            .map(|service| service.with_sampling(temperature, max_tokens));
        self
    }
}
