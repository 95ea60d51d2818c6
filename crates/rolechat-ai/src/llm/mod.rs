//! LLM client module

mod client;
mod factory;
mod mock_client;
mod openai;
mod sse;

pub use client::{CompletionRequest, LlmClient, Message, Role, TokenStream};
pub use factory::{LlmProvider, LlmSettings, create_client};
pub use mock_client::{MockLlmClient, MockStep, MockStepKind};
pub use openai::{ContentFormat, OpenAIClient};
