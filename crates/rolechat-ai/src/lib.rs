//! RoleChat AI - upstream token source for streamed role-play replies.
//!
//! This crate provides:
//! - `LlmClient`, a streaming completion abstraction yielding text fragments
//! - An OpenAI-compatible streaming client (Zhipu and OpenAI presets)
//! - A scripted mock client for tests and offline development
//! - A factory that builds the configured client

pub mod error;
mod http_client;
pub mod llm;

// Re-export commonly used types
pub use error::{AiError, Result};
pub use llm::{
    CompletionRequest, ContentFormat, LlmClient, LlmProvider, LlmSettings, Message, MockLlmClient,
    MockStep, MockStepKind, OpenAIClient, Role, TokenStream, create_client,
};
