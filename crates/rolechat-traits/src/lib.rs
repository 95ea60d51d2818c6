//! RoleChat Traits - Shared trait definitions for the streaming reply core.
//!
//! This crate provides the interfaces the reply pipeline consumes from its
//! collaborators:
//! - `MessageStore` - append to and read the tail of a topic's history
//! - `PersonaRegistry` - read-only persona lookup by role key
//! - Chat message and persona data types shared by both sides of the seams

pub mod error;
pub mod persona;
pub mod store;

// ── Top-level re-exports ─────────────────────────────────────────────

pub use error::{Result as StoreResult, StoreError};
pub use persona::{Persona, PersonaRegistry};
pub use store::{ChatMessage, ChatRole, MessageStore};
