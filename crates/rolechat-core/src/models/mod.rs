//! Domain models persisted by the chat storage layer.

mod topic;

pub use rolechat_traits::{ChatMessage, ChatRole, Persona};
pub use topic::{Topic, derive_title};
