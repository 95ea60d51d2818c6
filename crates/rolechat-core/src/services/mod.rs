//! Application services used by the HTTP layer.

pub mod chat;
pub mod context;
pub mod role_reply;

pub use chat::{AddedMessage, ChatError, ChatService};
pub use context::{ContextBuilder, ConversationContext};
pub use role_reply::{PreparedReply, ReplyError, ReplyRequest, RoleReplyService};
