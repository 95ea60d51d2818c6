//! Errors surfaced by collaborator implementations.

use thiserror::Error;

/// Failure reported by a [`crate::MessageStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("topic {0} not found")]
    TopicNotFound(u64),

    #[error("message content required")]
    EmptyContent,

    #[error("message store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
