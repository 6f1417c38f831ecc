//! Error types for conversation state.

use thiserror::Error;

use crate::conversation::core::ids::{ConversationId, EventId};

/// Conversation subsystem error type.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// Message content cannot be rendered or sent by this service.
    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),
    /// The server rejected a request as invalid.
    #[error("invalid server response: {0}")]
    InvalidServerResponse(String),
    /// No cached event has the given id.
    #[error("event not found: {0}")]
    MissingEvent(EventId),
    /// No known conversation has the given id.
    #[error("conversation not found: {0}")]
    MissingConversation(ConversationId),
    /// An event was handed to the store of a different conversation.
    #[error("event {event} belongs to conversation {conversation}")]
    ForeignEvent {
        /// Offending event.
        event: EventId,
        /// Conversation the event belongs to.
        conversation: ConversationId,
    },
    /// The chat client failed to complete a request.
    #[error("client error: {0}")]
    Client(String),
    /// The send queue worker is gone.
    #[error("send queue closed")]
    QueueClosed,
    /// A store was created outside of a tokio runtime.
    #[error("no tokio runtime available to drive the send queue")]
    NoRuntime,
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversationError {
    /// True if the failure came from the remote side rather than local state.
    #[must_use]
    pub const fn is_client_failure(&self) -> bool {
        matches!(self, Self::Client(_) | Self::InvalidServerResponse(_))
    }
}

/// Convenience result alias for conversation operations.
pub type ConversationResult<T> = Result<T, ConversationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_failure_classification() {
        assert!(ConversationError::Client("boom".to_string()).is_client_failure());
        assert!(ConversationError::InvalidServerResponse("x".to_string()).is_client_failure());
        assert!(!ConversationError::MissingEvent(EventId::new("e")).is_client_failure());
        assert!(!ConversationError::QueueClosed.is_client_failure());
    }

    #[test]
    fn test_display_messages() {
        let err = ConversationError::MissingEvent(EventId::new("e1"));
        assert_eq!(err.to_string(), "event not found: e1");
        let err = ConversationError::UnsupportedContent("image".to_string());
        assert_eq!(err.to_string(), "unsupported content type: image");
    }
}
