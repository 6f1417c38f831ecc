//! Client-side conversation state for a Hangouts-style chat service.
//!
//! This module keeps one [`ConversationStore`] per conversation, organized into:
//! - `core`: Configuration, errors, IDs, conversation records and message content
//! - `events`: Wire event decoding and the sorted event cache
//! - `presence`: Typing status and read watermarks
//! - `client`: The chat client abstraction and an offline implementation
//! - `engine`: The store itself, the conversation registry, observers and the send queue
//! - `logging`: Tracing subscriber setup

pub mod client;
pub mod core;
pub mod engine;
pub mod events;
pub mod logging;
pub mod presence;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types for convenience
pub use client::{ChatClient, ClientFuture, HistoryResponse, OfflineClient, ResponseStatus, SendMessageRequest};
pub use core::{
    ChatSegment, Content, Conversation, ConversationError, ConversationId, ConversationPatch,
    ConversationResult, ConversationType, ConversationView, DeliveryMedium, DuplicatePolicy,
    EventId, ImageId, ImageUpload, MessageDraft, NotificationLevel, OffTheRecordStatus,
    Participant, StoreConfig, Timestamp, UserId,
};
pub use engine::{
    ConversationList, ConversationListObserver, ConversationObserver, ConversationStore,
    SendFuture, SendQueue,
};
pub use events::{ConversationEvent, EventCache, EventKind, WireEvent, WireEventType};
pub use logging::init_tracing;
pub use presence::{TypingStatus, WatermarkNotification};
