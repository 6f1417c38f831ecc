//! Event model and event cache.

pub mod cache;
pub mod event;

pub use cache::{EventCache, InsertOutcome};
pub use event::{
    ChatMessagePayload, ConversationEvent, EventKind, MembershipChangePayload,
    MembershipChangeType, RenamePayload, WireEvent, WireEventType,
};
