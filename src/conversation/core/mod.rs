//! Core conversation types and identifiers.

pub mod config;
pub mod content;
pub mod errors;
pub mod ids;
pub mod record;

pub use config::{DUPLICATE_POLICY_ENV, DuplicatePolicy, StoreConfig};
pub use content::{
    ChatSegment, Content, Formatting, ImageUpload, MessageDraft, SegmentKind, content_types,
};
pub use errors::{ConversationError, ConversationResult};
pub use ids::{ConversationId, EventId, ImageId, Timestamp, UserId};
pub use record::{
    Conversation, ConversationPatch, ConversationType, ConversationView, DeliveryMedium,
    DeliveryMediumOption, NotificationLevel, OffTheRecordStatus, Participant,
    SelfConversationState, SelfReadState,
};
