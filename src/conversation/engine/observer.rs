//! Observer interfaces exposed by conversation stores.

use crate::conversation::core::ids::{ConversationId, UserId};
use crate::conversation::events::event::ConversationEvent;
use crate::conversation::presence::typing::TypingStatus;
use crate::conversation::presence::watermark::WatermarkNotification;

/// Receives changes of a single conversation.
///
/// Every method has an empty default so implementors only override what they
/// render. Calls happen after the store has released its internal lock, so an
/// observer may call back into the store.
pub trait ConversationObserver: Send + Sync {
    /// A participant's typing status changed.
    fn on_typing_changed(&self, _conversation: &ConversationId, _user: &UserId, _status: TypingStatus) {
    }

    /// A live event arrived.
    fn on_event(&self, _conversation: &ConversationId, _event: &ConversationEvent) {}

    /// A participant's read watermark arrived.
    fn on_watermark_notification(
        &self,
        _conversation: &ConversationId,
        _notification: &WatermarkNotification,
    ) {
    }

    /// Older events were fetched and merged into the cache.
    fn on_events_loaded(&self, _conversation: &ConversationId, _events: &[ConversationEvent]) {}

    /// Conversation metadata or read state changed.
    fn on_conversation_updated(&self, _conversation: &ConversationId) {}
}

/// Parent collection that re-sorts when a conversation changes.
pub trait ConversationListObserver: Send + Sync {
    /// Conversation metadata or read state changed.
    fn on_conversation_updated(&self, conversation: &ConversationId);
}
