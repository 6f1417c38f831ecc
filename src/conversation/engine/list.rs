//! Registry of conversation stores.
//!
//! Routes server pushes to the right store and tracks record changes so a
//! front end can re-sort its conversation list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::debug;

use crate::conversation::core::errors::{ConversationError, ConversationResult};
use crate::conversation::core::ids::{ConversationId, UserId};
use crate::conversation::engine::observer::ConversationListObserver;
use crate::conversation::engine::store::ConversationStore;
use crate::conversation::events::event::{ConversationEvent, WireEvent};
use crate::conversation::presence::typing::TypingStatus;
use crate::conversation::presence::watermark::WatermarkNotification;

/// Collection of conversation stores keyed by conversation id.
#[derive(Default)]
pub struct ConversationList {
    stores: DashMap<ConversationId, Arc<ConversationStore>>,
    updates: AtomicU64,
}

impl ConversationList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a store, replacing any store with the same id.
    pub fn insert(self: &Arc<Self>, store: ConversationStore) -> Arc<ConversationStore> {
        let list: Weak<Self> = Arc::downgrade(self);
        store.set_list(list);
        let store = Arc::new(store);
        if self.stores.insert(store.id().clone(), Arc::clone(&store)).is_some() {
            debug!(conversation = %store.id(), "replaced conversation store");
        }
        store
    }

    /// Store of a conversation.
    #[must_use]
    pub fn get(&self, id: &ConversationId) -> Option<Arc<ConversationStore>> {
        self.stores.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a store.
    pub fn remove(&self, id: &ConversationId) -> Option<Arc<ConversationStore>> {
        self.stores.remove(id).map(|(_, store)| store)
    }

    /// Number of stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// True if no store is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    fn store(&self, id: &ConversationId) -> ConversationResult<Arc<ConversationStore>> {
        self.get(id)
            .ok_or_else(|| ConversationError::MissingConversation(id.clone()))
    }

    /// Deliver a live event to its conversation.
    ///
    /// # Errors
    /// Returns `MissingConversation` if the conversation is not registered.
    pub fn route_event(&self, event: WireEvent) -> ConversationResult<ConversationEvent> {
        self.store(&event.conversation_id)?.handle_event(event)
    }

    /// Deliver a typing notification; returns whether the status changed.
    ///
    /// # Errors
    /// Returns `MissingConversation` if the conversation is not registered.
    pub fn route_typing(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
        status: TypingStatus,
    ) -> ConversationResult<bool> {
        Ok(self.store(conversation_id)?.handle_typing_status(status, user))
    }

    /// Deliver a watermark notification.
    ///
    /// # Errors
    /// Returns `MissingConversation` if the conversation is not registered.
    pub fn route_watermark(&self, notification: &WatermarkNotification) -> ConversationResult<()> {
        self.store(&notification.conversation_id)?
            .handle_watermark_notification(notification);
        Ok(())
    }

    /// Stores ordered by last activity, most recent first.
    #[must_use]
    pub fn by_recency(&self) -> Vec<Arc<ConversationStore>> {
        let mut stores: Vec<_> = self
            .stores
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        stores.sort_by(|a, b| {
            b.last_modified()
                .cmp(&a.last_modified())
                .then_with(|| a.id().cmp(b.id()))
        });
        stores
    }

    /// Number of record updates reported by member stores.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}

impl ConversationListObserver for ConversationList {
    fn on_conversation_updated(&self, conversation: &ConversationId) {
        let count = self.updates.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(conversation = %conversation, updates = count, "conversation updated");
    }
}
