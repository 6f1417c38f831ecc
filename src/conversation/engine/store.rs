//! Conversation store: event cache, read state and outgoing actions for one
//! conversation.
//!
//! All state sits behind a single mutex that is never held across an await
//! point or while observers run. Remote work goes through the [`ChatClient`];
//! outgoing messages go through a per-conversation [`SendQueue`] so they reach
//! the server in call order.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, warn};

use crate::conversation::client::{ChatClient, ResponseStatus, SendMessageRequest};
use crate::conversation::core::config::StoreConfig;
use crate::conversation::core::content::MessageDraft;
use crate::conversation::core::errors::{ConversationError, ConversationResult};
use crate::conversation::core::ids::{ConversationId, EventId, Timestamp, UserId};
use crate::conversation::core::record::{
    Conversation, ConversationPatch, ConversationType, ConversationView, NotificationLevel,
    OffTheRecordStatus, Participant,
};
use crate::conversation::engine::observer::{ConversationListObserver, ConversationObserver};
use crate::conversation::engine::send_queue::SendQueue;
use crate::conversation::events::cache::{EventCache, InsertOutcome};
use crate::conversation::events::event::{ConversationEvent, WireEvent};
use crate::conversation::presence::typing::{TypingStatus, TypingTracker};
use crate::conversation::presence::watermark::{
    ParticipantWatermarks, ReadWatermark, WatermarkNotification,
};

/// Completion of a queued message send.
pub type SendFuture = Pin<Box<dyn Future<Output = ConversationResult<()>> + Send + 'static>>;

struct StoreState {
    conversation: Conversation,
    events: EventCache,
    typing: TypingTracker,
    remote_watermarks: ParticipantWatermarks,
    observer: Option<Arc<dyn ConversationObserver>>,
    list: Option<Weak<dyn ConversationListObserver>>,
}

/// True if `event` belongs to `conversation`; logs the drop otherwise.
fn owned_by(conversation: &ConversationId, event: &WireEvent) -> bool {
    let ours = &event.conversation_id == conversation;
    if !ours {
        warn!(
            conversation = %conversation,
            event = %event.event_id,
            other = %event.conversation_id,
            "dropping event from another conversation"
        );
    }
    ours
}

/// State and actions of a single conversation.
pub struct ConversationStore {
    id: ConversationId,
    self_user: UserId,
    config: StoreConfig,
    client: Arc<dyn ChatClient>,
    send_queue: SendQueue,
    state: Mutex<StoreState>,
}

impl ConversationStore {
    /// Create a store and seed it with already-known events.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or no tokio runtime is
    /// available for the send queue.
    pub fn new(
        client: Arc<dyn ChatClient>,
        self_user: UserId,
        conversation: Conversation,
        events: Vec<WireEvent>,
        config: StoreConfig,
    ) -> ConversationResult<Self> {
        config.validate()?;
        let id = conversation.id.clone();
        let send_queue = SendQueue::spawn(id.clone())?;

        let mut cache = EventCache::new(config.duplicate_policy);
        cache.extend(
            events
                .into_iter()
                .filter(|event| owned_by(&id, event))
                .map(ConversationEvent::from_wire),
        );
        debug!(conversation = %id, events = cache.len(), "conversation store created");

        Ok(Self {
            id,
            self_user,
            config,
            client,
            send_queue,
            state: Mutex::new(StoreState {
                conversation,
                events: cache,
                typing: TypingTracker::new(),
                remote_watermarks: ParticipantWatermarks::default(),
                observer: None,
                list: None,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observer(&self) -> Option<Arc<dyn ConversationObserver>> {
        self.state().observer.clone()
    }

    fn notify_updated(&self) {
        let (observer, list) = {
            let state = self.state();
            (
                state.observer.clone(),
                state.list.as_ref().and_then(Weak::upgrade),
            )
        };
        if let Some(observer) = observer {
            observer.on_conversation_updated(&self.id);
        }
        if let Some(list) = list {
            list.on_conversation_updated(&self.id);
        }
    }

    /// Install or clear the observer.
    pub fn set_observer(&self, observer: Option<Arc<dyn ConversationObserver>>) {
        self.state().observer = observer;
    }

    /// Attach the parent collection.
    pub fn set_list(&self, list: Weak<dyn ConversationListObserver>) {
        self.state().list = Some(list);
    }

    /// Conversation id.
    #[must_use]
    pub const fn id(&self) -> &ConversationId {
        &self.id
    }

    /// Local user id.
    #[must_use]
    pub const fn self_user(&self) -> &UserId {
        &self.self_user
    }

    /// Snapshot of the conversation record.
    #[must_use]
    pub fn conversation(&self) -> Conversation {
        self.state().conversation.clone()
    }

    // ===== Event cache =====================================================

    /// Decode and cache a wire event, returning the event now stored under
    /// its id.
    ///
    /// # Errors
    /// Returns `ForeignEvent` if the event belongs to another conversation.
    pub fn add_event(&self, event: WireEvent) -> ConversationResult<ConversationEvent> {
        if !owned_by(&self.id, &event) {
            return Err(ConversationError::ForeignEvent {
                event: event.event_id,
                conversation: event.conversation_id,
            });
        }
        let event = ConversationEvent::from_wire(event);
        let mut state = self.state();
        let stored = match state.events.insert(event.clone()) {
            InsertOutcome::Inserted => event,
            InsertOutcome::Replaced => {
                debug!(conversation = %self.id, event = %event.id, "replaced cached event");
                event
            }
            InsertOutcome::Ignored => {
                debug!(conversation = %self.id, event = %event.id, "ignored duplicate event");
                state.events.get(&event.id).cloned().unwrap_or(event)
            }
        };
        drop(state);
        Ok(stored)
    }

    /// All cached events, oldest first.
    #[must_use]
    pub fn events(&self) -> Arc<[ConversationEvent]> {
        self.state().events.sorted()
    }

    /// Cached event by id.
    #[must_use]
    pub fn get_event(&self, id: &EventId) -> Option<ConversationEvent> {
        self.state().events.get(id).cloned()
    }

    /// Event after (or before, with `prev`) the given one in time order.
    ///
    /// # Errors
    /// Returns `MissingEvent` if `id` is not cached.
    pub fn next_event(&self, id: &EventId, prev: bool) -> ConversationResult<Option<ConversationEvent>> {
        let events = self.events();
        let index = events
            .iter()
            .position(|event| &event.id == id)
            .ok_or_else(|| ConversationError::MissingEvent(id.clone()))?;
        let neighbour = if prev {
            index.checked_sub(1).and_then(|i| events.get(i))
        } else {
            events.get(index + 1)
        };
        Ok(neighbour.cloned())
    }

    /// Cached chat messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<ConversationEvent> {
        self.events()
            .iter()
            .filter(|event| event.is_chat_message())
            .cloned()
            .collect()
    }

    /// Cached events newer than the local read watermark.
    #[must_use]
    pub fn unread_events(&self) -> Vec<ConversationEvent> {
        let state = self.state();
        state
            .events
            .newer_than(state.conversation.latest_read_timestamp())
    }

    /// True if any cached event is unread.
    #[must_use]
    pub fn has_unread_events(&self) -> bool {
        !self.unread_events().is_empty()
    }

    /// Handle a live event pushed by the server.
    ///
    /// # Errors
    /// Returns `ForeignEvent` if the event belongs to another conversation.
    pub fn handle_event(&self, event: WireEvent) -> ConversationResult<ConversationEvent> {
        let event = self.add_event(event)?;
        match self.observer() {
            Some(observer) => observer.on_event(&self.id, &event),
            None if event.sender != self.self_user => {
                debug!(
                    conversation = %self.id,
                    sender = %event.sender,
                    kind = %event.kind,
                    "event received with no observer"
                );
            }
            None => {}
        }
        Ok(event)
    }

    /// Events before an anchor, fetching history when the cache runs out.
    ///
    /// Without an anchor, returns every cached event. With an anchor that is
    /// not the oldest cached event, returns the cached events from the anchor
    /// onwards. With the oldest event as anchor, fetches up to `max_count`
    /// older events (`0` means the configured page size), merges them into
    /// the cache and returns the fetched batch as cached, so ids the duplicate
    /// policy kept from before come back in their cached form.
    ///
    /// # Errors
    /// Returns `MissingEvent` for an unknown anchor, `InvalidServerResponse`
    /// when the server rejects the fetch, or the client's error.
    pub async fn get_events(
        &self,
        before: Option<&EventId>,
        max_count: usize,
    ) -> ConversationResult<Vec<ConversationEvent>> {
        let Some(anchor_id) = before else {
            return Ok(self.events().to_vec());
        };

        let anchor = {
            let state = self.state();
            let anchor = state
                .events
                .get(anchor_id)
                .cloned()
                .ok_or_else(|| ConversationError::MissingEvent(anchor_id.clone()))?;
            let is_oldest = state
                .events
                .oldest()
                .is_some_and(|oldest| oldest.id == anchor.id);
            if !is_oldest {
                return Ok(state.events.from_event(anchor_id).unwrap_or_default());
            }
            anchor
        };

        let max_count = if max_count == 0 {
            self.config.history_page_size
        } else {
            max_count
        };
        debug!(conversation = %self.id, before = %anchor.timestamp, max_count, "fetching history");

        let response = self
            .client
            .get_conversation(self.id.clone(), anchor.timestamp, max_count)
            .await
            .inspect_err(|err| warn!(conversation = %self.id, %err, "history fetch failed"))?;

        if response.status != ResponseStatus::Ok {
            warn!(conversation = %self.id, status = ?response.status, "history fetch rejected");
            return Err(ConversationError::InvalidServerResponse(format!(
                "history fetch for {} returned {:?}",
                self.id, response.status
            )));
        }

        let fetched: Vec<ConversationEvent> = response
            .events
            .into_iter()
            .filter(|event| owned_by(&self.id, event))
            .map(ConversationEvent::from_wire)
            .collect();

        let mut batch: Vec<ConversationEvent> = {
            let mut state = self.state();
            let ids: Vec<EventId> = fetched.iter().map(|event| event.id.clone()).collect();
            state.events.extend(fetched);
            ids.iter()
                .filter_map(|id| state.events.get(id).cloned())
                .collect()
        };
        batch.sort_by(|a, b| (a.timestamp, &a.id).cmp(&(b.timestamp, &b.id)));
        batch.dedup_by(|a, b| a.id == b.id);

        info!(conversation = %self.id, loaded = batch.len(), "history loaded");

        if let Some(observer) = self.observer() {
            observer.on_events_loaded(&self.id, &batch);
        }
        Ok(batch)
    }

    // ===== Conversation record =============================================

    /// Replace the record with a server update.
    ///
    /// Updates are deltas; a zero read timestamp means "not included", so the
    /// previous value is kept.
    pub fn update_conversation(&self, conversation: Conversation) {
        {
            let mut state = self.state();
            let previous = state.conversation.latest_read_timestamp();
            state.conversation = conversation;
            if state.conversation.latest_read_timestamp().is_zero() {
                state.conversation.set_latest_read_timestamp(previous);
            }
        }
        debug!(conversation = %self.id, "conversation record replaced");
        self.notify_updated();
    }

    /// Apply an explicit delta to the record.
    pub fn apply_patch(&self, patch: ConversationPatch) {
        if patch.is_empty() {
            return;
        }
        patch.apply_to(&mut self.state().conversation);
        debug!(conversation = %self.id, "conversation record patched");
        self.notify_updated();
    }

    // ===== Typing and read state ===========================================

    /// Record a participant's typing status; returns whether it changed.
    pub fn handle_typing_status(&self, status: TypingStatus, user: &UserId) -> bool {
        let (changed, observer) = {
            let mut state = self.state();
            (state.typing.update(user, status), state.observer.clone())
        };
        if changed && let Some(observer) = observer {
            observer.on_typing_changed(&self.id, user, status);
        }
        changed
    }

    /// Last typing status of a participant.
    #[must_use]
    pub fn typing_status(&self, user: &UserId) -> Option<TypingStatus> {
        self.state().typing.status(user)
    }

    /// True if a participant other than the local user is typing.
    #[must_use]
    pub fn other_user_is_typing(&self) -> bool {
        self.state().typing.anyone_typing_except(&self.self_user)
    }

    /// Handle a read watermark pushed by the server.
    pub fn handle_watermark_notification(&self, notification: &WatermarkNotification) {
        let local_moved = {
            let mut state = self.state();
            if notification.user_id == self.self_user {
                let mut mark = ReadWatermark::new(state.conversation.latest_read_timestamp());
                let moved = mark.advance(notification.read_timestamp);
                state.conversation.set_latest_read_timestamp(mark.get());
                moved
            } else {
                state
                    .remote_watermarks
                    .advance(&notification.user_id, notification.read_timestamp);
                false
            }
        };

        if let Some(observer) = self.observer() {
            observer.on_watermark_notification(&self.id, notification);
        }
        if local_moved {
            self.notify_updated();
        }
    }

    /// Local read watermark.
    #[must_use]
    pub fn latest_read_timestamp(&self) -> Timestamp {
        self.state().conversation.latest_read_timestamp()
    }

    /// Read watermark reported for another participant.
    #[must_use]
    pub fn participant_watermark(&self, user: &UserId) -> Option<Timestamp> {
        self.state().remote_watermarks.get(user)
    }

    /// Mark events up to `timestamp` (default: newest cached event) as read.
    ///
    /// The local watermark moves before the request is sent, so repeated calls
    /// while it is in flight do nothing. Returns whether a request was sent.
    ///
    /// # Errors
    /// Returns the client's error if the request fails.
    pub async fn update_read_timestamp(&self, timestamp: Option<Timestamp>) -> ConversationResult<bool> {
        let target = {
            let mut state = self.state();
            let Some(target) = timestamp.or_else(|| state.events.newest().map(|e| e.timestamp)) else {
                return Ok(false);
            };
            let mut mark = ReadWatermark::new(state.conversation.latest_read_timestamp());
            if !mark.advance(target) {
                return Ok(false);
            }
            state.conversation.set_latest_read_timestamp(mark.get());
            target
        };

        self.notify_updated();
        info!(conversation = %self.id, read = %target, "updating watermark");
        self.client
            .update_watermark(self.id.clone(), target)
            .await
            .inspect_err(|err| warn!(conversation = %self.id, %err, "watermark update failed"))?;
        Ok(true)
    }

    // ===== Outgoing actions ================================================

    /// Queue a message for sending.
    ///
    /// The off-the-record flag and delivery medium are taken from the record
    /// at call time. An attached image is uploaded first and its id replaces
    /// any explicit `image_id`. Messages of one conversation reach the client
    /// in call order; the returned future resolves when this message's
    /// round-trip is done.
    pub fn send_message(&self, draft: MessageDraft) -> SendFuture {
        let (expected_otr, delivery_medium) = {
            let state = self.state();
            (
                state.conversation.otr_status,
                state.conversation.default_delivery_medium(),
            )
        };
        let client = Arc::clone(&self.client);
        let conversation_id = self.id.clone();
        let client_generated_id = rand::random::<u64>();
        debug!(conversation = %conversation_id, client_generated_id, "message queued");

        Box::pin(self.send_queue.enqueue(async move {
            let MessageDraft {
                segments,
                image,
                image_id,
            } = draft;

            let image_id = match image {
                Some(upload) => Some(client.upload_image(upload).await.inspect_err(|err| {
                    warn!(conversation = %conversation_id, %err, "image upload failed");
                })?),
                None => image_id,
            };

            let request = SendMessageRequest {
                conversation_id: conversation_id.clone(),
                client_generated_id,
                segments,
                image_id,
                expected_otr,
                delivery_medium,
            };
            client
                .send_chat_message(request)
                .await
                .inspect(|_| info!(conversation = %conversation_id, "message sent"))
                .inspect_err(|err| warn!(conversation = %conversation_id, %err, "message send failed"))
        }))
    }

    /// Leave the conversation: group conversations remove the local user,
    /// one-to-one conversations are deleted.
    ///
    /// # Errors
    /// Returns the client's error if the request fails.
    pub async fn leave(&self) -> ConversationResult<()> {
        let conversation_type = self.state().conversation.conversation_type;
        match conversation_type {
            ConversationType::Group => {
                info!(conversation = %self.id, "leaving group conversation");
                self.client.remove_user(self.id.clone()).await
            }
            ConversationType::OneToOne => {
                info!(conversation = %self.id, "deleting one-to-one conversation");
                self.client.delete_conversation(self.id.clone()).await
            }
            ConversationType::Unknown => {
                warn!(conversation = %self.id, "cannot leave conversation of unknown type");
                Ok(())
            }
        }
    }

    /// Rename the conversation.
    ///
    /// # Errors
    /// Returns the client's error if the request fails.
    pub async fn rename(&self, name: impl Into<String>) -> ConversationResult<()> {
        let name = name.into();
        info!(conversation = %self.id, %name, "renaming conversation");
        self.client.rename_conversation(self.id.clone(), name).await
    }

    /// Change the notification level.
    ///
    /// # Errors
    /// Returns the client's error if the request fails.
    pub async fn set_notification_level(&self, level: NotificationLevel) -> ConversationResult<()> {
        info!(conversation = %self.id, ?level, "setting notification level");
        self.client
            .set_conversation_notification_level(self.id.clone(), level)
            .await
    }

    /// Report the local user's typing status.
    ///
    /// # Errors
    /// Returns the client's error if the request fails.
    pub async fn set_typing(&self, status: TypingStatus) -> ConversationResult<()> {
        self.client.set_typing(self.id.clone(), status).await
    }

    /// Report that the conversation has focus.
    ///
    /// # Errors
    /// Returns the client's error if the request fails.
    pub async fn set_focus(&self) -> ConversationResult<()> {
        self.client.set_focus(self.id.clone()).await
    }

    // ===== Derived properties ==============================================

    /// True if the conversation is archived.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.state()
            .conversation
            .self_state
            .views
            .contains(&ConversationView::Archived)
    }

    /// True if notifications are off.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.state().conversation.self_state.notification_level == NotificationLevel::Quiet
    }

    /// True if history is disabled.
    #[must_use]
    pub fn is_off_the_record(&self) -> bool {
        self.state().conversation.otr_status == OffTheRecordStatus::OffTheRecord
    }

    /// Participants, local user included.
    #[must_use]
    pub fn participants(&self) -> Vec<Participant> {
        self.state().conversation.participants.clone()
    }

    /// Timestamp used to order the conversation list.
    #[must_use]
    pub fn last_modified(&self) -> Timestamp {
        self.state().conversation.self_state.sort_timestamp
    }

    /// Explicit name, or the other participants' names joined by commas.
    #[must_use]
    pub fn display_name(&self) -> String {
        let state = self.state();
        if let Some(name) = &state.conversation.name {
            return name.clone();
        }
        state
            .conversation
            .participants
            .iter()
            .filter(|participant| participant.id != self.self_user)
            .map(Participant::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
