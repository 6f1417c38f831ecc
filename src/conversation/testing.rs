//! Test doubles for the chat client and observers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::conversation::client::{
    ChatClient, ClientFuture, HistoryResponse, ResponseStatus, SendMessageRequest,
};
use crate::conversation::core::content::{ChatSegment, ImageUpload};
use crate::conversation::core::errors::{ConversationError, ConversationResult};
use crate::conversation::core::ids::{ConversationId, EventId, ImageId, Timestamp, UserId};
use crate::conversation::core::record::{
    Conversation, ConversationType, NotificationLevel, Participant,
};
use crate::conversation::engine::observer::ConversationObserver;
use crate::conversation::events::event::{ChatMessagePayload, ConversationEvent, WireEvent};
use crate::conversation::presence::typing::TypingStatus;
use crate::conversation::presence::watermark::WatermarkNotification;

pub const CONVERSATION: &str = "conv-1";
pub const SELF_USER: &str = "me";

/// One recorded client call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientCall {
    Send(SendMessageRequest),
    Upload(String),
    History { before: Timestamp, max_events: usize },
    Watermark(Timestamp),
    Typing(TypingStatus),
    Focus,
    Rename(String),
    RemoveUser,
    Delete,
    NotificationLevel(NotificationLevel),
}

/// Client that records calls and replays scripted history pages.
#[derive(Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<ClientCall>>,
    history: Mutex<VecDeque<ConversationResult<HistoryResponse>>>,
    send_delays: Mutex<VecDeque<Duration>>,
    fail_sends: Mutex<bool>,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sends(&self) -> Vec<SendMessageRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ClientCall::Send(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn push_history(&self, page: ConversationResult<HistoryResponse>) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(page);
    }

    /// Delay the next send by `delay`; later sends use later queued delays.
    pub fn push_send_delay(&self, delay: Duration) {
        self.send_delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(delay);
    }

    pub fn fail_sends(&self) {
        *self.fail_sends.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    fn record(&self, call: ClientCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn done(&self, call: ClientCall) -> ClientFuture<'_, ConversationResult<()>> {
        self.record(call);
        Box::pin(async { Ok(()) })
    }
}

impl ChatClient for RecordingClient {
    fn send_chat_message(&self, request: SendMessageRequest) -> ClientFuture<'_, ConversationResult<()>> {
        let delay = self
            .send_delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let fail = *self.fail_sends.lock().unwrap_or_else(PoisonError::into_inner);
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.record(ClientCall::Send(request));
            if fail {
                return Err(ConversationError::Client("send failed".to_string()));
            }
            Ok(())
        })
    }

    fn upload_image(&self, image: ImageUpload) -> ClientFuture<'_, ConversationResult<ImageId>> {
        let id = ImageId::new(format!("uploaded-{}", image.name));
        self.record(ClientCall::Upload(image.name));
        Box::pin(async move { Ok(id) })
    }

    fn get_conversation(
        &self,
        _conversation_id: ConversationId,
        before: Timestamp,
        max_events: usize,
    ) -> ClientFuture<'_, ConversationResult<HistoryResponse>> {
        self.record(ClientCall::History { before, max_events });
        let page = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Ok(HistoryResponse {
                    status: ResponseStatus::Ok,
                    events: Vec::new(),
                })
            });
        Box::pin(async move { page })
    }

    fn update_watermark(
        &self,
        _conversation_id: ConversationId,
        read_timestamp: Timestamp,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        self.done(ClientCall::Watermark(read_timestamp))
    }

    fn set_typing(
        &self,
        _conversation_id: ConversationId,
        status: TypingStatus,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        self.done(ClientCall::Typing(status))
    }

    fn set_focus(&self, _conversation_id: ConversationId) -> ClientFuture<'_, ConversationResult<()>> {
        self.done(ClientCall::Focus)
    }

    fn rename_conversation(
        &self,
        _conversation_id: ConversationId,
        name: String,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        self.done(ClientCall::Rename(name))
    }

    fn remove_user(&self, _conversation_id: ConversationId) -> ClientFuture<'_, ConversationResult<()>> {
        self.done(ClientCall::RemoveUser)
    }

    fn delete_conversation(
        &self,
        _conversation_id: ConversationId,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        self.done(ClientCall::Delete)
    }

    fn set_conversation_notification_level(
        &self,
        _conversation_id: ConversationId,
        level: NotificationLevel,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        self.done(ClientCall::NotificationLevel(level))
    }
}

/// One recorded observer notification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ObserverCall {
    Typing(UserId, TypingStatus),
    Event(EventId),
    Watermark(UserId, Timestamp),
    EventsLoaded(usize),
    Updated,
}

#[derive(Default)]
pub struct RecordingObserver {
    calls: Mutex<Vec<ObserverCall>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ObserverCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: ObserverCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl ConversationObserver for RecordingObserver {
    fn on_typing_changed(&self, _conversation: &ConversationId, user: &UserId, status: TypingStatus) {
        self.record(ObserverCall::Typing(user.clone(), status));
    }

    fn on_event(&self, _conversation: &ConversationId, event: &ConversationEvent) {
        self.record(ObserverCall::Event(event.id.clone()));
    }

    fn on_watermark_notification(
        &self,
        _conversation: &ConversationId,
        notification: &WatermarkNotification,
    ) {
        self.record(ObserverCall::Watermark(
            notification.user_id.clone(),
            notification.read_timestamp,
        ));
    }

    fn on_events_loaded(&self, _conversation: &ConversationId, events: &[ConversationEvent]) {
        self.record(ObserverCall::EventsLoaded(events.len()));
    }

    fn on_conversation_updated(&self, _conversation: &ConversationId) {
        self.record(ObserverCall::Updated);
    }
}

/// Chat message wire event in the test conversation.
pub fn chat_event(id: &str, timestamp: u64, sender: &str, text: &str) -> WireEvent {
    WireEvent {
        event_id: EventId::new(id),
        conversation_id: ConversationId::new(CONVERSATION),
        sender_id: UserId::new(sender),
        timestamp: Timestamp::from_micros(timestamp),
        event_type: None,
        chat_message: Some(ChatMessagePayload {
            segments: vec![ChatSegment::text(text)],
            attachments: Vec::new(),
        }),
        conversation_rename: None,
        membership_change: None,
    }
}

/// Group conversation with the local user and two others.
pub fn group_record() -> Conversation {
    let mut record = Conversation::new(ConversationId::new(CONVERSATION), ConversationType::Group);
    record.participants = vec![
        Participant {
            id: UserId::new(SELF_USER),
            display_name: Some("Me".to_string()),
        },
        Participant {
            id: UserId::new("alice"),
            display_name: Some("Alice".to_string()),
        },
        Participant {
            id: UserId::new("bob"),
            display_name: None,
        },
    ];
    record
}
