//! External chat client collaborator.
//!
//! The store never talks to the network itself. Every remote action goes
//! through a [`ChatClient`], which owns the wire protocol, transport, retries
//! and authentication.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::conversation::core::content::{ChatSegment, ImageUpload};
use crate::conversation::core::errors::ConversationResult;
use crate::conversation::core::ids::{ConversationId, ImageId, Timestamp};
use crate::conversation::core::record::{DeliveryMedium, NotificationLevel, OffTheRecordStatus};
use crate::conversation::events::event::WireEvent;
use crate::conversation::presence::typing::TypingStatus;

/// Boxed future type for client operations.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Status carried in a response header.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Request succeeded.
    #[default]
    Ok,
    /// Server considered the request invalid.
    InvalidRequest,
    /// Any other failure status.
    Unknown,
}

/// Fully built chat message request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SendMessageRequest {
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// Random id used by the server to deduplicate retries.
    pub client_generated_id: u64,
    /// Message body.
    pub segments: Vec<ChatSegment>,
    /// Attached image.
    pub image_id: Option<ImageId>,
    /// History setting the sender expects the conversation to have.
    pub expected_otr: OffTheRecordStatus,
    /// Transport to deliver over.
    pub delivery_medium: DeliveryMedium,
}

/// Page of older events returned by a history fetch.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Response status.
    #[serde(default)]
    pub status: ResponseStatus,
    /// Events, in any order.
    #[serde(default)]
    pub events: Vec<WireEvent>,
}

/// Chat client trait.
pub trait ChatClient: Send + Sync {
    /// Send a chat message.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn send_chat_message(&self, request: SendMessageRequest) -> ClientFuture<'_, ConversationResult<()>>;
    /// Upload an image and return its id.
    ///
    /// # Errors
    /// Returns an error if the upload fails.
    fn upload_image(&self, image: ImageUpload) -> ClientFuture<'_, ConversationResult<ImageId>>;
    /// Fetch up to `max_events` events older than `before`.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn get_conversation(
        &self,
        conversation_id: ConversationId,
        before: Timestamp,
        max_events: usize,
    ) -> ClientFuture<'_, ConversationResult<HistoryResponse>>;
    /// Report the local user's read watermark.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn update_watermark(
        &self,
        conversation_id: ConversationId,
        read_timestamp: Timestamp,
    ) -> ClientFuture<'_, ConversationResult<()>>;
    /// Report the local user's typing status.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn set_typing(
        &self,
        conversation_id: ConversationId,
        status: TypingStatus,
    ) -> ClientFuture<'_, ConversationResult<()>>;
    /// Report that the conversation has focus.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn set_focus(&self, conversation_id: ConversationId) -> ClientFuture<'_, ConversationResult<()>>;
    /// Rename a conversation.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn rename_conversation(
        &self,
        conversation_id: ConversationId,
        name: String,
    ) -> ClientFuture<'_, ConversationResult<()>>;
    /// Remove the local user from a group conversation.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn remove_user(&self, conversation_id: ConversationId) -> ClientFuture<'_, ConversationResult<()>>;
    /// Delete a one-to-one conversation.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn delete_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> ClientFuture<'_, ConversationResult<()>>;
    /// Change the notification level.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn set_conversation_notification_level(
        &self,
        conversation_id: ConversationId,
        level: NotificationLevel,
    ) -> ClientFuture<'_, ConversationResult<()>>;
}
