//! Client that performs no network I/O.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::conversation::client::chat_client::{
    ChatClient, ClientFuture, HistoryResponse, SendMessageRequest,
};
use crate::conversation::core::content::ImageUpload;
use crate::conversation::core::errors::ConversationResult;
use crate::conversation::core::ids::{ConversationId, ImageId, Timestamp};
use crate::conversation::core::record::NotificationLevel;
use crate::conversation::presence::typing::TypingStatus;

/// Logs every call and reports success.
///
/// History fetches return an empty page, uploads return sequential ids.
#[derive(Debug, Default)]
pub struct OfflineClient {
    uploads: AtomicU64,
}

impl OfflineClient {
    /// Create an offline client.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            uploads: AtomicU64::new(0),
        }
    }

    fn ok<T: Send + 'static>(value: T) -> ClientFuture<'static, ConversationResult<T>> {
        Box::pin(async move { Ok(value) })
    }
}

impl ChatClient for OfflineClient {
    fn send_chat_message(&self, request: SendMessageRequest) -> ClientFuture<'_, ConversationResult<()>> {
        info!(
            conversation = %request.conversation_id,
            segments = request.segments.len(),
            image = ?request.image_id,
            "offline send"
        );
        Self::ok(())
    }

    fn upload_image(&self, image: ImageUpload) -> ClientFuture<'_, ConversationResult<ImageId>> {
        let n = self.uploads.fetch_add(1, Ordering::Relaxed) + 1;
        info!(name = %image.name, bytes = image.data.len(), "offline upload");
        Self::ok(ImageId::new(format!("offline-image-{n}")))
    }

    fn get_conversation(
        &self,
        conversation_id: ConversationId,
        before: Timestamp,
        max_events: usize,
    ) -> ClientFuture<'_, ConversationResult<HistoryResponse>> {
        info!(conversation = %conversation_id, %before, max_events, "offline history fetch");
        Self::ok(HistoryResponse::default())
    }

    fn update_watermark(
        &self,
        conversation_id: ConversationId,
        read_timestamp: Timestamp,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        info!(conversation = %conversation_id, %read_timestamp, "offline watermark");
        Self::ok(())
    }

    fn set_typing(
        &self,
        conversation_id: ConversationId,
        status: TypingStatus,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        info!(conversation = %conversation_id, ?status, "offline typing");
        Self::ok(())
    }

    fn set_focus(&self, conversation_id: ConversationId) -> ClientFuture<'_, ConversationResult<()>> {
        info!(conversation = %conversation_id, "offline focus");
        Self::ok(())
    }

    fn rename_conversation(
        &self,
        conversation_id: ConversationId,
        name: String,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        info!(conversation = %conversation_id, %name, "offline rename");
        Self::ok(())
    }

    fn remove_user(&self, conversation_id: ConversationId) -> ClientFuture<'_, ConversationResult<()>> {
        info!(conversation = %conversation_id, "offline leave");
        Self::ok(())
    }

    fn delete_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        info!(conversation = %conversation_id, "offline delete");
        Self::ok(())
    }

    fn set_conversation_notification_level(
        &self,
        conversation_id: ConversationId,
        level: NotificationLevel,
    ) -> ClientFuture<'_, ConversationResult<()>> {
        info!(conversation = %conversation_id, ?level, "offline notification level");
        Self::ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_upload_ids_are_sequential() {
        let client = OfflineClient::new();
        let image = ImageUpload {
            name: "a.png".to_string(),
            data: vec![1, 2, 3],
        };
        let first = client.upload_image(image.clone()).await.ok();
        let second = client.upload_image(image).await.ok();
        assert_eq!(first, Some(ImageId::new("offline-image-1")));
        assert_eq!(second, Some(ImageId::new("offline-image-2")));
    }

    #[tokio::test]
    async fn test_offline_history_is_empty() {
        let client = OfflineClient::new();
        let page = client
            .get_conversation(ConversationId::new("c"), Timestamp::ZERO, 10)
            .await
            .ok();
        assert_eq!(page, Some(HistoryResponse::default()));
    }
}
