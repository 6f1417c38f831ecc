//! Conversation record as delivered by the protocol layer.
//!
//! The service pushes conversation state as deltas: a field that is missing
//! from an update means "unchanged", not "reset". [`Conversation`] is the full
//! record the store keeps; [`ConversationPatch`] is the explicit delta form.

use serde::{Deserialize, Deserializer, Serialize};

use crate::conversation::core::ids::{ConversationId, Timestamp, UserId};

/// Kind of conversation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    /// Two participants.
    OneToOne,
    /// Any number of participants.
    Group,
    /// Not reported by the server.
    #[default]
    Unknown,
}

/// History setting of a conversation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffTheRecordStatus {
    /// History is kept.
    #[default]
    OnTheRecord,
    /// History is disabled.
    OffTheRecord,
}

/// Notification level of a conversation for the local user.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Notifications disabled.
    Quiet,
    /// Notifications enabled.
    #[default]
    Ring,
}

/// Folder the conversation is shown in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationView {
    /// Regular inbox.
    Inbox,
    /// Archived.
    Archived,
}

/// Transport a message is delivered over.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMedium {
    /// The service's native transport.
    #[default]
    Babel,
    /// Google Voice SMS.
    GoogleVoice,
    /// Carrier SMS.
    LocalSms,
}

/// One delivery medium choice advertised for the conversation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeliveryMediumOption {
    /// Medium.
    pub medium: DeliveryMedium,
    /// Whether the user picked this medium as the default.
    #[serde(default)]
    pub current_default: bool,
}

/// Read state of the local user.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SelfReadState {
    /// Newest event the local user has read; zero when unset.
    #[serde(default)]
    pub latest_read_timestamp: Timestamp,
}

/// Per-user state of the local user in this conversation.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfConversationState {
    /// Read state.
    pub read_state: SelfReadState,
    /// Timestamp used to order the conversation list.
    pub sort_timestamp: Timestamp,
    /// Notification level.
    pub notification_level: NotificationLevel,
    /// Folders this conversation appears in.
    pub views: Vec<ConversationView>,
    /// Available delivery media.
    pub delivery_medium_options: Vec<DeliveryMediumOption>,
}

/// A conversation participant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Chat id of the participant.
    pub id: UserId,
    /// Name to show, if the service provided one.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Participant {
    /// Name to show, falling back to the user id.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

/// Full conversation record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation id.
    pub id: ConversationId,
    /// Conversation kind.
    #[serde(default, rename = "type")]
    pub conversation_type: ConversationType,
    /// Explicit name, if the conversation was renamed.
    #[serde(default)]
    pub name: Option<String>,
    /// Participants, local user included.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// History setting.
    #[serde(default)]
    pub otr_status: OffTheRecordStatus,
    /// Local user's state.
    #[serde(default)]
    pub self_state: SelfConversationState,
}

impl Conversation {
    /// Create an empty record for the given id.
    #[must_use]
    pub fn new(id: ConversationId, conversation_type: ConversationType) -> Self {
        Self {
            id,
            conversation_type,
            name: None,
            participants: Vec::new(),
            otr_status: OffTheRecordStatus::OnTheRecord,
            self_state: SelfConversationState::default(),
        }
    }

    /// Newest read event timestamp of the local user.
    #[must_use]
    pub const fn latest_read_timestamp(&self) -> Timestamp {
        self.self_state.read_state.latest_read_timestamp
    }

    /// Set the local read timestamp.
    pub const fn set_latest_read_timestamp(&mut self, timestamp: Timestamp) {
        self.self_state.read_state.latest_read_timestamp = timestamp;
    }

    /// Medium to send over: the user's default, else the first advertised one,
    /// else the native transport.
    #[must_use]
    pub fn default_delivery_medium(&self) -> DeliveryMedium {
        let options = &self.self_state.delivery_medium_options;
        options
            .iter()
            .rev()
            .find(|option| option.current_default)
            .or_else(|| options.first())
            .map_or(DeliveryMedium::Babel, |option| option.medium)
    }
}

/// Explicit delta for a conversation record; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationPatch {
    /// New conversation kind.
    pub conversation_type: Option<ConversationType>,
    /// New name; `Some(None)` clears it. In JSON, `null` clears and a
    /// missing key leaves the name alone.
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    /// New participant list.
    pub participants: Option<Vec<Participant>>,
    /// New history setting.
    pub otr_status: Option<OffTheRecordStatus>,
    /// New read timestamp.
    pub latest_read_timestamp: Option<Timestamp>,
    /// New sort timestamp.
    pub sort_timestamp: Option<Timestamp>,
    /// New notification level.
    pub notification_level: Option<NotificationLevel>,
    /// New folder list.
    pub views: Option<Vec<ConversationView>>,
    /// New delivery media.
    pub delivery_medium_options: Option<Vec<DeliveryMediumOption>>,
}

/// Wrap a present field, even `null`, in `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ConversationPatch {
    /// Apply set fields to `record`.
    pub fn apply_to(self, record: &mut Conversation) {
        if let Some(value) = self.conversation_type {
            record.conversation_type = value;
        }
        if let Some(value) = self.name {
            record.name = value;
        }
        if let Some(value) = self.participants {
            record.participants = value;
        }
        if let Some(value) = self.otr_status {
            record.otr_status = value;
        }
        if let Some(value) = self.latest_read_timestamp {
            record.set_latest_read_timestamp(value);
        }
        if let Some(value) = self.sort_timestamp {
            record.self_state.sort_timestamp = value;
        }
        if let Some(value) = self.notification_level {
            record.self_state.notification_level = value;
        }
        if let Some(value) = self.views {
            record.self_state.views = value;
        }
        if let Some(value) = self.delivery_medium_options {
            record.self_state.delivery_medium_options = value;
        }
    }

    /// True if the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
