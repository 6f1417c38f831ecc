//! Conversation event model and wire ingestion.
//!
//! Incoming events arrive as [`WireEvent`]s: a header plus a set of optional
//! payloads. They are decoded exactly once, at ingestion, into a
//! [`ConversationEvent`] whose [`EventKind`] is a closed tagged union.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conversation::core::content::ChatSegment;
use crate::conversation::core::ids::{ConversationId, EventId, ImageId, Timestamp, UserId};

/// Explicit payload discriminant, when the protocol layer provides one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEventType {
    /// Chat message.
    ChatMessage,
    /// Conversation renamed.
    Rename,
    /// Participants joined or left.
    MembershipChange,
    /// Anything else (hangout start, OTR change, ...).
    Generic,
}

/// Chat message payload.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessagePayload {
    /// Message body.
    pub segments: Vec<ChatSegment>,
    /// Attached images.
    pub attachments: Vec<ImageId>,
}

impl ChatMessagePayload {
    /// Concatenated text of all segments.
    #[must_use]
    pub fn text(&self) -> String {
        self.segments.iter().map(|segment| segment.text.as_str()).collect()
    }
}

/// Rename payload.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenamePayload {
    /// Name before the rename.
    pub old_name: String,
    /// Name after the rename.
    pub new_name: String,
}

/// Direction of a membership change.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipChangeType {
    /// Users were added.
    #[default]
    Join,
    /// Users left or were removed.
    Leave,
}

/// Membership change payload.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembershipChangePayload {
    /// Join or leave.
    pub change_type: MembershipChangeType,
    /// Affected users.
    pub participant_ids: Vec<UserId>,
}

/// Event as delivered by the protocol layer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    /// Event id.
    pub event_id: EventId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Sender.
    pub sender_id: UserId,
    /// Server timestamp.
    pub timestamp: Timestamp,
    /// Explicit discriminant, if present.
    #[serde(default)]
    pub event_type: Option<WireEventType>,
    /// Chat message payload.
    #[serde(default)]
    pub chat_message: Option<ChatMessagePayload>,
    /// Rename payload.
    #[serde(default)]
    pub conversation_rename: Option<RenamePayload>,
    /// Membership change payload.
    #[serde(default)]
    pub membership_change: Option<MembershipChangePayload>,
}

/// Decoded event payload.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Event with no payload we model.
    Generic,
    /// Chat message.
    ChatMessage(ChatMessagePayload),
    /// Rename.
    Rename(RenamePayload),
    /// Membership change.
    MembershipChange(MembershipChangePayload),
}

impl EventKind {
    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::ChatMessage(_) => "chat_message",
            Self::Rename(_) => "rename",
            Self::MembershipChange(_) => "membership_change",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached conversation event.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConversationEvent {
    /// Event id.
    pub id: EventId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Sender.
    pub sender: UserId,
    /// Server timestamp.
    pub timestamp: Timestamp,
    /// Payload.
    pub kind: EventKind,
}

impl ConversationEvent {
    /// Decode a wire event.
    ///
    /// An explicit discriminant wins when its payload is present. Otherwise
    /// the first populated payload is used, in the order chat message,
    /// rename, membership change; with none the event is generic.
    #[must_use]
    pub fn from_wire(event: WireEvent) -> Self {
        let WireEvent {
            event_id,
            conversation_id,
            sender_id,
            timestamp,
            event_type,
            chat_message,
            conversation_rename,
            membership_change,
        } = event;

        let kind = match (event_type, chat_message, conversation_rename, membership_change) {
            (Some(WireEventType::Generic), ..) => EventKind::Generic,
            (Some(WireEventType::Rename), _, Some(rename), _) => EventKind::Rename(rename),
            (Some(WireEventType::MembershipChange), _, _, Some(change)) => {
                EventKind::MembershipChange(change)
            }
            (_, Some(message), ..) => EventKind::ChatMessage(message),
            (_, None, Some(rename), _) => EventKind::Rename(rename),
            (_, None, None, Some(change)) => EventKind::MembershipChange(change),
            (_, None, None, None) => EventKind::Generic,
        };

        Self {
            id: event_id,
            conversation_id,
            sender: sender_id,
            timestamp,
            kind,
        }
    }

    /// Chat payload, if this is a chat message.
    #[must_use]
    pub const fn chat_message(&self) -> Option<&ChatMessagePayload> {
        match &self.kind {
            EventKind::ChatMessage(message) => Some(message),
            _ => None,
        }
    }

    /// True if this is a chat message.
    #[must_use]
    pub const fn is_chat_message(&self) -> bool {
        matches!(self.kind, EventKind::ChatMessage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(id: &str) -> WireEvent {
        WireEvent {
            event_id: EventId::new(id),
            conversation_id: ConversationId::new("c1"),
            sender_id: UserId::new("u1"),
            timestamp: Timestamp::from_micros(1),
            event_type: None,
            chat_message: None,
            conversation_rename: None,
            membership_change: None,
        }
    }

    fn rename() -> RenamePayload {
        RenamePayload {
            old_name: "a".to_string(),
            new_name: "b".to_string(),
        }
    }

    #[test]
    fn test_probing_prefers_chat_message() {
        let mut event = wire("e1");
        event.chat_message = Some(ChatMessagePayload::default());
        event.conversation_rename = Some(rename());
        let decoded = ConversationEvent::from_wire(event);
        assert!(decoded.is_chat_message());
    }

    #[test]
    fn test_probing_falls_through_to_membership_then_generic() {
        let mut event = wire("e1");
        event.membership_change = Some(MembershipChangePayload::default());
        assert_eq!(ConversationEvent::from_wire(event).kind.as_str(), "membership_change");
        assert_eq!(ConversationEvent::from_wire(wire("e2")).kind, EventKind::Generic);
    }

    #[test]
    fn test_discriminant_wins_over_probing() {
        let mut event = wire("e1");
        event.event_type = Some(WireEventType::Rename);
        event.chat_message = Some(ChatMessagePayload::default());
        event.conversation_rename = Some(rename());
        assert_eq!(ConversationEvent::from_wire(event).kind, EventKind::Rename(rename()));
    }

    #[test]
    fn test_discriminant_without_payload_falls_back() {
        let mut event = wire("e1");
        event.event_type = Some(WireEventType::MembershipChange);
        event.conversation_rename = Some(rename());
        assert_eq!(ConversationEvent::from_wire(event).kind.as_str(), "rename");
    }

    #[test]
    fn test_wire_event_from_json() {
        let json = r#"{
            "event_id": "e9",
            "conversation_id": "c1",
            "sender_id": "u2",
            "timestamp": 99,
            "chat_message": {"segments": [{"text": "hi"}]}
        }"#;
        let event: Result<WireEvent, _> = serde_json::from_str(json);
        assert!(event.is_ok());
        if let Ok(event) = event {
            let decoded = ConversationEvent::from_wire(event);
            assert_eq!(decoded.chat_message().map(ChatMessagePayload::text).as_deref(), Some("hi"));
        }
    }
}
