//! Read watermarks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::conversation::core::ids::{ConversationId, Timestamp, UserId};

/// Newest event a user has read; only moves forward.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadWatermark(Timestamp);

impl ReadWatermark {
    /// Start at the given timestamp.
    #[must_use]
    pub const fn new(timestamp: Timestamp) -> Self {
        Self(timestamp)
    }

    /// Current value.
    #[must_use]
    pub const fn get(self) -> Timestamp {
        self.0
    }

    /// Move to `timestamp` if it is strictly newer; returns whether it moved.
    pub fn advance(&mut self, timestamp: Timestamp) -> bool {
        if timestamp > self.0 {
            self.0 = timestamp;
            true
        } else {
            false
        }
    }
}

/// Server notification that a participant read up to a timestamp.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WatermarkNotification {
    /// Conversation the notification is about.
    pub conversation_id: ConversationId,
    /// Reader.
    pub user_id: UserId,
    /// Newest event the reader has seen.
    pub read_timestamp: Timestamp,
}

/// Watermarks of the other participants.
#[derive(Clone, Debug, Default)]
pub struct ParticipantWatermarks {
    by_user: HashMap<UserId, ReadWatermark>,
}

impl ParticipantWatermarks {
    /// Advance a participant's watermark; returns whether it moved.
    pub fn advance(&mut self, user: &UserId, timestamp: Timestamp) -> bool {
        self.by_user
            .entry(user.clone())
            .or_default()
            .advance(timestamp)
    }

    /// Watermark of a participant, if one was reported.
    #[must_use]
    pub fn get(&self, user: &UserId) -> Option<Timestamp> {
        self.by_user.get(user).map(|mark| mark.get())
    }
}
