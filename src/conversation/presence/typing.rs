//! Per-user typing status.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::conversation::core::ids::UserId;

/// Typing state of one user.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingStatus {
    /// Not typing.
    #[default]
    Stopped,
    /// Actively typing.
    Started,
    /// Typed something and paused.
    Paused,
}

/// Last reported typing status per user.
#[derive(Clone, Debug, Default)]
pub struct TypingTracker {
    statuses: HashMap<UserId, TypingStatus>,
}

impl TypingTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a status; returns true if it differs from the previous one.
    ///
    /// A user with no recorded status always counts as changed.
    pub fn update(&mut self, user: &UserId, status: TypingStatus) -> bool {
        if self.statuses.get(user) == Some(&status) {
            return false;
        }
        self.statuses.insert(user.clone(), status);
        true
    }

    /// Last status of a user.
    #[must_use]
    pub fn status(&self, user: &UserId) -> Option<TypingStatus> {
        self.statuses.get(user).copied()
    }

    /// True if anyone other than `self_user` is actively typing.
    #[must_use]
    pub fn anyone_typing_except(&self, self_user: &UserId) -> bool {
        self.statuses
            .iter()
            .any(|(user, status)| user != self_user && *status == TypingStatus::Started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_reports_changes_only() {
        let mut tracker = TypingTracker::new();
        let user = UserId::new("u2");
        assert!(tracker.update(&user, TypingStatus::Started));
        assert!(!tracker.update(&user, TypingStatus::Started));
        assert!(tracker.update(&user, TypingStatus::Paused));
        assert_eq!(tracker.status(&user), Some(TypingStatus::Paused));
    }

    #[test]
    fn test_first_report_counts_even_when_stopped() {
        let mut tracker = TypingTracker::new();
        assert!(tracker.update(&UserId::new("u2"), TypingStatus::Stopped));
    }

    #[test]
    fn test_anyone_typing_ignores_self() {
        let mut tracker = TypingTracker::new();
        let me = UserId::new("me");
        tracker.update(&me, TypingStatus::Started);
        assert!(!tracker.anyone_typing_except(&me));
        tracker.update(&UserId::new("u2"), TypingStatus::Paused);
        assert!(!tracker.anyone_typing_except(&me));
        tracker.update(&UserId::new("u3"), TypingStatus::Started);
        assert!(tracker.anyone_typing_except(&me));
    }
}
