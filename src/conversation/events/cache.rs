//! Event cache keyed by event id with a lazily sorted view.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::conversation::core::config::DuplicatePolicy;
use crate::conversation::core::ids::{EventId, Timestamp};
use crate::conversation::events::event::ConversationEvent;

/// Result of inserting an event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertOutcome {
    /// New id.
    Inserted,
    /// Existing id, cached event replaced.
    Replaced,
    /// Existing id, incoming event dropped.
    Ignored,
}

/// Append/replace-only event cache.
///
/// The sorted view is ordered by `(timestamp, id)`, built on first read and
/// discarded on every write.
#[derive(Debug, Default)]
pub struct EventCache {
    policy: DuplicatePolicy,
    by_id: HashMap<EventId, ConversationEvent>,
    sorted: OnceLock<Arc<[ConversationEvent]>>,
}

impl EventCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            by_id: HashMap::new(),
            sorted: OnceLock::new(),
        }
    }

    /// Insert an event according to the duplicate policy.
    pub fn insert(&mut self, event: ConversationEvent) -> InsertOutcome {
        let outcome = match (self.by_id.contains_key(&event.id), self.policy) {
            (false, _) => InsertOutcome::Inserted,
            (true, DuplicatePolicy::Overwrite) => InsertOutcome::Replaced,
            (true, DuplicatePolicy::KeepFirst) => return InsertOutcome::Ignored,
        };
        self.by_id.insert(event.id.clone(), event);
        self.sorted = OnceLock::new();
        outcome
    }

    /// Insert a batch of events.
    pub fn extend(&mut self, events: impl IntoIterator<Item = ConversationEvent>) {
        for event in events {
            self.insert(event);
        }
    }

    /// Look up an event by id.
    #[must_use]
    pub fn get(&self, id: &EventId) -> Option<&ConversationEvent> {
        self.by_id.get(id)
    }

    /// Number of cached events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All events, oldest first.
    #[must_use]
    pub fn sorted(&self) -> Arc<[ConversationEvent]> {
        Arc::clone(self.sorted.get_or_init(|| {
            let mut events: Vec<ConversationEvent> = self.by_id.values().cloned().collect();
            events.sort_by(|a, b| (a.timestamp, &a.id).cmp(&(b.timestamp, &b.id)));
            events.into()
        }))
    }

    /// Oldest cached event.
    #[must_use]
    pub fn oldest(&self) -> Option<ConversationEvent> {
        self.sorted().first().cloned()
    }

    /// Newest cached event.
    #[must_use]
    pub fn newest(&self) -> Option<ConversationEvent> {
        self.sorted().last().cloned()
    }

    /// Index of an event in the sorted view.
    #[must_use]
    pub fn position(&self, id: &EventId) -> Option<usize> {
        self.sorted().iter().position(|event| &event.id == id)
    }

    /// Events at or after `id` in sorted order.
    #[must_use]
    pub fn from_event(&self, id: &EventId) -> Option<Vec<ConversationEvent>> {
        let sorted = self.sorted();
        let index = sorted.iter().position(|event| &event.id == id)?;
        Some(sorted[index..].to_vec())
    }

    /// Events strictly newer than `timestamp`.
    #[must_use]
    pub fn newer_than(&self, timestamp: Timestamp) -> Vec<ConversationEvent> {
        self.sorted()
            .iter()
            .filter(|event| event.timestamp > timestamp)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::core::ids::{ConversationId, UserId};
    use crate::conversation::events::event::EventKind;

    fn event(id: &str, ts: u64) -> ConversationEvent {
        ConversationEvent {
            id: EventId::new(id),
            conversation_id: ConversationId::new("c1"),
            sender: UserId::new("u1"),
            timestamp: Timestamp::from_micros(ts),
            kind: EventKind::Generic,
        }
    }

    fn timestamps(cache: &EventCache) -> Vec<u64> {
        cache.sorted().iter().map(|e| e.timestamp.as_micros()).collect()
    }

    #[test]
    fn test_sorted_by_timestamp() {
        let mut cache = EventCache::default();
        cache.insert(event("a", 5));
        cache.insert(event("b", 2));
        cache.insert(event("c", 8));
        assert_eq!(timestamps(&cache), vec![2, 5, 8]);
    }

    #[test]
    fn test_view_invalidated_on_write() {
        let mut cache = EventCache::default();
        cache.insert(event("a", 5));
        assert_eq!(timestamps(&cache), vec![5]);
        cache.insert(event("b", 1));
        assert_eq!(timestamps(&cache), vec![1, 5]);
    }

    #[test]
    fn test_equal_timestamps_ordered_by_id() {
        let mut cache = EventCache::default();
        cache.insert(event("z", 3));
        cache.insert(event("m", 3));
        cache.insert(event("a", 3));
        let ids: Vec<String> = cache.sorted().iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_overwrite_keeps_latest_per_id() {
        let mut cache = EventCache::new(DuplicatePolicy::Overwrite);
        assert_eq!(cache.insert(event("a", 5)), InsertOutcome::Inserted);
        assert_eq!(cache.insert(event("a", 9)), InsertOutcome::Replaced);
        assert_eq!(cache.len(), 1);
        assert_eq!(timestamps(&cache), vec![9]);
    }

    #[test]
    fn test_keep_first_ignores_duplicates() {
        let mut cache = EventCache::new(DuplicatePolicy::KeepFirst);
        cache.insert(event("a", 5));
        assert_eq!(cache.insert(event("a", 9)), InsertOutcome::Ignored);
        assert_eq!(timestamps(&cache), vec![5]);
    }

    #[test]
    fn test_sorted_view_invariant_over_random_sequence() {
        let mut cache = EventCache::default();
        let ids = ["a", "b", "c", "d"];
        let mut latest = HashMap::new();
        for step in 0_u64..40 {
            let id = ids[usize::try_from(step * 7 % 4).unwrap_or(0)];
            let ts = (step * 31) % 17;
            cache.insert(event(id, ts));
            latest.insert(id, ts);
        }
        let sorted = cache.sorted();
        assert!(sorted.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
        assert_eq!(sorted.len(), latest.len());
        for e in sorted.iter() {
            assert_eq!(Some(&e.timestamp.as_micros()), latest.get(e.id.as_str()));
        }
    }

    #[test]
    fn test_slices() {
        let mut cache = EventCache::default();
        cache.extend([event("a", 1), event("b", 2), event("c", 3)]);
        assert_eq!(cache.oldest().map(|e| e.id), Some(EventId::new("a")));
        assert_eq!(cache.newest().map(|e| e.id), Some(EventId::new("c")));
        assert_eq!(cache.position(&EventId::new("b")), Some(1));
        assert_eq!(cache.from_event(&EventId::new("b")).map(|v| v.len()), Some(2));
        assert!(cache.from_event(&EventId::new("x")).is_none());
        assert_eq!(cache.newer_than(Timestamp::from_micros(1)).len(), 2);
    }
}
