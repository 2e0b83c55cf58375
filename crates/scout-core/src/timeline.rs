//! Ordered conversation log.
//!
//! The timeline is append-only; the only bulk mutation is [`Timeline::clear`].
//! It also tracks whether a user query is still waiting for its reply.

use crate::classifier::classify;
use scout_types::{Content, Entry, EntryId, Role};
use serde_json::Value;
use tracing::debug;

/// Text used when the backend reports an error without a message.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug)]
pub struct Timeline {
    entries: Vec<Entry>,
    /// Next identity to hand out. Never reset, not even by `clear`.
    next_id: u64,
    awaiting: bool,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            awaiting: false,
        }
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user query and start waiting for the reply.
    ///
    /// Sending again while already waiting is allowed; the flag simply stays
    /// set until the next reply or error.
    pub fn append_user(&mut self, text: impl Into<String>) -> EntryId {
        self.awaiting = true;
        self.push(Role::User, Content::Text(text.into())).id
    }

    /// Classify and record an assistant reply.
    pub fn append_assistant(&mut self, raw: Value) -> &Entry {
        self.awaiting = false;
        self.push(Role::Assistant, classify(raw))
    }

    /// Record an error reply.
    pub fn append_error(&mut self, message: impl Into<String>) -> &Entry {
        self.awaiting = false;
        self.push(Role::Error, Content::Text(message.into()))
    }

    /// Drop every entry and stop waiting.
    pub fn clear(&mut self) {
        debug!(target: "scout::timeline", "Clearing {} entries", self.entries.len());
        self.entries.clear();
        self.awaiting = false;
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Owned copy of the current entries, in order.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.entries.clone()
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        // Ids are strictly increasing, so the log is sorted by id.
        self.entries
            .binary_search_by_key(&id, |entry| entry.id)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    /// True between a user query and the next reply or error.
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, role: Role, content: Content) -> &Entry {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry::new(id, role, content));
        debug!(target: "scout::timeline", "Appended {:?} entry {}", role, id);
        &self.entries[self.entries.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use scout_types::ResultItem;
    use serde_json::json;

    #[test]
    fn test_append_user_sets_awaiting() {
        let mut timeline = Timeline::new();
        assert!(!timeline.is_awaiting());

        let id = timeline.append_user("Find AI jobs in SF");
        assert!(timeline.is_awaiting());
        assert_eq!(timeline.len(), 1);

        let entry = timeline.get(id).unwrap();
        assert_eq!(entry.role, Role::User);
        assert_eq!(entry.content, Content::text("Find AI jobs in SF"));
    }

    #[test]
    fn test_assistant_reply_clears_awaiting_and_classifies() {
        let mut timeline = Timeline::new();
        timeline.append_user("jobs please");

        let entry = timeline.append_assistant(json!(r#"[{"title":"SWE","company":"Acme"}]"#));
        assert_eq!(entry.role, Role::Assistant);
        match entry.content.items() {
            Some([ResultItem::Job(job)]) => {
                assert_eq!(job.title.as_deref(), Some("SWE"));
                assert_eq!(job.company.as_deref(), Some("Acme"));
            }
            other => panic!("Expected one job, got {:?}", other),
        }
        assert!(!timeline.is_awaiting());
    }

    #[test]
    fn test_error_clears_awaiting() {
        let mut timeline = Timeline::new();
        timeline.append_user("hello");

        let entry = timeline.append_error("backend unavailable");
        assert_eq!(entry.role, Role::Error);
        assert_eq!(entry.content, Content::text("backend unavailable"));
        assert!(!timeline.is_awaiting());
    }

    #[test]
    fn test_second_send_keeps_waiting_until_reply() {
        let mut timeline = Timeline::new();
        timeline.append_user("first");
        timeline.append_user("second");
        assert!(timeline.is_awaiting());

        timeline.append_assistant(json!("answer"));
        assert!(!timeline.is_awaiting());
    }

    #[test]
    fn test_ids_are_unique_within_one_tick() {
        let mut timeline = Timeline::new();
        let a = timeline.append_user("a");
        let b = timeline.append_user("b");
        let c = timeline.append_assistant(json!("c")).id;
        assert!(a < b && b < c);
    }

    #[test]
    fn test_clear_empties_and_keeps_counter() {
        let mut timeline = Timeline::new();
        let before = timeline.append_user("hello");
        timeline.clear();
        assert!(timeline.is_empty());
        assert!(!timeline.is_awaiting());

        let after = timeline.append_assistant(json!("late reply")).id;
        assert!(after > before);
        assert!(timeline.get(before).is_none());
    }

    #[test]
    fn test_clear_then_appends_keep_only_new_entries_in_order() {
        let mut timeline = Timeline::new();
        timeline.append_user("old");
        timeline.append_assistant(json!("old reply"));
        timeline.clear();

        timeline.append_assistant(json!("one"));
        timeline.append_error("two");
        timeline.append_assistant(json!("three"));

        let texts: Vec<&str> = timeline
            .entries()
            .iter()
            .filter_map(|e| e.content.as_text())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut timeline = Timeline::new();
        timeline.append_user("hello");
        let snapshot = timeline.snapshot();
        timeline.clear();
        assert_eq!(snapshot.len(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        User,
        Assistant,
        Error,
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::User),
            Just(Op::Assistant),
            Just(Op::Error),
            Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_ids_strictly_increase(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let mut timeline = Timeline::new();
            for op in &ops {
                match op {
                    Op::User => { timeline.append_user("q"); }
                    Op::Assistant => { timeline.append_assistant(json!("a")); }
                    Op::Error => { timeline.append_error("e"); }
                    Op::Clear => timeline.clear(),
                }
            }
            let ids: Vec<EntryId> = timeline.entries().iter().map(|e| e.id).collect();
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn prop_awaiting_tracks_last_event(ops in proptest::collection::vec(op_strategy(), 1..64)) {
            let mut timeline = Timeline::new();
            let mut expected = false;
            for op in &ops {
                match op {
                    Op::User => { timeline.append_user("q"); expected = true; }
                    Op::Assistant => { timeline.append_assistant(json!("a")); expected = false; }
                    Op::Error => { timeline.append_error("e"); expected = false; }
                    Op::Clear => { timeline.clear(); expected = false; }
                }
                prop_assert_eq!(timeline.is_awaiting(), expected);
            }
        }
    }
}
