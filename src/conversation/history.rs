//! Local history view, read cursor and pending sends

use super::ConversationError;
use crate::llm::ChatMessage;
use crate::room::{Identity, RoomMessage};
use std::collections::HashSet;

/// Authorship tag of a history entry relative to the participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorship {
    Own,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub author: String,
    pub content: String,
    pub authorship: Authorship,
}

impl HistoryEntry {
    /// Content with the attribution label the completion provider sees
    pub fn attributed(&self) -> String {
        format!("Message from {}: {}", self.author, self.content)
    }

    pub fn to_chat_message(&self) -> ChatMessage {
        let content = self.attributed();
        match self.authorship {
            Authorship::Own => ChatMessage::assistant(content),
            Authorship::Other => ChatMessage::user(content),
        }
        .with_name(self.author.clone())
    }
}

/// This participant's room, re-derived wholesale from every snapshot
#[derive(Debug, Clone, Default)]
pub struct LocalHistory {
    entries: Vec<HistoryEntry>,
}

impl LocalHistory {
    pub fn from_snapshot(identity: &Identity, snapshot: &[RoomMessage]) -> Self {
        let entries = snapshot
            .iter()
            .filter(|m| identity.is_in_room(m))
            .map(|m| HistoryEntry {
                author: m.name.clone(),
                content: m.content.clone(),
                authorship: if identity.is_author_of(m) {
                    Authorship::Own
                } else {
                    Authorship::Other
                },
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Characters written by everyone except this participant
    pub fn others_char_total(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.authorship == Authorship::Other)
            .map(|e| e.content.chars().count())
            .sum()
    }
}

/// How much of the history has been "read"
///
/// `total_chars` never decreases and `last_read_index` never moves back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCursor {
    pub total_chars: usize,
    pub last_read_index: usize,
}

impl ReadCursor {
    /// Characters from others not yet read
    pub fn unread(&self, history: &LocalHistory) -> Result<usize, ConversationError> {
        let current = history.others_char_total();
        current
            .checked_sub(self.total_chars)
            .ok_or(ConversationError::HistoryShrank {
                previous: self.total_chars,
                current,
            })
    }

    /// Mark everything currently in `history` as read and return how many
    /// characters that covered. Leaves the cursor untouched on error.
    pub fn advance(&mut self, history: &LocalHistory) -> Result<usize, ConversationError> {
        let delta = self.unread(history)?;
        if delta > 0 {
            self.total_chars += delta;
            self.last_read_index = self.last_read_index.max(history.len());
        }
        Ok(delta)
    }
}

/// Texts written locally but not yet seen echoed in a snapshot
#[derive(Debug, Clone, Default)]
pub struct PendingSends {
    texts: HashSet<String>,
}

impl PendingSends {
    pub fn insert(&mut self, text: String) {
        self.texts.insert(text);
    }

    /// Drop every pending text that shows up as one of our own messages in
    /// our room. Returns how many were confirmed.
    pub fn remove_echoed(&mut self, identity: &Identity, snapshot: &[RoomMessage]) -> usize {
        let before = self.texts.len();
        if before == 0 {
            return 0;
        }
        for message in snapshot
            .iter()
            .filter(|m| identity.is_in_room(m) && identity.is_author_of(m))
        {
            self.texts.remove(&message.content);
        }
        before - self.texts.len()
    }

    pub fn remove(&mut self, text: &str) -> bool {
        self.texts.remove(text)
    }

    pub fn clear(&mut self) {
        self.texts.clear();
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.texts.contains(text)
    }

    /// Sorted copy, for inspection
    pub fn to_vec(&self) -> Vec<String> {
        let mut texts: Vec<_> = self.texts.iter().cloned().collect();
        texts.sort();
        texts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use proptest::prelude::*;

    fn alice() -> Identity {
        Identity::new("Alice", "r1")
    }

    #[test]
    fn test_history_filters_room_and_tags_authorship() {
        let snapshot = vec![
            RoomMessage::new("r1", "Bob", "hi"),
            RoomMessage::new("r2", "Bob", "elsewhere"),
            RoomMessage::new("r1", "Alice", "hello"),
        ];
        let history = LocalHistory::from_snapshot(&alice(), &snapshot);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].authorship, Authorship::Other);
        assert_eq!(history.entries()[1].authorship, Authorship::Own);
        assert_eq!(history.others_char_total(), 2);
    }

    #[test]
    fn test_entry_renders_attribution_and_role() {
        let entry = HistoryEntry {
            author: "Bob".to_string(),
            content: "hi".to_string(),
            authorship: Authorship::Other,
        };
        let msg = entry.to_chat_message();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Message from Bob: hi");
        assert_eq!(msg.name.as_deref(), Some("Bob"));

        let own = HistoryEntry {
            authorship: Authorship::Own,
            ..entry
        };
        assert_eq!(own.to_chat_message().role, Role::Assistant);
    }

    #[test]
    fn test_cursor_advances_and_reports_delta() {
        let mut cursor = ReadCursor::default();
        let history = LocalHistory::from_snapshot(
            &alice(),
            &[RoomMessage::new("r1", "Bob", "hi"), RoomMessage::new("r1", "Alice", "yo")],
        );
        assert_eq!(cursor.advance(&history).unwrap(), 2);
        assert_eq!(cursor.total_chars, 2);
        assert_eq!(cursor.last_read_index, 2);
        // Nothing new the second time
        assert_eq!(cursor.advance(&history).unwrap(), 0);
        assert_eq!(cursor.last_read_index, 2);
    }

    #[test]
    fn test_cursor_rejects_shrinking_history() {
        let mut cursor = ReadCursor {
            total_chars: 10,
            last_read_index: 3,
        };
        let history = LocalHistory::from_snapshot(&alice(), &[RoomMessage::new("r1", "Bob", "hi")]);
        let err = cursor.advance(&history).unwrap_err();
        assert!(matches!(
            err,
            ConversationError::HistoryShrank {
                previous: 10,
                current: 2
            }
        ));
        assert_eq!(cursor.total_chars, 10);
        assert_eq!(cursor.last_read_index, 3);
    }

    #[test]
    fn test_pending_removed_only_by_own_echo_in_room() {
        let mut pending = PendingSends::default();
        pending.insert("hello".to_string());

        // Someone else saying the same thing does not count
        let removed = pending.remove_echoed(&alice(), &[RoomMessage::new("r1", "Bob", "hello")]);
        assert_eq!(removed, 0);
        // Nor does our own message in another room
        let removed = pending.remove_echoed(&alice(), &[RoomMessage::new("r2", "Alice", "hello")]);
        assert_eq!(removed, 0);

        let removed = pending.remove_echoed(&alice(), &[RoomMessage::new("r1", "Alice", "hello")]);
        assert_eq!(removed, 1);
        assert!(pending.is_empty());
    }

    fn arb_snapshots() -> impl Strategy<Value = Vec<Vec<RoomMessage>>> {
        // Growing room: each snapshot extends the previous one
        proptest::collection::vec(
            ("(Alice|Bob|Carol)", "[a-z ]{0,20}"),
            0..30,
        )
        .prop_flat_map(|messages| {
            let len = messages.len();
            (Just(messages), proptest::collection::vec(0..=len, 1..10))
        })
        .prop_map(|(messages, mut cuts)| {
            cuts.sort_unstable();
            cuts.into_iter()
                .map(|cut| {
                    messages[..cut]
                        .iter()
                        .map(|(name, content)| RoomMessage::new("r1", name.clone(), content.clone()))
                        .collect()
                })
                .collect()
        })
    }

    proptest! {
        /// For growing rooms the cursor never moves backwards and always
        /// converges in one extra step
        #[test]
        fn cursor_is_monotonic_for_growing_rooms(snapshots in arb_snapshots()) {
            let identity = alice();
            let mut cursor = ReadCursor::default();
            for snapshot in snapshots {
                let history = LocalHistory::from_snapshot(&identity, &snapshot);
                let before = cursor;
                let delta = cursor.advance(&history).unwrap();
                prop_assert!(cursor.total_chars >= before.total_chars);
                prop_assert!(cursor.last_read_index >= before.last_read_index);
                prop_assert_eq!(cursor.total_chars, before.total_chars + delta);
                prop_assert_eq!(cursor.advance(&history).unwrap(), 0);
            }
        }
    }
}
