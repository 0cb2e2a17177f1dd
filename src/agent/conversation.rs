//! Conversation state management
//!
//! Maintains the ordered message log plus an incrementally-maintained index
//! of which user messages hold artifacts, so the window policy never rescans
//! the whole log. The log is append-only except for whole-message eviction.

use crate::core::Message;

/// The ordered message log of one conversation.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    /// Message log, oldest first.
    messages: Vec<Message>,
    /// (position, artifact count) for attachment-bearing user messages,
    /// in append order. Positions are adjusted on eviction.
    attachment_index: Vec<(usize, usize)>,
    /// Running total of resident artifacts; always equals the sum of the
    /// index counts.
    resident: usize,
}

impl ConversationState {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation seeded with existing messages.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        let mut state = Self::new();
        for message in messages {
            state.push(message);
        }
        state
    }

    /// Append a message to the log.
    pub fn push(&mut self, message: Message) {
        let count = message.artifact_count();
        let is_user = message.role == crate::core::Role::User;
        self.messages.push(message);

        if is_user && count > 0 {
            self.attachment_index.push((self.messages.len() - 1, count));
            self.resident += count;
        }

        self.assert_invariant();
    }

    /// Total artifacts currently resident in the conversation.
    pub fn resident_artifacts(&self) -> usize {
        self.resident
    }

    /// Evict the oldest attachment-bearing message in full.
    ///
    /// Returns the number of artifacts removed, or `None` when no eligible
    /// message remains. Never partially trims a message's attachment list.
    pub fn evict_oldest_attachments(&mut self) -> Option<usize> {
        if self.attachment_index.is_empty() {
            return None;
        }

        let (position, count) = self.attachment_index.remove(0);
        self.messages.remove(position);
        self.resident -= count;

        // Everything after the removed message shifts down by one.
        for entry in &mut self.attachment_index {
            entry.0 -= 1;
        }

        self.assert_invariant();
        Some(count)
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get message count.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn assert_invariant(&self) {
        debug_assert_eq!(
            self.resident,
            self.attachment_index.iter().map(|(_, n)| n).sum::<usize>(),
        );
        debug_assert_eq!(
            self.resident,
            self.messages.iter().map(Message::artifact_count).sum::<usize>(),
        );
    }
}
