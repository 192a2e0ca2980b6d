//! Bounded log of recent messages that mentioned the bot.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// How many mentions are kept before the oldest is evicted.
pub const MENTION_LOG_CAPACITY: usize = 100;

/// One recorded mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionEntry {
    /// Channel the message was sent in
    pub channel_id: u64,
    /// The message id
    pub message_id: u64,
    /// Message content at the time it was received
    pub content: String,
    /// Author of the message
    pub user_id: u64,
}

/// FIFO ring of mentions. Written from the event loop, read from the console thread.
#[derive(Debug)]
pub struct MentionLog {
    capacity: usize,
    entries: Mutex<VecDeque<MentionEntry>>,
}

impl Default for MentionLog {
    fn default() -> Self {
        Self::with_capacity(MENTION_LOG_CAPACITY)
    }
}

impl MentionLog {
    /// Creates a log holding at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn push(&self, entry: MentionEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if self.capacity == 0 {
            return;
        }
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Copies the entries out, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<MentionEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
