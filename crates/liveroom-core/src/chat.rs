//! Room chat history and typing indicators.
//!
//! Messages live in a bounded ring buffer so memory stays predictable over a
//! long session. Nothing is persisted.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use liveroom_config::ChatConfig;

use crate::identity::Role;

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_role: Role,
    pub content: String,
    /// Sender timestamp, unix ms.
    pub timestamp: u64,
}

/// In-memory history of one room.
#[derive(Debug)]
pub struct ChatHistory {
    limit: usize,
    messages: VecDeque<ChatMessage>,
}

impl ChatHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            messages: VecDeque::new(),
        }
    }

    /// Push a message. The oldest goes when the buffer is full; a repeated
    /// id is ignored.
    pub fn push(&mut self, msg: ChatMessage) -> bool {
        if self.messages.iter().any(|m| m.id == msg.id) {
            return false;
        }
        if self.messages.len() >= self.limit {
            self.messages.pop_front();
        }
        self.messages.push_back(msg);
        true
    }

    /// The most recent `limit` messages, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<&ChatMessage> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new(ChatConfig::default().history_limit)
    }
}

// ---------------------------------------------------------------------------
// Typing
// ---------------------------------------------------------------------------

/// Who is typing right now. Indicators that are not refreshed within the
/// timeout expire on their own.
#[derive(Debug)]
pub struct TypingTracker {
    timeout: Duration,
    /// participant id -> (display name, last refresh)
    active: HashMap<String, (String, Instant)>,
}

impl TypingTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            active: HashMap::new(),
        }
    }

    /// Record an indicator. Returns `true` if the visible set changed.
    pub fn update(&mut self, id: &str, name: &str, is_typing: bool, now: Instant) -> bool {
        if is_typing {
            self.active
                .insert(id.to_string(), (name.to_string(), now))
                .is_none()
        } else {
            self.active.remove(id).is_some()
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.active.remove(id).is_some()
    }

    /// Drop stale indicators and return the ids that expired.
    pub fn expire(&mut self, now: Instant) -> Vec<String> {
        let timeout = self.timeout;
        let expired: Vec<String> = self
            .active
            .iter()
            .filter(|(_, (_, at))| now.saturating_duration_since(*at) >= timeout)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            self.active.remove(id);
        }
        expired
    }

    /// Display names of everyone typing, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.active.values().map(|(n, _)| n.clone()).collect();
        names.sort();
        names
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
