use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// What a notice is about. UI layers use this to pick an icon or to
/// collapse repeats; the text is in `title`/`body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeTopic {
    Transport,
    Negotiation { peer: String },
    Media,
    Permission,
    Moderation,
    Document,
}

/// A user-facing notice with a display TTL.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub topic: NoticeTopic,
    pub title: String,
    pub body: String,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl Notice {
    /// Info notice, 5-second TTL.
    pub fn info(topic: NoticeTopic, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Info, topic, title, body, Duration::from_secs(5))
    }

    /// Warning notice, 8-second TTL.
    pub fn warning(topic: NoticeTopic, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Warning, topic, title, body, Duration::from_secs(8))
    }

    /// Error notice, 10-second TTL.
    pub fn error(topic: NoticeTopic, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Error, topic, title, body, Duration::from_secs(10))
    }

    fn with_level(
        level: NoticeLevel,
        topic: NoticeTopic,
        title: impl Into<String>,
        body: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            level,
            topic,
            title: title.into(),
            body: body.into(),
            created_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// Bounded queue of notices that drops expired entries on access.
#[derive(Debug)]
pub struct NoticeQueue {
    items: VecDeque<Notice>,
    capacity: usize,
}

impl NoticeQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a notice. When still full after evicting expired entries, the
    /// oldest one goes.
    pub fn push(&mut self, notice: Notice) {
        self.evict_expired();
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(notice);
    }

    pub fn visible(&mut self) -> Vec<&Notice> {
        self.evict_expired();
        self.items.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn evict_expired(&mut self) {
        self.items.retain(|n| !n.is_expired());
    }
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new(16)
    }
}
