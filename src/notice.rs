use std::time::{Duration, Instant};

pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    raised_at: Instant,
}

impl Notice {
    pub fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < NOTICE_TTL
    }
}

/// Transient messages shown after user actions. Newest first.
#[derive(Debug, Default)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    pub fn push_at(&mut self, level: NoticeLevel, message: impl Into<String>, now: Instant) {
        self.items.retain(|n| n.is_live(now));
        self.items.insert(
            0,
            Notice {
                level,
                message: message.into(),
                raised_at: now,
            },
        );
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push_at(NoticeLevel::Success, message, Instant::now());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push_at(NoticeLevel::Info, message, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push_at(NoticeLevel::Error, message, Instant::now());
    }

    pub fn current_at(&self, now: Instant) -> Option<&Notice> {
        self.items.first().filter(|n| n.is_live(now))
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current_at(Instant::now())
    }
}
