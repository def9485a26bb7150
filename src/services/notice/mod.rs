//! User-visible notices.
//!
//! Notices are brief messages raised by the scheduler: confirmations such as
//! "Task created" and the human-readable side of remote failures. The
//! presentation layer drains them and decides how to show them.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Oldest notices are dropped beyond this many.
pub const MAX_NOTICES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    /// Get the icon for this notice level
    pub fn icon(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "✓",
            NoticeLevel::Info => "ℹ",
            NoticeLevel::Warning => "⚠",
            NoticeLevel::Error => "✗",
        }
    }
}

/// A single notice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: DateTime<Local>,
}

impl Notice {
    pub fn new(message: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Local::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Success)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Error)
    }
}

/// Bounded queue of notices waiting to be shown
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notice, dropping the oldest once the log is full
    pub fn add(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => log::error!("{}", notice.message),
            NoticeLevel::Warning => log::warn!("{}", notice.message),
            _ => log::info!("{}", notice.message),
        }

        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            let overflow = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..overflow);
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.add(Notice::success(message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.add(Notice::info(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.add(Notice::warning(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.add(Notice::error(message));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.notices
            .iter()
            .any(|notice| notice.level == NoticeLevel::Error)
    }

    /// Take every pending notice, oldest first
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded() {
        let mut log = NoticeLog::new();
        for n in 0..(MAX_NOTICES + 5) {
            log.info(format!("notice {}", n));
        }

        assert_eq!(log.len(), MAX_NOTICES);
        assert_eq!(log.iter().next().unwrap().message, "notice 5");
        assert_eq!(log.latest().unwrap().message, "notice 104");
    }

    #[test]
    fn test_drain_empties_log() {
        let mut log = NoticeLog::new();
        log.success("Task created");
        log.error("Failed to schedule task");
        assert!(log.has_errors());

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Success);
        assert_eq!(drained[1].level, NoticeLevel::Error);
        assert!(log.is_empty());
        assert!(!log.has_errors());
    }
}
