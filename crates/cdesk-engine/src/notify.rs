//! User-facing notifications
//!
//! Exactly one notice is raised per remote write outcome. Listing failures
//! are logged only.

use serde::{Deserialize, Serialize};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Remote write confirmed
    Success,
    /// Remote write failed
    Error,
}

/// Short message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Message text
    pub message: String,
}

impl Notice {
    /// Success notice
    #[inline]
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Error notice
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Check if this reports a success
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

/// Sink for user notices
pub trait Notifier: Send + Sync {
    /// Deliver a notice
    fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Notifier that emits notices as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => {
                tracing::info!(target: "cdesk::notice", "{}", notice.message);
            }
            NoticeLevel::Error => {
                tracing::warn!(target: "cdesk::notice", "{}", notice.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_level() {
        assert!(Notice::success("Comment posted!").is_success());
        let notice = Notice::error("Failed to reply");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Failed to reply");
    }

    #[test]
    fn serializes_level_in_snake_case() {
        let json = serde_json::to_value(Notice::error("x")).unwrap();
        assert_eq!(json["level"], "error");
    }
}
