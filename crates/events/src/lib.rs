//! Transient user-facing notifications.
//!
//! A [`NotificationQueue`] is an ordered list of messages that expire on their
//! own. Producers talk to it through the [`Notifier`] trait so they can be handed
//! any sink, including a recording one in tests.

mod queue;

use std::fmt;

use uuid::{NoContext, Timestamp, Uuid};

pub use queue::{Notification, NotificationQueue};

/// Identifier of one pushed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v7(Timestamp::now(NoContext)))
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Sink for operation outcomes.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind) -> NotificationId;

    fn notify_success(&self, message: &str) -> NotificationId {
        self.notify(message, NotificationKind::Success)
    }

    fn notify_error(&self, message: &str) -> NotificationId {
        self.notify(message, NotificationKind::Error)
    }
}
