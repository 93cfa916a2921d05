use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::{NotificationId, NotificationKind, Notifier};

const DEFAULT_TTL: Duration = Duration::from_millis(3000);

/// One message in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
    pub ttl: Duration,
    pub created_at: Instant,
}

struct Slot {
    notification: Notification,
    timer: Option<AbortHandle>,
}

#[derive(Debug, Clone, Copy)]
enum Removal {
    Expired,
    Dismissed,
}

/// Ordered notifications, each evicted by its own timer unless dismissed first.
///
/// No deduplication and no depth limit. Clones share the same queue.
#[derive(Clone)]
pub struct NotificationQueue {
    slots: Arc<Mutex<Vec<Slot>>>,
    default_ttl: Duration,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl NotificationQueue {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(Vec::new())),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock()
    }

    pub fn push(&self, message: impl Into<String>, kind: NotificationKind) -> NotificationId {
        self.push_with_ttl(message, kind, self.default_ttl)
    }

    /// Push a notification that expires after `ttl`.
    ///
    /// Outside a tokio runtime no timer can be armed and the notification
    /// stays until dismissed.
    pub fn push_with_ttl(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        ttl: Duration,
    ) -> NotificationId {
        let id = NotificationId::new();
        let notification = Notification {
            id,
            message: message.into(),
            kind,
            ttl,
            created_at: Instant::now(),
        };
        tracing::debug!(%id, ?kind, message = %notification.message, "notification pushed");

        self.lock().push(Slot {
            notification,
            timer: None,
        });

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let queue = self.clone();
                let timer = runtime.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    queue.remove(id, Removal::Expired);
                });
                if let Some(slot) = self.lock().iter_mut().find(|s| s.notification.id == id) {
                    slot.timer = Some(timer.abort_handle());
                }
            }
            Err(_) => {
                tracing::warn!(%id, "no async runtime; notification will not expire on its own");
            }
        }

        id
    }

    /// Remove a notification before it expires. Returns whether it was still queued.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.remove(id, Removal::Dismissed)
    }

    // Both expiry and dismissal land here; the second caller finds nothing.
    fn remove(&self, id: NotificationId, removal: Removal) -> bool {
        let slot = {
            let mut slots = self.lock();
            let Some(index) = slots.iter().position(|s| s.notification.id == id) else {
                return false;
            };
            slots.remove(index)
        };

        if let (Removal::Dismissed, Some(timer)) = (removal, slot.timer) {
            timer.abort();
        }
        tracing::debug!(%id, ?removal, "notification removed");
        true
    }

    /// Current notifications, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().iter().map(|s| s.notification.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Dismiss everything.
    pub fn clear(&self) {
        let ids: Vec<_> = self.lock().iter().map(|s| s.notification.id).collect();
        for id in ids {
            self.dismiss(id);
        }
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, message: &str, kind: NotificationKind) -> NotificationId {
        self.push(message, kind)
    }
}
