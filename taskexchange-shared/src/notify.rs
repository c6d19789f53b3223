/// In-process notification fan-out
///
/// The SSE endpoint tails live notifications through this hub. Settlement
/// writes the notification row inside its transaction, then publishes here
/// after the commit, so subscribers never see a notification that was
/// rolled back.
///
/// The hub is a single broadcast channel shared by all connections; each
/// subscriber filters for its own user. A slow subscriber that lags past
/// the channel capacity misses messages rather than blocking publishers;
/// the list endpoint remains the source of truth.
///
/// # Example
///
/// ```
/// use taskexchange_shared::notify::NotificationHub;
///
/// let hub = NotificationHub::new(256);
/// let mut rx = hub.subscribe();
/// // settlement publishes after commit:
/// // hub.publish(notification);
/// ```

use tokio::sync::broadcast;
use tracing::debug;

use crate::models::notification::Notification;

/// Broadcast hub for live notification delivery
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    /// Creates a hub with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes a committed notification to all live subscribers
    ///
    /// Having no subscribers is not an error; the notification is already
    /// persisted and will be seen via the list endpoint.
    pub fn publish(&self, notification: Notification) {
        let recipient = notification.user_id;
        match self.sender.send(notification) {
            Ok(receivers) => {
                debug!(user_id = %recipient, receivers, "Notification broadcast");
            }
            Err(_) => {
                debug!(user_id = %recipient, "No live notification subscribers");
            }
        }
    }

    /// Subscribes to the live notification stream
    ///
    /// The receiver sees every notification published after this call;
    /// callers filter by recipient.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(256)
    }
}
