use async_trait::async_trait;
use tokio::sync::Mutex;
use unipool_core::notify::{Notification, NotificationSink};
use uuid::Uuid;

/// Stores lifecycle notifications in process memory and serves the read
/// endpoints. Durable delivery (push, email) belongs to the external
/// fan-out service; the ride engine only records what it emitted.
pub struct InMemoryNotificationStore {
    notifications: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
        }
    }

    /// Latest notifications for one user, newest first.
    pub async fn list_for_user(&self, user_id: Uuid, limit: usize) -> Vec<Notification> {
        let notifications = self.notifications.lock().await;
        let mut mine: Vec<Notification> = notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit);
        mine
    }

    /// Marks every unread notification of the user as read; returns how
    /// many were flipped.
    pub async fn mark_all_read(&self, user_id: Uuid) -> usize {
        let mut notifications = self.notifications.lock().await;
        let mut updated = 0;
        for n in notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            updated += 1;
        }
        updated
    }
}

impl Default for InMemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationStore {
    async fn deliver(
        &self,
        notification: Notification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut notifications = self.notifications.lock().await;
        notifications.push(notification);
        Ok(())
    }
}
