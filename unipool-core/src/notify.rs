use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Request,
    Booking,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub ride_id: Uuid,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: Uuid, kind: NotificationKind, message: String, ride_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            message,
            ride_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Delivery target for lifecycle notifications. Callers treat delivery as
/// fire-and-forget: a sink failure must never fail the ride operation that
/// produced the notification.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(
        &self,
        notification: Notification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
