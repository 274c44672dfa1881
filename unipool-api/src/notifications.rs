use crate::auth::CurrentUser;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use unipool_core::notify::Notification;

/// GET /v1/notifications
/// Latest notifications for the acting user, newest first. This is the only
/// channel that carries a rider's own pickup OTP.
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Json<Vec<Notification>> {
    let limit = state.business_rules.notification_page_size;
    Json(state.notifications.list_for_user(user_id, limit).await)
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// POST /v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Json<MarkAllReadResponse> {
    let updated = state.notifications.mark_all_read(user_id).await;
    Json(MarkAllReadResponse { updated })
}
