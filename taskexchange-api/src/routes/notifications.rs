/// Notification endpoints
///
/// - `GET /v1/notifications` - List the caller's notifications
/// - `POST /v1/notifications/:id/read` - Mark one as read
/// - `GET /v1/notifications/stream` - SSE live tail
///
/// The stream delivers notifications committed after the connection opened;
/// the list endpoint is the source of truth for history. A subscriber that
/// falls behind the broadcast channel capacity misses messages rather than
/// blocking settlement.
///
/// # SSE Event Format
///
/// ```text
/// event: notification
/// id: 550e8400-e29b-41d4-a716-446655440000
/// data: {"id":"...","user_id":"...","title":"Submission approved","message":"...","read":false,"created_at":"..."}
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use taskexchange_shared::{auth::middleware::AuthContext, models::notification::Notification};
use serde::Serialize;
use tokio_stream::{wrappers::BroadcastStream, StreamExt as _};
use uuid::Uuid;

/// Notification list response
#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    /// The caller's notifications, newest first
    pub notifications: Vec<Notification>,

    /// How many of them are unread
    pub unread: i64,
}

/// Mark-read response
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    /// Whether a notification was updated
    pub updated: bool,
}

/// Lists the caller's notifications, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<NotificationsResponse>> {
    let (notifications, unread) = tokio::try_join!(
        Notification::list_by_user(&state.db, auth.user_id),
        Notification::count_unread(&state.db, auth.user_id),
    )?;

    Ok(Json(NotificationsResponse {
        notifications,
        unread,
    }))
}

/// Marks a notification as read
///
/// Scoped to the caller; flipping another user's notification returns 404.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = Notification::mark_read(&state.db, notification_id, auth.user_id).await?;

    if !updated {
        return Err(crate::error::ApiError::NotFound(
            "Notification not found".to_string(),
        ));
    }

    Ok(Json(MarkReadResponse { updated }))
}

/// SSE live tail of the caller's notifications
///
/// Each subscriber receives the shared broadcast stream filtered to its own
/// user. Keep-alive comments flow every 25 seconds so proxies don't drop
/// idle connections.
pub async fn stream(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = auth.user_id;
    let receiver = state.notifications.subscribe();

    let stream = BroadcastStream::new(receiver).filter_map(move |result| {
        match result {
            Ok(notification) if notification.user_id == user_id => {
                let data = serde_json::to_string(&notification).ok()?;
                Some(Ok(Event::default()
                    .event("notification")
                    .id(notification.id.to_string())
                    .data(data)))
            }
            // Other recipients' notifications, and lag errors from a slow
            // consumer, are silently skipped
            _ => None,
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(25))
            .text("keep-alive"),
    )
}
