//! Queued notification entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the notification_queue table.
///
/// Rows are append-only until delivery; `delivered_at` marks completion and
/// `attempts`/`last_error` track retry history.
#[derive(Debug, Clone, FromRow)]
pub struct QueuedNotificationEntity {
    pub id: i64,
    pub recipient_id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}
