//! Repository for the durable notification queue.
//!
//! Transitions enqueue; the delivery job drains. Undelivered rows survive a
//! crash and are retried on later passes up to a bounded attempt count.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::QueuedNotificationEntity;
use crate::metrics::QueryTimer;

/// Rows that failed this many times are left for manual inspection.
pub const MAX_DELIVERY_ATTEMPTS: i32 = 10;

const QUEUE_COLUMNS: &str =
    "id, recipient_id, kind, payload, attempts, last_error, created_at, delivered_at";

/// Repository for queued notification operations.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueues one notification row for one recipient.
    pub async fn enqueue(
        &self,
        recipient_id: Uuid,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("enqueue_notification");
        let result = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO notification_queue (recipient_id, kind, payload)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(recipient_id)
        .bind(kind)
        .bind(payload)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(|(id,)| id)
    }

    /// Fetches one batch of undelivered rows, oldest first.
    pub async fn fetch_undelivered(
        &self,
        batch_size: i64,
    ) -> Result<Vec<QueuedNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("fetch_undelivered_notifications");
        let result = sqlx::query_as::<_, QueuedNotificationEntity>(&format!(
            r#"
            SELECT {QUEUE_COLUMNS}
            FROM notification_queue
            WHERE delivered_at IS NULL AND attempts < $1
            ORDER BY id
            LIMIT $2
            "#,
        ))
        .bind(MAX_DELIVERY_ATTEMPTS)
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Marks a row delivered.
    pub async fn mark_delivered(&self, id: i64) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("mark_notification_delivered");
        let result = sqlx::query(
            r#"
            UPDATE notification_queue
            SET delivered_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Records a failed delivery attempt.
    pub async fn record_failure(&self, id: i64, error: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("record_notification_failure");
        let result = sqlx::query(
            r#"
            UPDATE notification_queue
            SET attempts = attempts + 1, last_error = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }
}
